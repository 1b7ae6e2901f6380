//! Four-byte DNA with a pluggable mutation function.

use crate::error::SimError;
use rand::{Rng, RngCore};
use std::fmt;
use std::sync::Arc;

/// Number of DNA bytes: speed, size, awareness, reserved
pub const DNA_LEN: usize = 4;

pub type Dna = [u8; DNA_LEN];

/// Mutation hook applied to a copy of the parent's DNA on reproduction
pub type MutationFunction = Arc<dyn Fn(&mut Dna, &mut dyn RngCore) + Send + Sync>;

/// Largest shift the default mutation applies to a single byte
pub const DEFAULT_MUTATION_SPAN: i16 = 3;

/// Shift every byte by an independent uniform offset in `[-3, 3]`,
/// saturating at 0 and 255.
pub fn default_mutation(dna: &mut Dna, rng: &mut dyn RngCore) {
    for byte in dna.iter_mut() {
        let delta = rng.gen_range(-DEFAULT_MUTATION_SPAN..=DEFAULT_MUTATION_SPAN);
        *byte = (*byte as i16 + delta).clamp(0, u8::MAX as i16) as u8;
    }
}

#[derive(Clone)]
pub struct Genes {
    dna: Dna,
    mutation: MutationFunction,
}

impl Genes {
    pub fn new(dna: Dna) -> Self {
        Self {
            dna,
            mutation: Arc::new(default_mutation),
        }
    }

    pub fn with_mutation<F>(dna: Dna, mutation: F) -> Self
    where
        F: Fn(&mut Dna, &mut dyn RngCore) + Send + Sync + 'static,
    {
        Self {
            dna,
            mutation: Arc::new(mutation),
        }
    }

    /// Build from a byte slice, which must hold exactly four bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SimError> {
        let dna: Dna = bytes.try_into().map_err(|_| {
            SimError::InvalidArgument(format!(
                "DNA must be {} bytes, got {}",
                DNA_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self::new(dna))
    }

    pub fn dna(&self) -> &Dna {
        &self.dna
    }

    pub fn get(&self, i: usize) -> Option<u8> {
        self.dna.get(i).copied()
    }

    /// Mutate in place with this genome's mutation function
    pub fn mutate(&mut self, rng: &mut dyn RngCore) {
        (self.mutation)(&mut self.dna, rng);
    }

    /// Mutated copy sharing the same mutation function
    pub fn mutated(&self, rng: &mut dyn RngCore) -> Self {
        let mut child = self.clone();
        child.mutate(rng);
        child
    }
}

impl PartialEq for Genes {
    fn eq(&self, other: &Self) -> bool {
        self.dna == other.dna
    }
}

impl fmt::Debug for Genes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Genes").field("dna", &self.dna).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_default_mutation_stays_in_span() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let parent = Genes::new([40, 40, 40, 40]);
        for _ in 0..200 {
            let child = parent.mutated(&mut rng);
            for (a, b) in parent.dna().iter().zip(child.dna()) {
                assert!((*a as i16 - *b as i16).abs() <= DEFAULT_MUTATION_SPAN);
            }
        }
    }

    #[test]
    fn test_default_mutation_saturates() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..200 {
            let mut dna = [0, 255, 1, 254];
            default_mutation(&mut dna, &mut rng);
            assert!(dna[0] <= 3);
            assert!(dna[1] >= 252);
        }
    }

    #[test]
    fn test_custom_mutation_is_kept_by_children() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let genes = Genes::with_mutation([10, 10, 10, 10], |dna, _rng| {
            dna[0] = dna[0].saturating_add(1);
        });
        let child = genes.mutated(&mut rng);
        let grandchild = child.mutated(&mut rng);
        assert_eq!(grandchild.dna(), &[12, 10, 10, 10]);
    }

    #[test]
    fn test_from_slice_length_checked() {
        assert!(Genes::from_slice(&[1, 2, 3, 4]).is_ok());
        assert!(matches!(
            Genes::from_slice(&[1, 2, 3]),
            Err(SimError::InvalidArgument(_))
        ));
    }
}
