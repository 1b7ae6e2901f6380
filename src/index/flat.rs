//! Linear-scan spatial index.

use super::{Handle, IndexError, SpatialIndex, SpatialObject};
use crate::geometry::Vec2;
use std::collections::HashMap;

/// Unordered list of `(handle, position)` pairs.
///
/// Queries scan every entry. A slot map keeps insert, update and remove
/// constant time. Positions are never rejected.
#[derive(Debug, Clone)]
pub struct FlatIndex<H: Handle> {
    objects: Vec<SpatialObject<H>>,
    slots: HashMap<H, usize>,
}

impl<H: Handle> FlatIndex<H> {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            slots: HashMap::new(),
        }
    }
}

impl<H: Handle> Default for FlatIndex<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Handle> SpatialIndex<H> for FlatIndex<H> {
    fn insert(&mut self, handle: H, x: f32, y: f32) -> Result<(), IndexError> {
        if self.slots.contains_key(&handle) {
            return Err(IndexError::AlreadyPresent);
        }
        self.slots.insert(handle, self.objects.len());
        self.objects.push(SpatialObject::new(handle, Vec2::new(x, y)));
        Ok(())
    }

    fn query(&self, x: f32, y: f32, range: f32) -> Vec<H> {
        let center = Vec2::new(x, y);
        self.objects
            .iter()
            .filter(|obj| center.within(obj.position, range))
            .map(|obj| obj.handle)
            .collect()
    }

    fn update(&mut self, handle: H, x: f32, y: f32) -> Result<(), IndexError> {
        let slot = *self.slots.get(&handle).ok_or(IndexError::NotFound)?;
        self.objects[slot].position = Vec2::new(x, y);
        Ok(())
    }

    fn remove(&mut self, handle: &H) -> bool {
        let Some(slot) = self.slots.remove(handle) else {
            return false;
        };
        self.objects.swap_remove(slot);
        if let Some(moved) = self.objects.get(slot) {
            self.slots.insert(moved.handle, slot);
        }
        true
    }

    fn clear(&mut self) {
        self.objects.clear();
        self.slots.clear();
    }

    fn position(&self, handle: &H) -> Option<Vec2> {
        self.slots.get(handle).map(|&slot| self.objects[slot].position)
    }

    fn len(&self) -> usize {
        self.objects.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_query() {
        let mut index = FlatIndex::new();
        index.insert("a", 10.0, 10.0).unwrap();
        index.insert("b", 20.0, 10.0).unwrap();
        index.insert("c", 500.0, 500.0).unwrap();

        let mut found = index.query(12.0, 10.0, 10.0);
        found.sort_unstable();
        assert_eq!(found, vec!["a", "b"]);
        assert_eq!(index.query(10.0, 10.0, 0.0), vec!["a"]);
    }

    #[test]
    fn test_never_rejects_positions() {
        let mut index = FlatIndex::new();
        assert!(index.insert(1u32, -50.0, 1e9).is_ok());
        assert!(index.update(1, -1e9, 3.0).is_ok());
        assert_eq!(index.position(&1), Some(Vec2::new(-1e9, 3.0)));
    }

    #[test]
    fn test_update_missing_handle() {
        let mut index: FlatIndex<u32> = FlatIndex::new();
        assert_eq!(index.update(7, 1.0, 1.0), Err(IndexError::NotFound));
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut index = FlatIndex::new();
        index.insert(1u32, 0.0, 0.0).unwrap();
        assert_eq!(index.insert(1, 5.0, 5.0), Err(IndexError::AlreadyPresent));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_remove_keeps_slots_consistent() {
        let mut index = FlatIndex::new();
        for i in 0..5u32 {
            index.insert(i, i as f32, 0.0).unwrap();
        }

        assert!(index.remove(&1));
        assert!(!index.remove(&1));
        assert_eq!(index.len(), 4);

        // The last entry was swapped into slot 1
        index.update(4, 40.0, 0.0).unwrap();
        assert_eq!(index.position(&4), Some(Vec2::new(40.0, 0.0)));
        assert_eq!(index.query(40.0, 0.0, 0.5), vec![4]);
    }

    #[test]
    fn test_clear() {
        let mut index = FlatIndex::new();
        index.insert(1u32, 1.0, 1.0).unwrap();
        index.clear();
        assert!(index.is_empty());
        assert!(index.query(1.0, 1.0, 100.0).is_empty());
    }
}
