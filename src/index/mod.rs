//! Spatial indexes for proximity queries.
//!
//! Two implementations share the [`SpatialIndex`] contract:
//!
//! - [`FlatIndex`]: unordered list scan. O(n) queries, O(1) inserts. Used as
//!   the correctness oracle and for small populations.
//! - [`AdaptiveQuadtree`]: region quadtree that subdivides crowded leaves and
//!   merges sparse subtrees back. O(log n + k) queries.

pub mod flat;
pub mod quadtree;

pub use flat::FlatIndex;
pub use quadtree::{AdaptiveQuadtree, QuadtreeStats};

use crate::config::QuadtreeConfig;
use crate::error::SimError;
use crate::geometry::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use thiserror::Error;

/// Keys stored in an index. Anything small, copyable and hashable works;
/// the environment uses [`EntityId`](crate::EntityId).
pub trait Handle: Copy + Eq + Hash + fmt::Debug + Send + Sync {}

impl<T> Handle for T where T: Copy + Eq + Hash + fmt::Debug + Send + Sync {}

/// Index-level failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndexError {
    #[error("position ({x}, {y}) is outside the index universe")]
    OutOfBounds { x: f32, y: f32 },

    #[error("handle is not present in the index")]
    NotFound,

    #[error("handle is already present in the index")]
    AlreadyPresent,
}

/// A handle paired with the position it was indexed at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialObject<H> {
    pub handle: H,
    pub position: Vec2,
}

impl<H> SpatialObject<H> {
    pub fn new(handle: H, position: Vec2) -> Self {
        Self { handle, position }
    }
}

/// Proximity index over opaque handles.
///
/// Queries take `&self` and may run concurrently; every mutation takes
/// `&mut self`, so readers and writers can never overlap.
pub trait SpatialIndex<H: Handle>: Send + Sync {
    /// Index `handle` at `(x, y)`.
    fn insert(&mut self, handle: H, x: f32, y: f32) -> Result<(), IndexError>;

    /// All handles within Euclidean distance `range` of `(x, y)`, including
    /// those at distance 0. Order is unspecified.
    fn query(&self, x: f32, y: f32, range: f32) -> Vec<H>;

    /// Move `handle` to `(x, y)`. On error the index is left unchanged.
    fn update(&mut self, handle: H, x: f32, y: f32) -> Result<(), IndexError>;

    /// Drop `handle`. Returns whether it was present; removing an absent
    /// handle is not an error.
    fn remove(&mut self, handle: &H) -> bool;

    /// Remove every handle.
    fn clear(&mut self);

    /// Position `handle` is currently indexed at
    fn position(&self, handle: &H) -> Option<Vec2>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Index implementation selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Linear scan
    #[serde(alias = "default")]
    Flat,
    /// Adaptive quadtree
    #[default]
    #[serde(alias = "optimized")]
    Quadtree,
}

impl IndexKind {
    pub const ALL: [IndexKind; 2] = [IndexKind::Flat, IndexKind::Quadtree];

    /// Build an empty index covering `[0, width] x [0, height]`.
    pub fn build<H: Handle + 'static>(
        self,
        width: f32,
        height: f32,
        params: &QuadtreeConfig,
    ) -> Box<dyn SpatialIndex<H>> {
        match self {
            IndexKind::Flat => Box::new(FlatIndex::new()),
            IndexKind::Quadtree => Box::new(AdaptiveQuadtree::with_params(
                Vec2::ZERO,
                width.max(height),
                params.max_objects,
                params.min_size,
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Flat => "flat",
            IndexKind::Quadtree => "quadtree",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" | "default" => Ok(IndexKind::Flat),
            "quadtree" | "optimized" => Ok(IndexKind::Quadtree),
            other => Err(SimError::InvalidArgument(format!(
                "unknown index kind '{}', expected 'flat' or 'quadtree'",
                other
            ))),
        }
    }
}
