//! Adaptive region quadtree.
//!
//! Leaves hold up to `max_objects` entries. A leaf that overflows splits into
//! four equal quadrants (unless it is already at `min_size`), and a subtree
//! whose children are all leaves collapses back into a single leaf once it
//! holds fewer than `max_objects` entries. Quadrants are half-open: a point
//! on a midline belongs to the right/lower child.

use super::{Handle, IndexError, SpatialIndex, SpatialObject};
use crate::geometry::Vec2;
use std::collections::HashMap;

/// Default leaf capacity before subdivision
pub const MAX_OBJECTS: usize = 10;

/// Default smallest node edge that may still subdivide
pub const MIN_SIZE: f32 = 10.0;

/// Far-edge tolerance, relative to the node size so it survives large universes
const EDGE_TOLERANCE: f32 = 4.0 * f32::EPSILON;

/// Structural statistics of a quadtree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuadtreeStats {
    pub node_count: usize,
    pub leaf_count: usize,
    pub max_depth: usize,
    pub object_count: usize,
}

#[derive(Debug, Clone, Copy)]
struct Limits {
    max_objects: usize,
    min_size: f32,
}

#[derive(Debug, Clone)]
struct QuadNode<H> {
    offset: Vec2,
    size: f32,
    objects: Vec<SpatialObject<H>>,
    children: Option<Box<[QuadNode<H>; 4]>>,
}

impl<H: Handle> QuadNode<H> {
    fn leaf(offset: Vec2, size: f32) -> Self {
        Self {
            offset,
            size,
            objects: Vec::new(),
            children: None,
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Edge length including the far-edge tolerance
    #[inline]
    fn reach(&self) -> f32 {
        self.size * (1.0 + EDGE_TOLERANCE)
    }

    /// The far edge is inclusive.
    fn contains(&self, p: Vec2) -> bool {
        let far = self.reach();
        p.x >= self.offset.x
            && p.x <= self.offset.x + far
            && p.y >= self.offset.y
            && p.y <= self.offset.y + far
    }

    /// Child slot for `p`: bit 0 is east, bit 1 is south.
    #[inline]
    fn quadrant(&self, p: Vec2) -> usize {
        let half = self.size / 2.0;
        let east = p.x >= self.offset.x + half;
        let south = p.y >= self.offset.y + half;
        east as usize + 2 * south as usize
    }

    /// Circle/square overlap test used to prune queries
    fn intersects_circle(&self, center: Vec2, range: f32) -> bool {
        let far = self.reach();
        let closest = center.clamp(self.offset, self.offset + Vec2::splat(far));
        center.within(closest, range)
    }

    fn insert(&mut self, object: SpatialObject<H>, limits: Limits) {
        let quadrant = self.quadrant(object.position);
        if let Some(children) = self.children.as_mut() {
            children[quadrant].insert(object, limits);
            return;
        }

        self.objects.push(object);
        if self.objects.len() > limits.max_objects && self.size > limits.min_size {
            self.subdivide(limits);
        }
    }

    fn subdivide(&mut self, limits: Limits) {
        let half = self.size / 2.0;
        let Vec2 { x, y } = self.offset;
        self.children = Some(Box::new([
            QuadNode::leaf(Vec2::new(x, y), half),
            QuadNode::leaf(Vec2::new(x + half, y), half),
            QuadNode::leaf(Vec2::new(x, y + half), half),
            QuadNode::leaf(Vec2::new(x + half, y + half), half),
        ]));

        // Children may subdivide again while receiving these
        for object in std::mem::take(&mut self.objects) {
            self.insert(object, limits);
        }
    }

    fn query(&self, center: Vec2, range: f32, out: &mut Vec<H>) {
        if !self.intersects_circle(center, range) {
            return;
        }

        match &self.children {
            Some(children) => {
                for child in children.iter() {
                    child.query(center, range, out);
                }
            }
            None => out.extend(
                self.objects
                    .iter()
                    .filter(|obj| center.within(obj.position, range))
                    .map(|obj| obj.handle),
            ),
        }
    }

    /// Remove `handle`, known to be indexed at `position`. Merges on the way
    /// back up.
    fn remove(&mut self, handle: &H, position: Vec2, limits: Limits) -> bool {
        let quadrant = self.quadrant(position);
        let removed = match self.children.as_mut() {
            Some(children) => children[quadrant].remove(handle, position, limits),
            None => {
                return match self.objects.iter().position(|obj| obj.handle == *handle) {
                    Some(i) => {
                        self.objects.swap_remove(i);
                        true
                    }
                    None => false,
                };
            }
        };

        if removed {
            self.try_merge(limits);
        }
        removed
    }

    /// Move `handle` from `old` to `new`. Follows the shared path while both
    /// positions route to the same child; where they diverge the object is
    /// removed from one subtree and inserted into the other.
    fn update(&mut self, handle: &H, old: Vec2, new: Vec2, limits: Limits) -> bool {
        let from = self.quadrant(old);
        let to = self.quadrant(new);

        let Some(children) = self.children.as_mut() else {
            return match self.objects.iter_mut().find(|obj| obj.handle == *handle) {
                Some(obj) => {
                    obj.position = new;
                    true
                }
                None => false,
            };
        };

        if from == to {
            return children[from].update(handle, old, new, limits);
        }

        if !children[from].remove(handle, old, limits) {
            return false;
        }
        children[to].insert(SpatialObject::new(*handle, new), limits);
        true
    }

    /// Collapse into a leaf when every child is a leaf and the subtree holds
    /// fewer than `max_objects` entries.
    fn try_merge(&mut self, limits: Limits) {
        let Some(children) = self.children.as_mut() else {
            return;
        };
        if !children.iter().all(QuadNode::is_leaf) {
            return;
        }

        let total = self.objects.len() + children.iter().map(|c| c.objects.len()).sum::<usize>();
        if total >= limits.max_objects {
            return;
        }

        for child in children.iter_mut() {
            self.objects.append(&mut child.objects);
        }
        self.children = None;
    }

    fn collect_stats(&self, depth: usize, stats: &mut QuadtreeStats) {
        stats.node_count += 1;
        stats.max_depth = stats.max_depth.max(depth);
        match &self.children {
            Some(children) => {
                for child in children.iter() {
                    child.collect_stats(depth + 1, stats);
                }
            }
            None => {
                stats.leaf_count += 1;
                stats.object_count += self.objects.len();
            }
        }
    }
}

/// Quadtree over the square universe `[offset, offset + size]`.
///
/// A side table records where each handle is indexed, so removals route
/// straight to the owning leaf and unknown handles are detected without a
/// tree walk.
#[derive(Debug, Clone)]
pub struct AdaptiveQuadtree<H: Handle> {
    root: QuadNode<H>,
    positions: HashMap<H, Vec2>,
    limits: Limits,
}

impl<H: Handle> AdaptiveQuadtree<H> {
    /// Quadtree over `[0, size]^2` with the default limits
    pub fn new(size: f32) -> Self {
        Self::with_params(Vec2::ZERO, size, MAX_OBJECTS, MIN_SIZE)
    }

    pub fn with_params(offset: Vec2, size: f32, max_objects: usize, min_size: f32) -> Self {
        Self {
            root: QuadNode::leaf(offset, size),
            positions: HashMap::new(),
            limits: Limits {
                max_objects: max_objects.max(1),
                min_size,
            },
        }
    }

    pub fn offset(&self) -> Vec2 {
        self.root.offset
    }

    pub fn size(&self) -> f32 {
        self.root.size
    }

    /// Whether `(x, y)` lies inside the universe
    pub fn in_bounds(&self, x: f32, y: f32) -> bool {
        self.root.contains(Vec2::new(x, y))
    }

    /// Whether the root has split into quadrants
    pub fn is_subdivided(&self) -> bool {
        !self.root.is_leaf()
    }

    pub fn stats(&self) -> QuadtreeStats {
        let mut stats = QuadtreeStats::default();
        self.root.collect_stats(0, &mut stats);
        stats
    }

    fn check_bounds(&self, p: Vec2) -> Result<(), IndexError> {
        if self.root.contains(p) {
            Ok(())
        } else {
            Err(IndexError::OutOfBounds { x: p.x, y: p.y })
        }
    }
}

impl<H: Handle> SpatialIndex<H> for AdaptiveQuadtree<H> {
    fn insert(&mut self, handle: H, x: f32, y: f32) -> Result<(), IndexError> {
        let position = Vec2::new(x, y);
        self.check_bounds(position)?;
        if self.positions.contains_key(&handle) {
            return Err(IndexError::AlreadyPresent);
        }

        self.root.insert(SpatialObject::new(handle, position), self.limits);
        self.positions.insert(handle, position);
        Ok(())
    }

    fn query(&self, x: f32, y: f32, range: f32) -> Vec<H> {
        let mut out = Vec::new();
        self.root.query(Vec2::new(x, y), range, &mut out);
        out
    }

    fn update(&mut self, handle: H, x: f32, y: f32) -> Result<(), IndexError> {
        let old = *self.positions.get(&handle).ok_or(IndexError::NotFound)?;
        let new = Vec2::new(x, y);
        self.check_bounds(new)?;

        if !self.root.update(&handle, old, new, self.limits) {
            return Err(IndexError::NotFound);
        }
        self.positions.insert(handle, new);
        Ok(())
    }

    fn remove(&mut self, handle: &H) -> bool {
        match self.positions.remove(handle) {
            Some(position) => self.root.remove(handle, position, self.limits),
            None => false,
        }
    }

    fn clear(&mut self) {
        self.root = QuadNode::leaf(self.root.offset, self.root.size);
        self.positions.clear();
    }

    fn position(&self, handle: &H) -> Option<Vec2> {
        self.positions.get(handle).copied()
    }

    fn len(&self) -> usize {
        self.positions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn set(v: Vec<u32>) -> HashSet<u32> {
        v.into_iter().collect()
    }

    #[test]
    fn test_quadrant_routing_is_half_open() {
        let node: QuadNode<u32> = QuadNode::leaf(Vec2::ZERO, 100.0);
        assert_eq!(node.quadrant(Vec2::new(10.0, 10.0)), 0);
        assert_eq!(node.quadrant(Vec2::new(50.0, 10.0)), 1);
        assert_eq!(node.quadrant(Vec2::new(49.99, 50.0)), 2);
        assert_eq!(node.quadrant(Vec2::new(50.0, 50.0)), 3);
    }

    #[test]
    fn test_bounds_enforced() {
        let mut tree = AdaptiveQuadtree::new(1000.0);
        assert_eq!(
            tree.insert(1u32, 1000.1, 0.0),
            Err(IndexError::OutOfBounds { x: 1000.1, y: 0.0 })
        );
        assert!(tree.insert(2, -0.01, 5.0).is_err());
        assert!(tree.insert(3, f32::NAN, 5.0).is_err());
        // The far edge itself is accepted
        assert!(tree.insert(4, 1000.0, 1000.0).is_ok());
        assert_eq!(tree.query(1000.0, 1000.0, 0.0), vec![4]);
    }

    #[test]
    fn test_far_edge_accepted_in_large_universe() {
        for size in [2048.0f32, 4000.0, 65536.0] {
            let mut tree = AdaptiveQuadtree::with_params(Vec2::ZERO, size, 2, 10.0);
            assert!(tree.insert(1u32, size, 0.0).is_ok(), "{}", size);
            assert!(tree.insert(2, size, size).is_ok(), "{}", size);
            assert!(tree.insert(3, size - 1.0, size).is_ok(), "{}", size);
            assert!(tree.is_subdivided());

            tree.update(3, size, size / 2.0).unwrap();
            assert_eq!(set(tree.query(size, size, 0.0)), set(vec![2]));
            assert_eq!(set(tree.query(size, 0.0, size / 2.0)), set(vec![1, 3]));

            // Still rejects points clearly past the edge
            assert!(tree.insert(4, size * 1.001, 0.0).is_err());
        }
    }

    #[test]
    fn test_failed_update_leaves_tree_unchanged() {
        let mut tree = AdaptiveQuadtree::new(1000.0);
        tree.insert(1u32, 10.0, 10.0).unwrap();

        assert!(tree.update(1, 2000.0, 10.0).is_err());
        assert_eq!(tree.position(&1), Some(Vec2::new(10.0, 10.0)));
        assert_eq!(tree.query(10.0, 10.0, 0.0), vec![1]);

        assert_eq!(tree.update(9, 1.0, 1.0), Err(IndexError::NotFound));
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut tree = AdaptiveQuadtree::new(100.0);
        tree.insert(1u32, 10.0, 10.0).unwrap();
        assert_eq!(tree.insert(1, 20.0, 20.0), Err(IndexError::AlreadyPresent));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_subdivide_and_merge_round_trip() {
        let mut tree = AdaptiveQuadtree::new(1000.0);
        for i in 0..=MAX_OBJECTS as u32 {
            tree.insert(i, 10.0 + i as f32 * 3.0, 20.0).unwrap();
        }
        assert!(tree.is_subdivided());
        let stats = tree.stats();
        assert_eq!(stats.object_count, MAX_OBJECTS + 1);
        assert!(stats.max_depth >= 1);

        // 11 -> 10 is still at the threshold
        assert!(tree.remove(&0));
        assert!(tree.is_subdivided());

        // 10 -> 9 collapses every level back into the root
        assert!(tree.remove(&1));
        assert!(!tree.is_subdivided());
        assert_eq!(tree.stats().node_count, 1);

        let mut fresh = AdaptiveQuadtree::new(1000.0);
        for i in 2..=MAX_OBJECTS as u32 {
            fresh.insert(i, 10.0 + i as f32 * 3.0, 20.0).unwrap();
        }
        for (x, y, r) in [(10.0, 20.0, 5.0), (30.0, 20.0, 12.0), (0.0, 0.0, 1000.0)] {
            assert_eq!(set(tree.query(x, y, r)), set(fresh.query(x, y, r)));
        }
    }

    #[test]
    fn test_min_size_stops_subdivision() {
        let mut tree = AdaptiveQuadtree::with_params(Vec2::ZERO, 80.0, 2, 10.0);
        for i in 0..20u32 {
            tree.insert(i, 1.0, 1.0).unwrap();
        }
        let stats = tree.stats();
        // 80 -> 40 -> 20 -> 10, and a 10-wide node may not split
        assert_eq!(stats.max_depth, 3);
        assert_eq!(tree.query(1.0, 1.0, 0.0).len(), 20);
    }

    #[test]
    fn test_update_across_quadrants() {
        let mut tree = AdaptiveQuadtree::with_params(Vec2::ZERO, 1000.0, 2, 10.0);
        for i in 0..8u32 {
            tree.insert(i, 100.0 + i as f32, 100.0).unwrap();
        }
        tree.update(3, 900.0, 900.0).unwrap();

        assert_eq!(tree.query(900.0, 900.0, 1.0), vec![3]);
        assert!(!tree.query(100.0, 100.0, 10.0).contains(&3));
        assert_eq!(tree.stats().object_count, 8);
    }

    #[test]
    fn test_update_in_place_keeps_structure() {
        let mut tree = AdaptiveQuadtree::new(1000.0);
        tree.insert(1u32, 10.0, 10.0).unwrap();
        tree.update(1, 12.0, 11.0).unwrap();
        assert_eq!(tree.stats().node_count, 1);
        assert_eq!(tree.query(12.0, 11.0, 0.0), vec![1]);
    }

    #[test]
    fn test_remove_absent_is_benign() {
        let mut tree: AdaptiveQuadtree<u32> = AdaptiveQuadtree::new(100.0);
        assert!(!tree.remove(&42));
        tree.insert(42, 5.0, 5.0).unwrap();
        assert!(tree.remove(&42));
        assert!(!tree.remove(&42));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_clear_resets_to_leaf() {
        let mut tree = AdaptiveQuadtree::new(1000.0);
        for i in 0..50u32 {
            tree.insert(i, (i * 19 % 1000) as f32, (i * 7 % 1000) as f32).unwrap();
        }
        assert!(tree.is_subdivided());

        tree.clear();
        assert!(!tree.is_subdivided());
        assert!(tree.is_empty());
        assert!(tree.query(500.0, 500.0, 1000.0).is_empty());
    }
}
