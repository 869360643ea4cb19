//! Region quadtree over (lat, lon) coordinates.
//!
//! Leaves hold only object ids (see [`crate::index`] for the rationale);
//! every operation that needs a location resolves it through a caller-
//! supplied lookup closure backed by the index's authoritative object
//! table, so a leaf never goes stale relative to that table.

use crate::geometry::{Location, Rectangle};
use serde::{Deserialize, Serialize};

/// Recommended production capacity: smaller values (4-30) are valid but
/// harm build throughput and cache locality.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Below this side length subdivision is skipped and the leaf is allowed
/// to overflow, preventing pathological recursion on coincident points.
pub const SUBDIVISION_FLOOR: f64 = 1e-4;

#[derive(Serialize, Deserialize)]
enum NodeState {
    Leaf(Vec<u64>),
    /// Exactly four children, in SW, SE, NW, NE order.
    Internal(Box<[QuadNode; 4]>),
}

/// A region of the plane: either a leaf holding up to `capacity` object
/// ids, or an internal node with exactly four children. A node never
/// reverts from internal back to leaf.
#[derive(Serialize, Deserialize)]
pub struct QuadNode {
    bounds: Rectangle,
    capacity: usize,
    state: NodeState,
}

impl QuadNode {
    /// Create an empty leaf covering `bounds`.
    pub fn new(bounds: Rectangle, capacity: usize) -> Self {
        Self {
            bounds,
            capacity,
            state: NodeState::Leaf(Vec::new()),
        }
    }

    pub fn bounds(&self) -> Rectangle {
        self.bounds
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Insert `id` (already known to live at `location`) into this subtree.
    ///
    /// `locate` resolves any id (including ids already stored in this
    /// subtree) to its location; it is needed to redistribute a leaf's
    /// contents across new children on subdivision. Returns `true` iff
    /// `location` lies inside `bounds` and the id was placed.
    pub fn insert(&mut self, id: u64, location: Location, locate: &impl Fn(u64) -> Location) -> bool {
        if !self.bounds.contains(location) {
            return false;
        }
        match &mut self.state {
            NodeState::Internal(children) => {
                for child in children.iter_mut() {
                    if child.insert(id, location, locate) {
                        return true;
                    }
                }
                // Unreachable for a well-formed split: children exactly
                // tile `bounds`, which we already confirmed contains
                // `location`.
                false
            }
            NodeState::Leaf(ids) => {
                ids.push(id);
                if ids.len() > self.capacity && self.bounds.shorter_side() > SUBDIVISION_FLOOR {
                    self.subdivide(locate);
                } else if ids.len() > self.capacity {
                    log::warn!(
                        "quadtree leaf at ({:?}) exceeds capacity {} but cannot subdivide \
                         (shorter side {} is below the {} floor); leaving it to grow",
                        self.bounds,
                        self.capacity,
                        self.bounds.shorter_side(),
                        SUBDIVISION_FLOOR,
                    );
                }
                true
            }
        }
    }

    fn subdivide(&mut self, locate: &impl Fn(u64) -> Location) {
        let b = self.bounds;
        let (mid_lat, mid_lon) = b.midpoint();
        let mut children = [
            QuadNode::new(Rectangle::new(b.min_lat, b.min_lon, mid_lat, mid_lon), self.capacity), // SW
            QuadNode::new(Rectangle::new(mid_lat, b.min_lon, b.max_lat, mid_lon), self.capacity), // SE
            QuadNode::new(Rectangle::new(b.min_lat, mid_lon, mid_lat, b.max_lon), self.capacity), // NW
            QuadNode::new(Rectangle::new(mid_lat, mid_lon, b.max_lat, b.max_lon), self.capacity), // NE
        ];

        let held = match &mut self.state {
            NodeState::Leaf(ids) => std::mem::take(ids),
            NodeState::Internal(_) => unreachable!("subdivide only runs on leaves"),
        };
        for id in held {
            let loc = locate(id);
            let placed = children.iter_mut().any(|child| child.insert(id, loc, locate));
            debug_assert!(placed, "child bounds must tile the parent's bounds");
        }

        self.state = NodeState::Internal(Box::new(children));
    }

    /// Append every descendant id whose location lies inside `rect` to
    /// `out`. Uses an explicit work stack rather than recursion so deep
    /// trees (many coincident or near-coincident points) cannot blow the
    /// host stack.
    pub fn query_range(&self, rect: &Rectangle, locate: &impl Fn(u64) -> Location, out: &mut Vec<u64>) {
        let mut stack: Vec<&QuadNode> = vec![self];
        while let Some(node) = stack.pop() {
            if !rect.intersects(&node.bounds) {
                continue;
            }
            match &node.state {
                NodeState::Leaf(ids) => {
                    for &id in ids {
                        if rect.contains(locate(id)) {
                            out.push(id);
                        }
                    }
                }
                NodeState::Internal(children) => {
                    for child in children.iter() {
                        stack.push(child);
                    }
                }
            }
        }
    }

    /// Total number of ids stored anywhere in this subtree.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        match &self.state {
            NodeState::Leaf(ids) => ids.len(),
            NodeState::Internal(children) => children.iter().map(QuadNode::len).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn locator(map: &HashMap<u64, Location>) -> impl Fn(u64) -> Location + '_ {
        move |id| map[&id]
    }

    #[test]
    fn insert_outside_bounds_is_rejected() {
        let mut root = QuadNode::new(Rectangle::new(0.0, 0.0, 10.0, 10.0), 4);
        let locs = HashMap::new();
        assert!(!root.insert(1, (20.0, 20.0), &locator(&locs)));
    }

    #[test]
    fn insert_on_universe_boundary_is_accepted() {
        let mut root = QuadNode::new(Rectangle::new(0.0, 0.0, 10.0, 10.0), 4);
        let locs = HashMap::new();
        assert!(root.insert(1, (0.0, 0.0), &locator(&locs)));
        assert!(root.insert(2, (10.0, 10.0), &locator(&locs)));
    }

    #[test]
    fn overfilling_a_leaf_triggers_subdivision() {
        let mut root = QuadNode::new(Rectangle::new(0.0, 0.0, 200.0, 200.0), 2);
        let mut locs = HashMap::new();
        for id in 0..5u64 {
            let loc = (id as f64, id as f64);
            locs.insert(id, loc);
            assert!(root.insert(id, loc, &locator(&locs)));
        }
        assert!(matches!(root.state, NodeState::Internal(_)));
        assert_eq!(root.len(), 5);
    }

    #[test]
    fn midpoint_boundary_resolves_to_lower_index_child() {
        let mut root = QuadNode::new(Rectangle::new(0.0, 0.0, 200.0, 200.0), 1);
        let mut locs = HashMap::new();
        // Two inserts force a split with a midpoint at (100, 100).
        locs.insert(0, (10.0, 10.0));
        locs.insert(1, (190.0, 190.0));
        root.insert(0, locs[&0], &locator(&locs));
        root.insert(1, locs[&1], &locator(&locs));
        locs.insert(2, (100.0, 100.0));
        root.insert(2, locs[&2], &locator(&locs));

        let children = match &root.state {
            NodeState::Internal(children) => children,
            NodeState::Leaf(_) => panic!("expected split"),
        };
        // SW is children[0]; a point exactly on both midpoints must have
        // landed there, since insert tries SW first.
        match &children[0].state {
            NodeState::Leaf(ids) => assert!(ids.contains(&2)),
            NodeState::Internal(_) => panic!("SW unexpectedly split"),
        }
    }

    #[test]
    fn query_range_only_returns_points_inside_rect() {
        let mut root = QuadNode::new(Rectangle::new(0.0, 0.0, 200.0, 200.0), 2);
        let mut locs = HashMap::new();
        for (id, loc) in [(0u64, (10.0, 10.0)), (1, (12.0, 10.0)), (2, (190.0, 190.0))] {
            locs.insert(id, loc);
            root.insert(id, loc, &locator(&locs));
        }
        let mut out = Vec::new();
        root.query_range(&Rectangle::new(0.0, 0.0, 20.0, 20.0), &locator(&locs), &mut out);
        out.sort_unstable();
        assert_eq!(out, vec![0, 1]);
    }

    #[test]
    fn query_range_disjoint_rect_prunes_everything() {
        let mut root = QuadNode::new(Rectangle::new(0.0, 0.0, 200.0, 200.0), 100);
        let mut locs = HashMap::new();
        locs.insert(0, (5.0, 5.0));
        root.insert(0, (5.0, 5.0), &locator(&locs));

        let mut out = Vec::new();
        root.query_range(&Rectangle::new(190.0, 190.0, 199.0, 199.0), &locator(&locs), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn coincident_points_below_floor_overflow_instead_of_looping() {
        let mut root = QuadNode::new(Rectangle::new(0.0, 0.0, 0.00005, 0.00005), 2);
        let mut locs = HashMap::new();
        for id in 0..10u64 {
            locs.insert(id, (0.00001, 0.00001));
            assert!(root.insert(id, (0.00001, 0.00001), &locator(&locs)));
        }
        assert!(matches!(root.state, NodeState::Leaf(_)));
        assert_eq!(root.len(), 10);
    }
}
