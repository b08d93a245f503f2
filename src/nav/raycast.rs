//! Line-of-sight tests against the octree itself

use glam::Vec3;

use crate::math::{Aabb, Ray};
use crate::svo::data::OctreeData;
use crate::svo::leaf::LEAF_VOXEL_COUNT;
use crate::svo::node::NodeState;

/// Segment queries that only descend into nodes the segment touches
pub struct OctreeRaycaster<'a> {
    data: &'a OctreeData,
}

impl<'a> OctreeRaycaster<'a> {
    pub fn new(data: &'a OctreeData) -> Self {
        Self { data }
    }

    /// True if the closed segment touches no Blocked node and no blocked voxel.
    /// Segments leaving the volume are never clear.
    pub fn is_clear(&self, from: Vec3, to: Vec3) -> bool {
        let bounds = self.data.bounds();
        if !bounds.contains_point(from) || !bounds.contains_point(to) {
            return false;
        }

        let segment = Ray::from_segment(from, to);
        let touches = |aabb: &Aabb| match &segment {
            Some((ray, length)) => ray.segment_hits_aabb(*length, aabb),
            None => aabb.contains_point(from),
        };

        let mut stack = vec![(0u8, 0usize)];
        while let Some((layer, index)) = stack.pop() {
            let Some(node) = self.data.node_at(layer, index) else {
                continue;
            };
            if !touches(&self.data.node_box(layer, node.morton)) {
                continue;
            }
            match node.state() {
                NodeState::Free => {}
                NodeState::Blocked => return false,
                NodeState::HasChildren => {
                    if let Some(grid) = self.data.leaf_grid(layer, node) {
                        let hit = (0..LEAF_VOXEL_COUNT).any(|voxel| {
                            grid.is_blocked(voxel)
                                && touches(&self.data.config().voxel_box(node.morton, voxel))
                        });
                        if hit {
                            return false;
                        }
                    } else {
                        stack.extend((0..8u8).filter_map(|slot| node.child_index(slot)).map(|child| (layer + 1, child)));
                    }
                }
            }
        }
        true
    }
}
