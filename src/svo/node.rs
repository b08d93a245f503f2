//! Navigation octree node

use bytemuck::{Pod, Zeroable};
use rkyv::{Archive, Deserialize, Serialize};

/// Marker for "no child block / no leaf grid"
pub const NO_CHILD: u32 = u32::MAX;

const STATE_MASK: u32 = 0b11;

/// Occupancy of a node at node granularity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeState {
    /// Entirely navigable, traversable as one cell
    Free = 0,
    /// Entirely obstructed
    Blocked = 1,
    /// Mixed: either 8 children in the next layer or, at the deepest layer, a leaf grid
    HasChildren = 2,
}

/// Octree node - 16 bytes, no padding
///
/// Layout:
/// - morton (8 bytes): Morton code of the node's cell coordinates at its depth
/// - first_child (4 bytes): index of the first of 8 contiguous children in the
///   next layer, or of the leaf grid for nodes at the deepest layer
/// - flags (4 bytes): bits 0-1 state, 2-31 reserved
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable, Archive, Deserialize, Serialize)]
pub struct OctreeNode {
    pub morton: u64,
    pub first_child: u32,
    pub flags: u32,
}

impl OctreeNode {
    pub const fn free(morton: u64) -> Self {
        Self { morton, first_child: NO_CHILD, flags: NodeState::Free as u32 }
    }

    pub const fn blocked(morton: u64) -> Self {
        Self { morton, first_child: NO_CHILD, flags: NodeState::Blocked as u32 }
    }

    /// Mixed node whose children (or leaf grid) start at `first_child`
    pub const fn with_children(morton: u64, first_child: u32) -> Self {
        Self { morton, first_child, flags: NodeState::HasChildren as u32 }
    }

    pub fn state(&self) -> NodeState {
        match self.flags & STATE_MASK {
            0 => NodeState::Free,
            1 => NodeState::Blocked,
            _ => NodeState::HasChildren,
        }
    }

    pub fn set_state(&mut self, state: NodeState) {
        self.flags = (self.flags & !STATE_MASK) | state as u32;
        if state != NodeState::HasChildren {
            self.first_child = NO_CHILD;
        }
    }

    pub fn is_free(&self) -> bool {
        self.state() == NodeState::Free
    }

    pub fn is_blocked(&self) -> bool {
        self.state() == NodeState::Blocked
    }

    pub fn has_children(&self) -> bool {
        self.state() == NodeState::HasChildren && self.first_child != NO_CHILD
    }

    /// Index of child `slot` in the next layer (only meaningful above the deepest layer)
    pub fn child_index(&self, slot: u8) -> Option<usize> {
        self.has_children().then(|| self.first_child as usize + (slot & 7) as usize)
    }
}
