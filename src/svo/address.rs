//! Graph vertex identity

use std::fmt;

/// Globally unique cell identifier: depth layer, Morton code at that depth and,
/// for cells inside a leaf grid, the voxel index.
///
/// Ordered by layer, then Morton code, then voxel, so sorted neighbour lists and
/// search tie-breaks are reproducible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NavAddress {
    pub layer: u8,
    pub morton: u64,
    pub voxel: Option<u8>,
}

impl NavAddress {
    /// A whole node
    pub const fn node(layer: u8, morton: u64) -> Self {
        Self { layer, morton, voxel: None }
    }

    /// A voxel inside the leaf grid of a deepest-layer node
    pub const fn voxel(layer: u8, morton: u64, voxel: u8) -> Self {
        Self { layer, morton, voxel: Some(voxel) }
    }

    pub fn is_voxel(&self) -> bool {
        self.voxel.is_some()
    }

    /// The node owning this address (itself for node addresses)
    pub fn owner(&self) -> NavAddress {
        NavAddress::node(self.layer, self.morton)
    }
}

impl fmt::Display for NavAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.voxel {
            Some(voxel) => write!(f, "L{}:{:#x}/{}", self.layer, self.morton, voxel),
            None => write!(f, "L{}:{:#x}", self.layer, self.morton),
        }
    }
}
