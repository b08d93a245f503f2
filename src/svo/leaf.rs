//! Leaf sub-grid: 4x4x4 voxel occupancy packed into one u64

use bytemuck::{Pod, Zeroable};
use glam::{IVec3, UVec3};
use rkyv::{Archive, Deserialize, Serialize};

use crate::math::morton::{decode_morton_3d, encode_morton_3d};

/// Voxels per axis in a leaf grid
pub const LEAF_RESOLUTION: u32 = 4;
/// Voxels per leaf grid
pub const LEAF_VOXEL_COUNT: u8 = 64;

/// Occupancy bits of a deepest-layer node, one bit per voxel (1 = blocked),
/// indexed by the voxel's 6-bit Morton code.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Archive, Deserialize, Serialize)]
pub struct LeafGrid(pub u64);

impl LeafGrid {
    pub const EMPTY: LeafGrid = LeafGrid(0);
    pub const FULL: LeafGrid = LeafGrid(u64::MAX);

    /// Voxel index for local coordinates (each 0..4)
    pub fn voxel_index(coords: UVec3) -> u8 {
        debug_assert!(coords.max_element() < LEAF_RESOLUTION);
        encode_morton_3d(coords.x, coords.y, coords.z) as u8
    }

    /// Local coordinates of a voxel index
    pub fn voxel_coords(index: u8) -> UVec3 {
        let (x, y, z) = decode_morton_3d(index as u64);
        UVec3::new(x, y, z)
    }

    pub fn is_blocked(&self, index: u8) -> bool {
        (self.0 >> (index & 63)) & 1 != 0
    }

    pub fn is_free(&self, index: u8) -> bool {
        !self.is_blocked(index)
    }

    pub fn set_blocked(&mut self, index: u8, blocked: bool) {
        let bit = 1u64 << (index & 63);
        if blocked {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }

    pub fn is_fully_blocked(&self) -> bool {
        self.0 == u64::MAX
    }

    pub fn is_fully_free(&self) -> bool {
        self.0 == 0
    }

    pub fn blocked_count(&self) -> u32 {
        self.0.count_ones()
    }

    pub fn free_count(&self) -> u32 {
        self.0.count_zeros()
    }

    /// Indices of free voxels on the face you enter when travelling along `dir`.
    ///
    /// Moving +X into a grid enters through its x = 0 face, moving -X through
    /// x = 3. `dir` must be axis-aligned.
    pub fn free_entry_face(&self, dir: IVec3) -> impl Iterator<Item = u8> + '_ {
        let axis = if dir.x != 0 { 0 } else if dir.y != 0 { 1 } else { 2 };
        let layer = if dir[axis] > 0 { 0 } else { LEAF_RESOLUTION - 1 };
        (0..LEAF_VOXEL_COUNT).filter(move |&index| {
            Self::voxel_coords(index)[axis] == layer && self.is_free(index)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip() {
        for index in 0..LEAF_VOXEL_COUNT {
            assert_eq!(LeafGrid::voxel_index(LeafGrid::voxel_coords(index)), index);
        }
        assert_eq!(LeafGrid::voxel_index(UVec3::new(3, 3, 3)), 63);
    }

    #[test]
    fn test_set_and_count() {
        let mut grid = LeafGrid::EMPTY;
        assert!(grid.is_fully_free());
        grid.set_blocked(10, true);
        grid.set_blocked(63, true);
        assert!(grid.is_blocked(10));
        assert_eq!(grid.blocked_count(), 2);
        assert_eq!(grid.free_count(), 62);
        grid.set_blocked(10, false);
        assert!(grid.is_free(10));
        assert!(LeafGrid::FULL.is_fully_blocked());
    }

    #[test]
    fn test_entry_face() {
        let mut grid = LeafGrid::EMPTY;
        grid.set_blocked(LeafGrid::voxel_index(UVec3::new(0, 0, 0)), true);

        // Entering +X: the x = 0 face, 16 voxels, one of them blocked
        let face: Vec<u8> = grid.free_entry_face(IVec3::X).collect();
        assert_eq!(face.len(), 15);
        assert!(face.iter().all(|&i| LeafGrid::voxel_coords(i).x == 0));

        // Entering -Z: the z = 3 face, all free
        let face: Vec<u8> = grid.free_entry_face(IVec3::NEG_Z).collect();
        assert_eq!(face.len(), 16);
        assert!(face.iter().all(|&i| LeafGrid::voxel_coords(i).z == 3));
    }
}
