//! Octree build configuration

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::math::Aabb;
use crate::math::morton::decode_coords;
use super::leaf::{LeafGrid, LEAF_RESOLUTION};

/// Deepest layer that still fits leaf voxel coordinates into 21 Morton bits
pub const MAX_SUPPORTED_DEPTH: u8 = 19;

const SIZE_TOLERANCE: f32 = 1e-4;

/// Parameters for building navigation data over a cubic volume
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Centre of the navigable cube
    pub origin: [f32; 3],
    /// Half the cube's edge length
    pub half_extent: f32,
    /// Edge length of a leaf voxel
    pub voxel_size: f32,
    /// Depth of the deepest node layer (root is depth 0)
    pub max_depth: u8,
    /// Extra margin added around every oracle query box (agent radius)
    pub clearance: f32,
    /// World geometry revision, part of the cache key
    pub geometry_version: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            origin: [0.0; 3],
            half_extent: 32.0,
            voxel_size: 1.0,
            max_depth: 4,
            clearance: 0.0,
            geometry_version: 0,
        }
    }
}

impl BuildConfig {
    /// Config with `max_depth` derived from the volume and voxel size.
    ///
    /// Fails if the cube edge is not `voxel_size * 4 * 2^n` for some n.
    pub fn for_volume(origin: Vec3, half_extent: f32, voxel_size: f32) -> Result<Self> {
        if !(voxel_size.is_finite() && voxel_size > 0.0) {
            return Err(Error::InvalidConfig(format!("voxel size must be positive, got {}", voxel_size)));
        }
        let cells = (2.0 * half_extent) / (voxel_size * LEAF_RESOLUTION as f32);
        let depth = cells.log2().round();
        if !(0.0..=MAX_SUPPORTED_DEPTH as f32).contains(&depth) {
            return Err(Error::InvalidConfig(format!(
                "volume of half extent {} cannot be divided into voxels of {}",
                half_extent, voxel_size
            )));
        }
        let config = Self {
            origin: origin.to_array(),
            half_extent,
            voxel_size,
            max_depth: depth as u8,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_clearance(mut self, clearance: f32) -> Self {
        self.clearance = clearance;
        self
    }

    pub fn with_geometry_version(mut self, version: u64) -> Self {
        self.geometry_version = version;
        self
    }

    /// Check that the cube divides evenly into leaf voxels at `max_depth`
    pub fn validate(&self) -> Result<()> {
        if !(self.voxel_size.is_finite() && self.voxel_size > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "voxel size must be positive, got {}", self.voxel_size
            )));
        }
        if !(self.half_extent.is_finite() && self.half_extent > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "half extent must be positive, got {}", self.half_extent
            )));
        }
        if self.origin.iter().any(|c| !c.is_finite()) {
            return Err(Error::InvalidConfig("origin must be finite".into()));
        }
        if !(self.clearance.is_finite() && self.clearance >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "clearance must be non-negative, got {}", self.clearance
            )));
        }
        if self.max_depth > MAX_SUPPORTED_DEPTH {
            return Err(Error::InvalidConfig(format!(
                "max depth {} exceeds supported {}", self.max_depth, MAX_SUPPORTED_DEPTH
            )));
        }

        let expected = self.voxel_size * self.voxels_per_axis() as f32;
        let size = self.size();
        if ((size - expected) / expected).abs() > SIZE_TOLERANCE {
            return Err(Error::InvalidConfig(format!(
                "volume edge {} is not voxel size {} x {} (4 voxels per leaf at depth {})",
                size, self.voxel_size, self.voxels_per_axis(), self.max_depth
            )));
        }
        Ok(())
    }

    /// Cube edge length
    pub fn size(&self) -> f32 {
        self.half_extent * 2.0
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center_half_extent(Vec3::from_array(self.origin), Vec3::splat(self.half_extent))
    }

    /// Nodes per axis in the deepest layer
    pub fn leaf_nodes_per_axis(&self) -> u32 {
        1 << self.max_depth
    }

    /// Voxels per axis across the whole volume
    pub fn voxels_per_axis(&self) -> u32 {
        LEAF_RESOLUTION << self.max_depth
    }

    /// Edge length of nodes in layer `depth`
    pub fn node_size(&self, depth: u8) -> f32 {
        self.size() / (1u64 << depth) as f32
    }

    /// Leaf voxel edge implied by the cube and depth (equals `voxel_size`
    /// up to the validation tolerance)
    pub fn leaf_voxel_size(&self) -> f32 {
        self.size() / self.voxels_per_axis() as f32
    }

    /// World box of the node with Morton code `morton` in layer `depth`
    pub fn node_box(&self, depth: u8, morton: u64) -> Aabb {
        let size = self.node_size(depth);
        let min = self.bounds().min + decode_coords(morton).as_vec3() * size;
        Aabb::cube(min, size)
    }

    /// World box of voxel `voxel` inside the deepest-layer node `morton`
    pub fn voxel_box(&self, morton: u64, voxel: u8) -> Aabb {
        let size = self.leaf_voxel_size();
        let node_min = self.node_box(self.max_depth, morton).min;
        let min = node_min + LeafGrid::voxel_coords(voxel).as_vec3() * size;
        Aabb::cube(min, size)
    }
}
