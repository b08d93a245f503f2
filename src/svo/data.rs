//! Immutable navigation octree

use std::fmt;

use glam::{UVec3, Vec3};

use crate::cache::key::Fnv1a;
use crate::core::{Error, Result};
use crate::math::Aabb;
use crate::math::morton::{ancestor_code, child_slot, common_ancestor_levels, decode_coords, encode_coords};
use super::address::NavAddress;
use super::config::BuildConfig;
use super::layer::OctreeLayer;
use super::leaf::{LeafGrid, LEAF_RESOLUTION};
use super::node::{NodeState, OctreeNode};

/// Built navigation data: one layer of nodes per depth plus the leaf grids of
/// mixed deepest-layer nodes.
///
/// Never mutated after construction. Rebuilding produces a new instance, so
/// any number of searches can share one snapshot behind an `Arc`.
#[derive(Clone, Debug, PartialEq)]
pub struct OctreeData {
    config: BuildConfig,
    bounds: Aabb,
    layers: Vec<OctreeLayer>,
    leaves: Vec<LeafGrid>,
}

/// Node counts for one layer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayerStats {
    pub free: usize,
    pub blocked: usize,
    pub mixed: usize,
}

/// Summary of an octree's contents
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OctreeStats {
    pub layers: Vec<LayerStats>,
    pub leaf_grids: usize,
    pub free_voxels: usize,
    pub blocked_voxels: usize,
}

impl OctreeStats {
    pub fn total_nodes(&self) -> usize {
        self.layers.iter().map(|l| l.free + l.blocked + l.mixed).sum()
    }
}

impl fmt::Display for OctreeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes in {} layers, {} leaf grids ({} free / {} blocked voxels)",
            self.total_nodes(),
            self.layers.len(),
            self.leaf_grids,
            self.free_voxels,
            self.blocked_voxels,
        )
    }
}

impl OctreeData {
    pub(crate) fn from_parts(config: BuildConfig, layers: Vec<OctreeLayer>, leaves: Vec<LeafGrid>) -> Self {
        let bounds = config.bounds();
        Self { config, bounds, layers, leaves }
    }

    pub(crate) fn into_parts(self) -> (BuildConfig, Vec<OctreeLayer>, Vec<LeafGrid>) {
        (self.config, self.layers, self.leaves)
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn max_depth(&self) -> u8 {
        self.config.max_depth
    }

    pub fn voxel_size(&self) -> f32 {
        self.config.leaf_voxel_size()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layers(&self) -> &[OctreeLayer] {
        &self.layers
    }

    pub fn layer(&self, depth: u8) -> Option<&OctreeLayer> {
        self.layers.get(depth as usize)
    }

    pub fn leaves(&self) -> &[LeafGrid] {
        &self.leaves
    }

    pub fn root(&self) -> Option<&OctreeNode> {
        self.layers.first().and_then(|l| l.get(0))
    }

    pub fn node_at(&self, depth: u8, index: usize) -> Option<&OctreeNode> {
        self.layer(depth).and_then(|l| l.get(index))
    }

    /// Node lookup by Morton code (binary search within the layer)
    pub fn node(&self, depth: u8, morton: u64) -> Option<&OctreeNode> {
        let layer = self.layer(depth)?;
        layer.find(morton).and_then(|i| layer.get(i))
    }

    /// Leaf grid of a mixed node in the deepest layer
    pub fn leaf_grid(&self, depth: u8, node: &OctreeNode) -> Option<LeafGrid> {
        if depth != self.max_depth() || !node.has_children() {
            return None;
        }
        self.leaves.get(node.first_child as usize).copied()
    }

    pub fn node_size(&self, depth: u8) -> f32 {
        self.config.node_size(depth)
    }

    pub fn node_box(&self, depth: u8, morton: u64) -> Aabb {
        self.config.node_box(depth, morton)
    }

    pub fn address_box(&self, address: NavAddress) -> Aabb {
        match address.voxel {
            Some(voxel) => self.config.voxel_box(address.morton, voxel),
            None => self.node_box(address.layer, address.morton),
        }
    }

    pub fn address_center(&self, address: NavAddress) -> Vec3 {
        self.address_box(address).center()
    }

    /// Edge length of the cell an address names
    pub fn address_size(&self, address: NavAddress) -> f32 {
        if address.is_voxel() {
            self.voxel_size()
        } else {
            self.node_size(address.layer)
        }
    }

    /// Walk from the root towards the cell `morton` at `depth`, stopping at the
    /// first node without children. Returns (layer, index) of that node.
    pub fn descend(&self, depth: u8, morton: u64) -> Option<(u8, usize)> {
        if self.layers.is_empty() {
            return None;
        }
        self.descend_from(0, 0, depth, morton)
    }

    /// Like [`descend`](Self::descend) but starts at the common ancestor of
    /// `from` and `target` (both codes at `depth`) instead of the root.
    pub fn resolve_cell(&self, depth: u8, from: u64, target: u64) -> Option<(u8, usize)> {
        let levels = common_ancestor_levels(from, target).min(depth as u32);
        let ancestor_depth = depth - levels as u8;
        let ancestor = ancestor_code(target, levels);
        match self.layer(ancestor_depth).and_then(|l| l.find(ancestor)) {
            Some(index) => self.descend_from(ancestor_depth, index, depth, target),
            None => self.descend(depth, target),
        }
    }

    fn descend_from(&self, mut layer: u8, mut index: usize, depth: u8, morton: u64) -> Option<(u8, usize)> {
        loop {
            let node = self.node_at(layer, index)?;
            if layer >= depth || layer >= self.max_depth() || !node.has_children() {
                return Some((layer, index));
            }
            let slot = child_slot(ancestor_code(morton, (depth - layer - 1) as u32));
            index = node.first_child as usize + slot as usize;
            layer += 1;
        }
    }

    /// Cell containing `point`: a Free or Blocked node, or a voxel of a leaf grid.
    ///
    /// Faces are inclusive; points on the max faces land in the last cell.
    pub fn locate(&self, point: Vec3) -> Result<NavAddress> {
        if !self.bounds.contains_point(point) {
            return Err(Error::OutOfBounds { point });
        }

        let max_voxel = (self.config.voxels_per_axis() - 1) as f32;
        let voxel = ((point - self.bounds.min) / self.voxel_size())
            .floor()
            .clamp(Vec3::ZERO, Vec3::splat(max_voxel))
            .as_uvec3();
        let leaf_code = encode_coords(voxel / LEAF_RESOLUTION);

        let max_depth = self.max_depth();
        let (layer, index) = self
            .descend(max_depth, leaf_code)
            .ok_or_else(|| Error::Unreachable("navigation data has no nodes".into()))?;
        let node = self.node_at(layer, index)
            .ok_or_else(|| Error::Unreachable("navigation data is inconsistent".into()))?;

        if self.leaf_grid(layer, node).is_some() {
            let local = voxel % UVec3::splat(LEAF_RESOLUTION);
            Ok(NavAddress::voxel(layer, node.morton, LeafGrid::voxel_index(local)))
        } else {
            Ok(NavAddress::node(layer, node.morton))
        }
    }

    /// True if the address names a Free node or a free voxel
    pub fn is_traversable(&self, address: NavAddress) -> bool {
        let Some(node) = self.node(address.layer, address.morton) else {
            return false;
        };
        match address.voxel {
            None => node.is_free(),
            Some(voxel) => self.leaf_grid(address.layer, node).is_some_and(|g| g.is_free(voxel)),
        }
    }

    pub fn stats(&self) -> OctreeStats {
        let layers = self
            .layers
            .iter()
            .map(|l| LayerStats {
                free: l.count(NodeState::Free),
                blocked: l.count(NodeState::Blocked),
                mixed: l.count(NodeState::HasChildren),
            })
            .collect();
        let blocked_voxels: usize = self.leaves.iter().map(|g| g.blocked_count() as usize).sum();
        OctreeStats {
            layers,
            leaf_grids: self.leaves.len(),
            free_voxels: self.leaves.len() * 64 - blocked_voxels,
            blocked_voxels,
        }
    }

    /// Approximate heap memory held by the node and leaf arrays
    pub fn memory_usage(&self) -> usize {
        let nodes: usize = self.layers.iter().map(|l| l.len()).sum();
        nodes * std::mem::size_of::<OctreeNode>() + self.leaves.len() * std::mem::size_of::<LeafGrid>()
    }

    /// FNV-1a over the configuration and the raw node and leaf bytes.
    /// Identical builds produce identical fingerprints.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Fnv1a::new();
        for c in self.config.origin {
            hasher.write_f32(c);
        }
        hasher.write_f32(self.config.half_extent);
        hasher.write_f32(self.config.voxel_size);
        hasher.write(&[self.config.max_depth]);
        hasher.write_f32(self.config.clearance);
        hasher.write_u64(self.config.geometry_version);
        for layer in &self.layers {
            hasher.write_u64(layer.len() as u64);
            hasher.write(bytemuck::cast_slice(layer.nodes()));
        }
        hasher.write(bytemuck::cast_slice(&self.leaves));
        hasher.finish()
    }

    /// Structural checks used when accepting data from outside the builder
    pub(crate) fn validate_structure(&self) -> Result<()> {
        let corrupt = |msg: String| -> Result<()> { Err(Error::Cache(msg)) };
        if self.layers.len() != self.max_depth() as usize + 1 {
            return corrupt(format!(
                "expected {} layers, found {}", self.max_depth() as usize + 1, self.layers.len()
            ));
        }
        if self.layers[0].len() != 1 {
            return corrupt("root layer must hold exactly one node".into());
        }
        for (depth, layer) in self.layers.iter().enumerate() {
            if !layer.is_sorted() {
                return corrupt(format!("layer {} is not sorted by Morton code", depth));
            }
            let next_len = self.layers.get(depth + 1).map_or(self.leaves.len(), |l| l.len());
            let is_deepest = depth == self.max_depth() as usize;
            for node in layer.nodes().iter().filter(|n| n.state() == NodeState::HasChildren) {
                let first = node.first_child as usize;
                let needed = if is_deepest { 1 } else { 8 };
                if node.first_child == super::node::NO_CHILD || first + needed > next_len {
                    return corrupt(format!("node {:#x} in layer {} points past its children", node.morton, depth));
                }
            }
        }
        Ok(())
    }

    /// Decode a node's cell coordinates at its depth
    pub fn node_coords(&self, morton: u64) -> UVec3 {
        decode_coords(morton)
    }
}
