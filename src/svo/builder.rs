//! Breadth-first octree construction from an occupancy oracle
//!
//! Each depth is classified in one parallel pass over the pending nodes.
//! Mixed nodes above the deepest layer push their eight children onto the
//! next layer in slot order; mixed nodes at the deepest layer are voxelized
//! into a 4x4x4 leaf grid instead of subdividing further.

use std::time::Instant;

use rayon::prelude::*;

use crate::core::Result;
use crate::math::Aabb;
use crate::math::morton::child_code;
use super::config::BuildConfig;
use super::data::OctreeData;
use super::layer::OctreeLayer;
use super::leaf::{LeafGrid, LEAF_VOXEL_COUNT};
use super::node::{OctreeNode, NO_CHILD};
use super::oracle::{OccupancyOracle, RegionHint};

/// Builds [`OctreeData`] for one configuration
#[derive(Clone, Debug)]
pub struct OctreeBuilder {
    config: BuildConfig,
}

impl OctreeBuilder {
    /// Fails with `InvalidConfig` if the volume does not divide evenly
    pub fn new(config: BuildConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Voxelize the volume against `oracle`.
    ///
    /// Pure function of the configuration and the oracle's answers: identical
    /// inputs give bit-identical output.
    pub fn build<O: OccupancyOracle + ?Sized>(&self, oracle: &O) -> Result<OctreeData> {
        let start = Instant::now();
        let max_depth = self.config.max_depth;

        let mut layers: Vec<OctreeLayer> = Vec::with_capacity(max_depth as usize + 1);
        let mut leaves: Vec<LeafGrid> = Vec::new();
        let mut pending: Vec<u64> = vec![0];
        let mut empty_grids = 0usize;

        for depth in 0..=max_depth {
            let hints: Vec<RegionHint> = pending
                .par_iter()
                .map(|&code| oracle.classify(&self.query_box(depth, code)))
                .collect();

            let mut layer = OctreeLayer::with_capacity(pending.len());
            let mut next: Vec<u64> = Vec::new();
            let mut to_voxelize: Vec<usize> = Vec::new();

            for (&code, hint) in pending.iter().zip(&hints) {
                match hint {
                    RegionHint::Empty => {
                        layer.push(OctreeNode::free(code));
                    }
                    RegionHint::Solid => {
                        layer.push(OctreeNode::blocked(code));
                    }
                    RegionHint::Mixed | RegionHint::Unknown if depth < max_depth => {
                        layer.push(OctreeNode::with_children(code, next.len() as u32));
                        next.extend((0..8u8).map(|slot| child_code(code, slot)));
                    }
                    RegionHint::Mixed | RegionHint::Unknown => {
                        to_voxelize.push(layer.len());
                        layer.push(OctreeNode::with_children(code, NO_CHILD));
                    }
                }
            }

            if !to_voxelize.is_empty() {
                let grids: Vec<LeafGrid> = to_voxelize
                    .par_iter()
                    .map(|&index| self.voxelize(oracle, layer.nodes()[index].morton))
                    .collect();

                for (&index, grid) in to_voxelize.iter().zip(grids) {
                    // Kept as voxelized even when it disagrees with the node query
                    if grid.is_fully_free() {
                        empty_grids += 1;
                    }
                    let leaf_index = leaves.len() as u32;
                    leaves.push(grid);
                    if let Some(node) = layer.node_mut(index) {
                        node.first_child = leaf_index;
                    }
                }
            }

            log::debug!(
                "Layer {}: {} nodes, {} pending children, {} leaf grids",
                depth,
                layer.len(),
                next.len(),
                to_voxelize.len(),
            );
            layers.push(layer);
            pending = next;
        }

        if empty_grids > 0 {
            log::warn!(
                "{} mixed leaf nodes voxelized to fully free grids; oracle overlap and voxel queries disagree",
                empty_grids,
            );
        }

        let data = OctreeData::from_parts(self.config.clone(), layers, leaves);
        log::info!(
            "Built navigation octree: {} ({:.1} KB) in {:.2?}",
            data.stats(),
            data.memory_usage() as f32 / 1024.0,
            start.elapsed(),
        );
        Ok(data)
    }

    /// Node box grown by the configured clearance
    fn query_box(&self, depth: u8, morton: u64) -> Aabb {
        self.config.node_box(depth, morton).inflated(self.config.clearance)
    }

    fn voxelize<O: OccupancyOracle + ?Sized>(&self, oracle: &O, morton: u64) -> LeafGrid {
        let mut grid = LeafGrid::EMPTY;
        for voxel in 0..LEAF_VOXEL_COUNT {
            let query = self.config.voxel_box(morton, voxel).inflated(self.config.clearance);
            if oracle.overlaps(&query) {
                grid.set_blocked(voxel, true);
            }
        }
        grid
    }
}
