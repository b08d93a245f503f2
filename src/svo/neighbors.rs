//! Adjacency over the implicit octree graph.
//!
//! Neighbours are computed from Morton arithmetic alone: step the cell
//! coordinates, climb to the common ancestor of the two codes and descend
//! towards the target. A coarser Free node answers for all the fine cells it
//! covers; a same-size mixed node is expanded into every Free descendant
//! (or free voxel) on the face that borders the query cell.

use std::sync::LazyLock;

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::math::morton::{decode_coords, encode_in_grid};
use super::address::NavAddress;
use super::data::OctreeData;
use super::leaf::{LeafGrid, LEAF_RESOLUTION};
use super::node::NodeState;

/// Which cells count as adjacent
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// Shared faces only
    #[default]
    Faces6,
    /// Faces, edges and corners
    Full26,
}

pub const FACE_DIRECTIONS: [IVec3; 6] = [
    IVec3::X, IVec3::NEG_X,
    IVec3::Y, IVec3::NEG_Y,
    IVec3::Z, IVec3::NEG_Z,
];

static ALL_DIRECTIONS: LazyLock<Vec<IVec3>> = LazyLock::new(|| {
    let mut dirs = Vec::with_capacity(26);
    for z in -1..=1 {
        for y in -1..=1 {
            for x in -1..=1 {
                if (x, y, z) != (0, 0, 0) {
                    dirs.push(IVec3::new(x, y, z));
                }
            }
        }
    }
    dirs
});

impl Connectivity {
    pub fn directions(&self) -> &'static [IVec3] {
        match self {
            Connectivity::Faces6 => &FACE_DIRECTIONS,
            Connectivity::Full26 => ALL_DIRECTIONS.as_slice(),
        }
    }
}

/// An edge of the search graph
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NeighborLink {
    pub address: NavAddress,
    /// Distance between the two cell centres
    pub cost: f32,
}

fn is_diagonal(dir: IVec3) -> bool {
    dir.abs().element_sum() > 1
}

/// Child slots on the face entered when travelling along axis-aligned `dir`
fn entry_face_slots(dir: IVec3) -> impl Iterator<Item = u8> {
    let axis = if dir.x != 0 { 0 } else if dir.y != 0 { 1 } else { 2 };
    let bit = if dir[axis] > 0 { 0 } else { 1 };
    (0..8u8).filter(move |slot| (slot >> axis) & 1 == bit)
}

/// Axis-aligned sub-steps of a diagonal step (the cells a diagonal move
/// squeezes past)
fn corner_steps(dir: IVec3) -> impl Iterator<Item = IVec3> {
    (1u8..7).filter_map(move |mask| {
        let step = IVec3::new(
            if mask & 1 != 0 { dir.x } else { 0 },
            if mask & 2 != 0 { dir.y } else { 0 },
            if mask & 4 != 0 { dir.z } else { 0 },
        );
        (step != IVec3::ZERO && step != dir).then_some(step)
    })
}

/// Computes neighbours of cells in one octree snapshot
pub struct NeighborResolver<'a> {
    data: &'a OctreeData,
    connectivity: Connectivity,
}

impl<'a> NeighborResolver<'a> {
    pub fn new(data: &'a OctreeData, connectivity: Connectivity) -> Self {
        Self { data, connectivity }
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    pub fn neighbors(&self, address: NavAddress) -> Vec<NeighborLink> {
        let mut out = Vec::new();
        self.neighbors_into(address, &mut out);
        out
    }

    /// Fill `out` with the traversable neighbours of `address`, sorted by address.
    ///
    /// Blocked cells, mixed nodes and out-of-bounds cells never appear. A
    /// non-traversable `address` has no neighbours.
    pub fn neighbors_into(&self, address: NavAddress, out: &mut Vec<NeighborLink>) {
        out.clear();
        if !self.data.is_traversable(address) {
            return;
        }

        let center = self.data.address_center(address);
        match address.voxel {
            Some(voxel) => self.voxel_neighbors(address, voxel, center, out),
            None => self.node_neighbors(address, center, out),
        }

        out.sort_by(|a, b| a.address.cmp(&b.address));
        out.dedup_by_key(|link| link.address);
    }

    fn push(&self, from: Vec3, address: NavAddress, out: &mut Vec<NeighborLink>) {
        let cost = from.distance(self.data.address_center(address));
        out.push(NeighborLink { address, cost });
    }

    fn node_neighbors(&self, address: NavAddress, center: Vec3, out: &mut Vec<NeighborLink>) {
        let depth = address.layer;
        let resolution = 1u32 << depth;
        let coords = decode_coords(address.morton).as_ivec3();

        for &dir in self.connectivity.directions() {
            let Some(code) = encode_in_grid(coords + dir, resolution) else {
                continue;
            };
            let diagonal = is_diagonal(dir);
            if diagonal && !self.node_corners_open(address, coords, dir) {
                continue;
            }
            let Some((layer, index)) = self.data.resolve_cell(depth, address.morton, code) else {
                continue;
            };
            let Some(node) = self.data.node_at(layer, index) else {
                continue;
            };

            match node.state() {
                NodeState::Blocked => {}
                NodeState::Free => {
                    // Diagonals only connect cells of equal size
                    if !diagonal || layer == depth {
                        self.push(center, NavAddress::node(layer, node.morton), out);
                    }
                }
                NodeState::HasChildren => {
                    if !diagonal {
                        self.collect_face(layer, index, dir, center, out);
                    }
                }
            }
        }
    }

    /// Every Free descendant or free voxel of a mixed node on the face entered along `dir`
    fn collect_face(&self, layer: u8, index: usize, dir: IVec3, from: Vec3, out: &mut Vec<NeighborLink>) {
        let mut stack = vec![(layer, index)];
        while let Some((layer, index)) = stack.pop() {
            let Some(node) = self.data.node_at(layer, index) else {
                continue;
            };
            match node.state() {
                NodeState::Free => self.push(from, NavAddress::node(layer, node.morton), out),
                NodeState::Blocked => {}
                NodeState::HasChildren => {
                    if let Some(grid) = self.data.leaf_grid(layer, node) {
                        for voxel in grid.free_entry_face(dir) {
                            self.push(from, NavAddress::voxel(layer, node.morton, voxel), out);
                        }
                    } else {
                        stack.extend(
                            entry_face_slots(dir)
                                .filter_map(|slot| node.child_index(slot))
                                .map(|child| (layer + 1, child)),
                        );
                    }
                }
            }
        }
    }

    /// A node-level diagonal is allowed only if every cell it squeezes past is
    /// covered by a Free node.
    fn node_corners_open(&self, address: NavAddress, coords: IVec3, dir: IVec3) -> bool {
        let resolution = 1u32 << address.layer;
        corner_steps(dir).all(|step| {
            encode_in_grid(coords + step, resolution)
                .and_then(|code| self.data.resolve_cell(address.layer, address.morton, code))
                .and_then(|(layer, index)| self.data.node_at(layer, index))
                .is_some_and(|node| node.is_free())
        })
    }

    fn voxel_neighbors(&self, address: NavAddress, voxel: u8, center: Vec3, out: &mut Vec<NeighborLink>) {
        let node_coords = decode_coords(address.morton).as_ivec3();
        let local = LeafGrid::voxel_coords(voxel).as_ivec3();
        let global = node_coords * LEAF_RESOLUTION as i32 + local;

        for &dir in self.connectivity.directions() {
            let diagonal = is_diagonal(dir);
            if diagonal && !corner_steps(dir).all(|step| self.voxel_target(address, global + step).is_some()) {
                continue;
            }
            let Some(target) = self.voxel_target(address, global + dir) else {
                continue;
            };
            if diagonal && !target.is_voxel() {
                continue;
            }
            self.push(center, target, out);
        }
    }

    /// Traversable cell covering voxel-grid coordinate `target`, if any
    fn voxel_target(&self, from: NavAddress, target: IVec3) -> Option<NavAddress> {
        let max_depth = self.data.max_depth();
        let total = self.data.config().voxels_per_axis() as i32;
        if target.cmplt(IVec3::ZERO).any() || target.cmpge(IVec3::splat(total)).any() {
            return None;
        }

        let leaf = LEAF_RESOLUTION as i32;
        let cell = target / leaf;
        let local = target - cell * leaf;
        let code = encode_in_grid(cell, 1u32 << max_depth)?;
        let (layer, index) = self.data.resolve_cell(max_depth, from.morton, code)?;
        let node = self.data.node_at(layer, index)?;

        match node.state() {
            NodeState::Free => Some(NavAddress::node(layer, node.morton)),
            NodeState::Blocked => None,
            NodeState::HasChildren => {
                let grid = self.data.leaf_grid(layer, node)?;
                let voxel = LeafGrid::voxel_index(local.as_uvec3());
                grid.is_free(voxel).then_some(NavAddress::voxel(layer, node.morton, voxel))
            }
        }
    }
}
