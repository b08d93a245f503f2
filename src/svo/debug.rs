//! Read-only visualization feed

use glam::Vec3;

use crate::math::Aabb;
use super::address::NavAddress;
use super::data::OctreeData;
use super::leaf::LEAF_VOXEL_COUNT;
use super::node::NodeState;

/// Occupancy of a drawable cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellState {
    Free,
    Blocked,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DebugCell {
    pub address: NavAddress,
    pub aabb: Aabb,
    pub state: CellState,
}

/// Receiver for debug geometry
pub trait DebugDrawSink {
    fn draw_cell(&mut self, cell: &DebugCell);

    fn draw_segment(&mut self, _from: Vec3, _to: Vec3) {}
}

/// Lazy walk over every Free/Blocked node and every leaf voxel, layer by layer
pub struct DebugCells<'a> {
    data: &'a OctreeData,
    layer: usize,
    index: usize,
    voxel: u8,
}

impl<'a> DebugCells<'a> {
    pub fn new(data: &'a OctreeData) -> Self {
        Self { data, layer: 0, index: 0, voxel: 0 }
    }
}

impl Iterator for DebugCells<'_> {
    type Item = DebugCell;

    fn next(&mut self) -> Option<DebugCell> {
        loop {
            let layer = self.data.layers().get(self.layer)?;
            let Some(node) = layer.get(self.index) else {
                self.layer += 1;
                self.index = 0;
                continue;
            };
            let depth = self.layer as u8;

            match node.state() {
                NodeState::Free | NodeState::Blocked => {
                    self.index += 1;
                    let address = NavAddress::node(depth, node.morton);
                    let state = if node.is_free() { CellState::Free } else { CellState::Blocked };
                    return Some(DebugCell { address, aabb: self.data.address_box(address), state });
                }
                NodeState::HasChildren => {
                    let Some(grid) = self.data.leaf_grid(depth, node) else {
                        self.index += 1;
                        continue;
                    };
                    let voxel = self.voxel;
                    self.voxel += 1;
                    if self.voxel >= LEAF_VOXEL_COUNT {
                        self.voxel = 0;
                        self.index += 1;
                    }
                    let address = NavAddress::voxel(depth, node.morton, voxel);
                    let state = if grid.is_free(voxel) { CellState::Free } else { CellState::Blocked };
                    return Some(DebugCell { address, aabb: self.data.address_box(address), state });
                }
            }
        }
    }
}

impl OctreeData {
    pub fn debug_cells(&self) -> DebugCells<'_> {
        DebugCells::new(self)
    }

    /// Feed every cell to `sink`, optionally only blocked ones
    pub fn draw(&self, sink: &mut dyn DebugDrawSink, blocked_only: bool) {
        for cell in self.debug_cells() {
            if !blocked_only || cell.state == CellState::Blocked {
                sink.draw_cell(&cell);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svo::builder::OctreeBuilder;
    use crate::svo::config::BuildConfig;
    use crate::svo::oracle::ObstacleOracle;

    #[derive(Default)]
    struct Recorder {
        cells: Vec<DebugCell>,
    }

    impl DebugDrawSink for Recorder {
        fn draw_cell(&mut self, cell: &DebugCell) {
            self.cells.push(*cell);
        }
    }

    #[test]
    fn test_cells_cover_all_voxels() {
        let config = BuildConfig::for_volume(Vec3::splat(4.0), 4.0, 1.0).unwrap();
        let mut oracle = ObstacleOracle::new();
        oracle.add_box(Aabb::new(Vec3::splat(3.0), Vec3::splat(5.0)));
        let data = OctreeBuilder::new(config).unwrap().build(&oracle).unwrap();

        let cells: Vec<_> = data.debug_cells().collect();
        assert_eq!(cells.len(), 8 * 64);
        assert_eq!(cells.iter().filter(|c| c.state == CellState::Blocked).count(), 8);
        let volume: f32 = cells.iter().map(|c| c.aabb.size().x.powi(3)).sum();
        assert!((volume - 512.0).abs() < 1e-3);

        let mut recorder = Recorder::default();
        data.draw(&mut recorder, true);
        assert_eq!(recorder.cells.len(), 8);
        assert!(recorder.cells.iter().all(|c| c.aabb.overlaps(&Aabb::new(Vec3::splat(3.0), Vec3::splat(5.0)))));
    }

    #[test]
    fn test_mixed_depths() {
        let config = BuildConfig::for_volume(Vec3::splat(8.0), 8.0, 1.0).unwrap();
        let mut oracle = ObstacleOracle::new();
        oracle.add_box(Aabb::new(Vec3::splat(1.0), Vec3::splat(2.0)));
        let data = OctreeBuilder::new(config).unwrap().build(&oracle).unwrap();

        // 7 free octants, 7 free depth-2 cells, one leaf grid
        let cells: Vec<_> = data.debug_cells().collect();
        assert_eq!(cells.len(), 7 + 7 + 64);
        let volume: f32 = cells.iter().map(|c| c.aabb.size().x.powi(3)).sum();
        assert!((volume - 4096.0).abs() < 1e-2);
    }
}
