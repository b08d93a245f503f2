//! Sparse voxel octree navigation data
//!
//! Layered, pointerless octree: every depth is a flat array of nodes sorted
//! by Morton code, mixed nodes at the deepest layer own a 4x4x4 leaf grid.

pub mod address;
pub mod builder;
pub mod config;
pub mod data;
pub mod debug;
pub mod layer;
pub mod leaf;
pub mod neighbors;
pub mod node;
pub mod oracle;
pub mod snapshot;

pub use address::NavAddress;
pub use builder::OctreeBuilder;
pub use config::BuildConfig;
pub use data::{OctreeData, OctreeStats};
pub use debug::{CellState, DebugCell, DebugDrawSink};
pub use layer::OctreeLayer;
pub use leaf::LeafGrid;
pub use neighbors::{Connectivity, NeighborLink, NeighborResolver};
pub use node::{NodeState, OctreeNode};
pub use oracle::{CompositeOracle, Obstacle, ObstacleOracle, OccupancyOracle, RegionHint};
pub use snapshot::NavDataHandle;
