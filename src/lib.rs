//! Svonav - sparse voxel octree navigation for flying and swimming agents

pub mod core;
pub mod math;
pub mod svo;
pub mod nav;
pub mod cache;

pub use crate::core::{Error, Result};
pub use nav::{NavPath, NavQuery, PathOptions, PathRequest};
pub use svo::{BuildConfig, OccupancyOracle, OctreeBuilder, OctreeData};
