//! Path queries over navigation snapshots

pub mod cost;
pub mod options;
pub mod path;
pub mod pathfinder;
pub mod query;
pub mod raycast;
pub mod smoother;

pub use cost::{Heuristic, TraversalCost};
pub use options::{CancellationToken, PathOptions, PathRequest, SearchAlgorithm};
pub use path::NavPath;
pub use pathfinder::{AddressPath, PathFinder, RawPath, SearchStats};
pub use query::NavQuery;
pub use raycast::OctreeRaycaster;
pub use smoother::PathSmoother;
