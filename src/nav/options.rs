//! Path request parameters

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::svo::neighbors::Connectivity;
use super::cost::{Heuristic, TraversalCost};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchAlgorithm {
    /// Best-first over cell centres
    #[default]
    AStar,
    /// Any-angle: re-parents through the predecessor when the octree shows
    /// line of sight
    ThetaStar,
    /// Theta* that assumes line of sight when relaxing and verifies it once
    /// per expansion, repairing the parent from closed neighbours on failure
    LazyThetaStar,
}

/// Upper bound for `snap_radius_voxels`
pub const MAX_SNAP_RADIUS_VOXELS: u32 = 32;

/// Upper bound for `smoothing_subdivisions`
pub const MAX_SMOOTHING_SUBDIVISIONS: u32 = 32;

/// Tuning for a single search
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathOptions {
    /// 26-connected instead of 6-connected moves
    pub use_diagonals: bool,
    /// Give up with `BudgetExceeded` after this many expansions
    pub max_search_nodes: usize,
    pub algorithm: SearchAlgorithm,
    pub heuristic: Heuristic,
    /// Multiplier on the heuristic; above 1 trades optimality for speed
    pub heuristic_scale: f32,
    pub cost: TraversalCost,
    /// Scale priorities down for coarse cells so large free nodes are expanded first
    pub node_size_compensation: bool,
    /// How far (in voxels) to look for a free cell when start or goal is blocked
    pub snap_radius_voxels: u32,
    /// Poll the cancellation token every N expansions
    pub cancel_check_interval: usize,
    /// String-pull the raw path against the oracle
    pub smooth: bool,
    /// Curve points inserted between consecutive smoothed waypoints (0 keeps
    /// the polyline)
    pub smoothing_subdivisions: u32,
    /// Return a straight segment when start and goal see each other
    pub direct_shortcut: bool,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            use_diagonals: false,
            max_search_nodes: 100_000,
            algorithm: SearchAlgorithm::AStar,
            heuristic: Heuristic::Euclidean,
            heuristic_scale: 1.0,
            cost: TraversalCost::Distance,
            node_size_compensation: false,
            snap_radius_voxels: 4,
            cancel_check_interval: 64,
            smooth: true,
            smoothing_subdivisions: 0,
            direct_shortcut: true,
        }
    }
}

impl PathOptions {
    pub fn connectivity(&self) -> Connectivity {
        if self.use_diagonals { Connectivity::Full26 } else { Connectivity::Faces6 }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.heuristic_scale.is_finite() && self.heuristic_scale >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "heuristic scale must be non-negative, got {}", self.heuristic_scale
            )));
        }
        if let TraversalCost::Fixed(cost) = self.cost {
            if !(cost.is_finite() && cost >= 0.0) {
                return Err(Error::InvalidConfig(format!("fixed edge cost must be non-negative, got {}", cost)));
            }
        }
        if self.snap_radius_voxels > MAX_SNAP_RADIUS_VOXELS {
            return Err(Error::InvalidConfig(format!(
                "snap radius {} exceeds {} voxels", self.snap_radius_voxels, MAX_SNAP_RADIUS_VOXELS
            )));
        }
        if self.smoothing_subdivisions > MAX_SMOOTHING_SUBDIVISIONS {
            return Err(Error::InvalidConfig(format!(
                "smoothing subdivisions {} exceeds {}", self.smoothing_subdivisions, MAX_SMOOTHING_SUBDIVISIONS
            )));
        }
        Ok(())
    }
}

/// Cooperative cancellation flag shared between the caller and a search
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A start/goal pair with its options
#[derive(Clone, Debug)]
pub struct PathRequest {
    pub start: Vec3,
    pub goal: Vec3,
    pub options: PathOptions,
    pub cancel: Option<CancellationToken>,
}

impl PathRequest {
    pub fn new(start: Vec3, goal: Vec3) -> Self {
        Self { start, goal, options: PathOptions::default(), cancel: None }
    }

    pub fn with_options(mut self, options: PathOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_options_json() {
        let options: PathOptions = serde_json::from_str(
            r#"{"use_diagonals": true, "algorithm": "theta_star", "max_search_nodes": 50}"#,
        )
        .unwrap();
        assert_eq!(options.connectivity(), Connectivity::Full26);
        assert_eq!(options.algorithm, SearchAlgorithm::ThetaStar);
        assert_eq!(options.max_search_nodes, 50);
        assert!(options.smooth);
    }

    #[test]
    fn test_validate() {
        assert!(PathOptions::default().validate().is_ok());
        let bad = PathOptions { heuristic_scale: -1.0, ..Default::default() };
        assert!(bad.validate().is_err());
        let bad = PathOptions { cost: TraversalCost::Fixed(f32::NAN), ..Default::default() };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_validate_caps_snap_radius() {
        let at_cap = PathOptions { snap_radius_voxels: MAX_SNAP_RADIUS_VOXELS, ..Default::default() };
        assert!(at_cap.validate().is_ok());
        let huge = PathOptions { snap_radius_voxels: 50_000, ..Default::default() };
        assert!(matches!(huge.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_caps_subdivisions() {
        let bad = PathOptions { smoothing_subdivisions: MAX_SMOOTHING_SUBDIVISIONS + 1, ..Default::default() };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_lazy_theta_from_json() {
        let options: PathOptions = serde_json::from_str(r#"{"algorithm": "lazy_theta_star"}"#).unwrap();
        assert_eq!(options.algorithm, SearchAlgorithm::LazyThetaStar);
    }
}
