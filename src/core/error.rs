//! Error types for svonav

use glam::Vec3;
use thiserror::Error;

/// Main error type for octree building, path queries and caching
#[derive(Debug, Error)]
pub enum Error {
    /// Bounds, voxel size or depth are inconsistent. Fatal for the build attempt.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Query point lies outside the navigable volume
    #[error("Point {point} is outside the navigation bounds")]
    OutOfBounds { point: Vec3 },

    /// No path exists, or no free cell near start/goal
    #[error("Unreachable: {0}")]
    Unreachable(String),

    /// Cancellation token fired during the search
    #[error("Search aborted after {expanded} expansions")]
    SearchAborted { expanded: usize },

    /// Search gave up at the node budget
    #[error("Search budget exceeded ({expanded} of {limit} nodes expanded)")]
    BudgetExceeded { expanded: usize, limit: usize },

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for the "no path" family: unreachable or budget exhausted.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Unreachable(_) | Error::BudgetExceeded { .. })
    }

    /// True when the search stopped early rather than proving there is no path.
    pub fn gave_up(&self) -> bool {
        matches!(self, Error::BudgetExceeded { .. } | Error::SearchAborted { .. })
    }

    /// Everything except configuration errors may be retried as-is or with
    /// relaxed parameters.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::InvalidConfig(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let budget = Error::BudgetExceeded { expanded: 1, limit: 1 };
        assert!(budget.is_not_found());
        assert!(budget.gave_up());

        let unreachable = Error::Unreachable("walled in".into());
        assert!(unreachable.is_not_found());
        assert!(!unreachable.gave_up());

        let aborted = Error::SearchAborted { expanded: 10 };
        assert!(!aborted.is_not_found());
        assert!(aborted.gave_up());

        assert!(!Error::InvalidConfig("bad".into()).is_recoverable());
        assert!(Error::OutOfBounds { point: Vec3::ZERO }.is_recoverable());
    }

    #[test]
    fn test_display() {
        let err = Error::BudgetExceeded { expanded: 5, limit: 5 };
        assert_eq!(err.to_string(), "Search budget exceeded (5 of 5 nodes expanded)");
    }
}
