//! One-stop path queries over a navigation snapshot

use std::sync::Arc;

use glam::Vec3;
use rayon::prelude::*;

use crate::core::{Error, Result};
use crate::svo::data::OctreeData;
use crate::svo::oracle::OccupancyOracle;
use crate::svo::snapshot::NavDataHandle;
use super::options::PathRequest;
use super::path::NavPath;
use super::pathfinder::PathFinder;
use super::raycast::OctreeRaycaster;
use super::smoother::PathSmoother;

/// Pairs a snapshot with the oracle used to validate smoothed paths.
///
/// Holds its own `Arc` to the snapshot, so a rebuild published meanwhile does
/// not affect queries already issued through this value.
#[derive(Clone)]
pub struct NavQuery {
    data: Arc<OctreeData>,
    oracle: Arc<dyn OccupancyOracle>,
}

impl NavQuery {
    pub fn new(data: Arc<OctreeData>, oracle: Arc<dyn OccupancyOracle>) -> Self {
        Self { data, oracle }
    }

    /// Query against the handle's current snapshot
    pub fn from_handle(handle: &NavDataHandle, oracle: Arc<dyn OccupancyOracle>) -> Self {
        Self::new(handle.snapshot(), oracle)
    }

    pub fn data(&self) -> &Arc<OctreeData> {
        &self.data
    }

    /// Bounds check, direct line of sight, search, then optional smoothing
    pub fn find_path(&self, request: &PathRequest) -> Result<NavPath> {
        let options = &request.options;
        let bounds = self.data.bounds();
        for point in [request.start, request.goal] {
            if !bounds.contains_point(point) {
                return Err(Error::OutOfBounds { point });
            }
        }

        if options.direct_shortcut && self.has_direct_line(request) {
            log::debug!("Direct path {} -> {}", request.start, request.goal);
            return Ok(NavPath::direct(request.start, request.goal));
        }

        let mut finder = PathFinder::new(&self.data, options);
        if let Some(token) = &request.cancel {
            finder = finder.with_cancellation(token);
        }
        let raw = finder.find_path(request.start, request.goal)?;

        let smoother = PathSmoother::new(self.oracle.as_ref());
        let mut waypoints = if options.smooth {
            smoother.smooth(&raw.points)?
        } else {
            raw.points.clone()
        };
        if options.smoothing_subdivisions > 0 {
            waypoints = smoother.subdivide(&waypoints, options.smoothing_subdivisions);
        }
        Ok(NavPath::from_raw(raw, waypoints, options.smooth))
    }

    /// Run independent requests in parallel; results keep the request order
    pub fn find_paths(&self, requests: &[PathRequest]) -> Vec<Result<NavPath>> {
        requests.par_iter().map(|request| self.find_path(request)).collect()
    }

    fn has_direct_line(&self, request: &PathRequest) -> bool {
        let traversable = |point: Vec3| {
            self.data
                .locate(point)
                .is_ok_and(|address| self.data.is_traversable(address))
        };
        traversable(request.start)
            && traversable(request.goal)
            && OctreeRaycaster::new(&self.data).is_clear(request.start, request.goal)
            && !self.oracle.segment_blocked(request.start, request.goal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Aabb;
    use crate::nav::options::{CancellationToken, PathOptions};
    use crate::svo::builder::OctreeBuilder;
    use crate::svo::config::BuildConfig;
    use crate::svo::oracle::ObstacleOracle;

    fn center_block() -> ObstacleOracle {
        let mut oracle = ObstacleOracle::new();
        oracle.add_box(Aabb::new(Vec3::splat(3.0), Vec3::splat(5.0)));
        oracle
    }

    fn scenario() -> NavQuery {
        let config = BuildConfig::for_volume(Vec3::splat(4.0), 4.0, 1.0).unwrap();
        let oracle = center_block();
        let data = OctreeBuilder::new(config).unwrap().build(&oracle).unwrap();
        NavQuery::new(Arc::new(data), Arc::new(oracle))
    }

    #[test]
    fn test_corner_to_corner_goes_around() {
        let query = scenario();
        let start = Vec3::ZERO;
        let goal = Vec3::splat(8.0);
        let path = query.find_path(&PathRequest::new(start, goal)).unwrap();

        assert!(!path.is_direct());
        assert!(path.smoothed);
        assert_eq!(path.start(), Some(start));
        assert_eq!(path.end(), Some(goal));
        assert!(path.length() > start.distance(goal));

        let oracle = center_block();
        for pair in path.waypoints.windows(2) {
            assert!(!oracle.segment_blocked(pair[0], pair[1]));
        }
    }

    #[test]
    fn test_no_segment_crosses_obstacle_near_wall() {
        // Start and goal sit in free cells whose straight join clips the box
        let config = BuildConfig::for_volume(Vec3::splat(8.0), 8.0, 1.0).unwrap();
        let mut oracle = ObstacleOracle::new();
        oracle.add_box(Aabb::new(Vec3::new(4.0, 4.0, 0.0), Vec3::new(8.0, 8.0, 4.0)));
        let data = OctreeBuilder::new(config).unwrap().build(&oracle).unwrap();
        let query = NavQuery::new(Arc::new(data), Arc::new(oracle.clone()));
        let (start, goal) = (Vec3::new(15.9, 7.9, 0.1), Vec3::new(4.1, 3.9, 0.1));

        for smooth in [false, true] {
            let options = PathOptions { smooth, ..Default::default() };
            let path = query.find_path(&PathRequest::new(start, goal).with_options(options)).unwrap();
            assert_eq!(path.start(), Some(start));
            assert_eq!(path.end(), Some(goal));
            assert!(path.len() > 2, "smooth={} gave {:?}", smooth, path.waypoints);
            for pair in path.waypoints.windows(2) {
                assert!(!oracle.segment_blocked(pair[0], pair[1]), "{} -> {}", pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn test_curve_subdivision_stays_clear() {
        let query = scenario();
        let plain = query.find_path(&PathRequest::new(Vec3::ZERO, Vec3::splat(8.0))).unwrap();
        let options = PathOptions { smoothing_subdivisions: 3, ..Default::default() };
        let curved = query
            .find_path(&PathRequest::new(Vec3::ZERO, Vec3::splat(8.0)).with_options(options))
            .unwrap();

        assert!(curved.len() > plain.len());
        assert_eq!(curved.start(), plain.start());
        assert_eq!(curved.end(), plain.end());
        let oracle = center_block();
        for pair in curved.waypoints.windows(2) {
            assert!(!oracle.segment_blocked(pair[0], pair[1]));
        }
    }

    #[test]
    fn test_smoothing_never_adds_waypoints() {
        let query = scenario();
        let raw_options = PathOptions { smooth: false, ..Default::default() };
        let raw = query
            .find_path(&PathRequest::new(Vec3::ZERO, Vec3::splat(8.0)).with_options(raw_options))
            .unwrap();
        let smoothed = query.find_path(&PathRequest::new(Vec3::ZERO, Vec3::splat(8.0))).unwrap();
        assert!(smoothed.len() <= raw.len());
        assert!(smoothed.length() <= raw.length() + 1e-4);
    }

    #[test]
    fn test_direct_shortcut() {
        let query = scenario();
        let path = query.find_path(&PathRequest::new(Vec3::splat(0.5), Vec3::new(7.5, 0.5, 0.5))).unwrap();
        assert!(path.is_direct());
        assert_eq!(path.len(), 2);

        let no_shortcut = PathOptions { direct_shortcut: false, smooth: false, ..Default::default() };
        let path = query
            .find_path(&PathRequest::new(Vec3::splat(0.5), Vec3::new(7.5, 0.5, 0.5)).with_options(no_shortcut))
            .unwrap();
        assert!(!path.is_direct());
        assert_eq!(path.addresses.len(), 8);
    }

    #[test]
    fn test_out_of_bounds_goal() {
        let query = scenario();
        let err = query.find_path(&PathRequest::new(Vec3::ONE, Vec3::new(1.0, 9.0, 1.0))).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { .. }));
    }

    #[test]
    fn test_cancellation_token_reaches_search() {
        let query = scenario();
        let token = CancellationToken::new();
        token.cancel();
        let err = query
            .find_path(&PathRequest::new(Vec3::ZERO, Vec3::splat(8.0)).with_cancellation(token))
            .unwrap_err();
        assert!(matches!(err, Error::SearchAborted { .. }));
    }

    #[test]
    fn test_batch_preserves_order() {
        let query = scenario();
        let requests = vec![
            PathRequest::new(Vec3::ZERO, Vec3::splat(8.0)),
            PathRequest::new(Vec3::ONE, Vec3::new(-1.0, 0.0, 0.0)),
            PathRequest::new(Vec3::splat(0.5), Vec3::new(0.5, 7.5, 0.5)),
        ];
        let results = query.find_paths(&requests);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(Error::OutOfBounds { .. })));
        assert!(results[2].as_ref().unwrap().is_direct());
    }
}
