//! Greedy string pulling and curve subdivision

use glam::Vec3;

use crate::core::{Error, Result};
use crate::svo::oracle::OccupancyOracle;

/// Removes waypoints that the oracle shows can be skipped
pub struct PathSmoother<'a, O: OccupancyOracle + ?Sized> {
    oracle: &'a O,
}

impl<'a, O: OccupancyOracle + ?Sized> PathSmoother<'a, O> {
    pub fn new(oracle: &'a O) -> Self {
        Self { oracle }
    }

    /// Never returns more points than given; first and last points are kept.
    ///
    /// Fails with `Unreachable` if a raw segment the walk has to keep is
    /// blocked, so no returned segment crosses an obstacle.
    pub fn smooth(&self, points: &[Vec3]) -> Result<Vec<Vec3>> {
        smooth_with(points, |from, to| !self.oracle.segment_blocked(from, to))
    }

    /// Inserts `subdivisions` Catmull-Rom points between consecutive
    /// waypoints. Spans whose curve the oracle reports blocked stay straight.
    pub fn subdivide(&self, points: &[Vec3], subdivisions: u32) -> Vec<Vec3> {
        subdivide_with(points, subdivisions, |from, to| !self.oracle.segment_blocked(from, to))
    }
}

/// From each anchor, jump to the farthest later waypoint with line of sight.
pub fn smooth_with<F>(points: &[Vec3], mut visible: F) -> Result<Vec<Vec3>>
where
    F: FnMut(Vec3, Vec3) -> bool,
{
    if points.len() < 2 {
        return Ok(points.to_vec());
    }

    let last = points.len() - 1;
    let mut out = vec![points[0]];
    let mut anchor = 0;

    while anchor < last {
        let next = (anchor + 1..=last)
            .rev()
            .find(|&candidate| visible(points[anchor], points[candidate]))
            .ok_or_else(|| {
                log::warn!(
                    "Path segment {} -> {} is blocked for the smoother",
                    points[anchor],
                    points[anchor + 1],
                );
                Error::Unreachable(format!(
                    "segment {} -> {} crosses an obstacle",
                    points[anchor],
                    points[anchor + 1]
                ))
            })?;
        out.push(points[next]);
        anchor = next;
    }
    Ok(out)
}

/// Uniform Catmull-Rom subdivision. End tangents reuse the
/// endpoint, so the curve starts and ends at the given waypoints.
pub fn subdivide_with<F>(points: &[Vec3], subdivisions: u32, mut visible: F) -> Vec<Vec3>
where
    F: FnMut(Vec3, Vec3) -> bool,
{
    if subdivisions == 0 || points.len() < 3 {
        return points.to_vec();
    }

    let last = points.len() - 1;
    let mut out = Vec::with_capacity(points.len() + last * subdivisions as usize);
    out.push(points[0]);

    let mut span = Vec::with_capacity(subdivisions as usize + 1);
    for i in 0..last {
        let p0 = points[i.saturating_sub(1)];
        let (p1, p2) = (points[i], points[i + 1]);
        let p3 = points[(i + 2).min(last)];

        span.clear();
        span.extend((1..=subdivisions).map(|k| {
            catmull_rom(p0, p1, p2, p3, k as f32 / (subdivisions + 1) as f32)
        }));
        span.push(p2);

        let mut from = p1;
        let clear = span.iter().all(|&to| {
            let ok = visible(from, to);
            from = to;
            ok
        });
        if clear {
            out.extend_from_slice(&span);
        } else {
            log::debug!("Curve span {} -> {} is blocked; keeping it straight", p1, p2);
            out.push(p2);
        }
    }
    out
}

fn catmull_rom(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Aabb;
    use crate::svo::oracle::ObstacleOracle;

    fn staircase() -> Vec<Vec3> {
        vec![
            Vec3::new(0.5, 0.5, 0.5),
            Vec3::new(1.5, 0.5, 0.5),
            Vec3::new(2.5, 0.5, 0.5),
            Vec3::new(2.5, 1.5, 0.5),
            Vec3::new(2.5, 2.5, 0.5),
            Vec3::new(3.5, 2.5, 0.5),
        ]
    }

    #[test]
    fn test_open_space_collapses_to_endpoints() {
        let oracle = ObstacleOracle::new();
        let raw = staircase();
        let smoothed = PathSmoother::new(&oracle).smooth(&raw).unwrap();
        assert_eq!(smoothed, vec![raw[0], raw[5]]);
    }

    #[test]
    fn test_keeps_corner_around_obstacle() {
        let mut oracle = ObstacleOracle::new();
        oracle.add_box(Aabb::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(2.0, 3.0, 1.0)));
        let raw = staircase();
        let smoothed = PathSmoother::new(&oracle).smooth(&raw).unwrap();

        assert!(smoothed.len() <= raw.len());
        assert!(smoothed.len() > 2);
        assert_eq!(smoothed[0], raw[0]);
        assert_eq!(*smoothed.last().unwrap(), raw[5]);
        for pair in smoothed.windows(2) {
            assert!(!oracle.segment_blocked(pair[0], pair[1]));
        }
    }

    #[test]
    fn test_blocked_raw_segment_is_an_error() {
        let raw = staircase();
        let err = smooth_with(&raw, |_, _| false).unwrap_err();
        assert!(matches!(err, Error::Unreachable(_)));
    }

    #[test]
    fn test_two_point_path_is_checked() {
        let mut oracle = ObstacleOracle::new();
        oracle.add_box(Aabb::new(Vec3::new(4.0, 4.0, 0.0), Vec3::new(8.0, 8.0, 4.0)));
        let smoother = PathSmoother::new(&oracle);

        let blocked = [Vec3::new(15.9, 7.9, 0.1), Vec3::new(4.1, 3.9, 0.1)];
        assert!(smoother.smooth(&blocked).is_err());

        let clear = [Vec3::new(15.9, 1.0, 0.1), Vec3::new(1.0, 1.0, 0.1)];
        assert_eq!(smoother.smooth(&clear).unwrap(), clear.to_vec());
    }

    #[test]
    fn test_short_paths_untouched() {
        let oracle = ObstacleOracle::new();
        let smoother = PathSmoother::new(&oracle);
        assert!(smoother.smooth(&[]).unwrap().is_empty());
        assert_eq!(smoother.smooth(&[Vec3::ONE]).unwrap(), vec![Vec3::ONE]);
    }

    #[test]
    fn test_subdivide_passes_through_waypoints() {
        let oracle = ObstacleOracle::new();
        let corner = [Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), Vec3::new(4.0, 4.0, 0.0)];
        let curve = PathSmoother::new(&oracle).subdivide(&corner, 3);

        assert_eq!(curve.len(), 3 + 2 * 3);
        assert_eq!(curve[0], corner[0]);
        assert_eq!(curve[4], corner[1]);
        assert_eq!(*curve.last().unwrap(), corner[2]);
        // Curve points bend away from the straight legs
        assert!(curve[1..4].iter().any(|p| p.y.abs() > 1e-3));
    }

    #[test]
    fn test_subdivide_keeps_blocked_span_straight() {
        let mut oracle = ObstacleOracle::new();
        // Just below the first leg, where its curve dips to y < 0
        oracle.add_box(Aabb::new(Vec3::new(2.0, -0.5, -1.0), Vec3::new(3.6, -0.1, 1.0)));
        let corner = [Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), Vec3::new(4.0, 4.0, 0.0)];
        let curve = PathSmoother::new(&oracle).subdivide(&corner, 4);

        // First span straight, second span curved
        assert_eq!(curve.len(), 3 + 4);
        assert_eq!(curve[0], corner[0]);
        assert_eq!(curve[1], corner[1]);
        assert_eq!(*curve.last().unwrap(), corner[2]);
        for pair in curve.windows(2) {
            assert!(!oracle.segment_blocked(pair[0], pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_subdivide_zero_is_identity() {
        let raw = staircase();
        assert_eq!(subdivide_with(&raw, 0, |_, _| true), raw);
    }
}
