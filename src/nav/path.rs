//! Final path handed to the caller

use glam::Vec3;

use crate::svo::address::NavAddress;
use crate::svo::debug::DebugDrawSink;
use super::pathfinder::{RawPath, SearchStats};

/// Waypoints from start to goal plus the cells the search went through
#[derive(Clone, Debug, PartialEq)]
pub struct NavPath {
    pub waypoints: Vec<Vec3>,
    /// Cells of the raw search path (empty for a direct segment)
    pub addresses: Vec<NavAddress>,
    pub stats: SearchStats,
    /// String pulling was applied
    pub smoothed: bool,
}

impl NavPath {
    /// Straight segment, no search involved
    pub fn direct(start: Vec3, goal: Vec3) -> Self {
        Self {
            waypoints: vec![start, goal],
            addresses: Vec::new(),
            stats: SearchStats::default(),
            smoothed: false,
        }
    }

    pub fn from_raw(raw: RawPath, waypoints: Vec<Vec3>, smoothed: bool) -> Self {
        Self { waypoints, addresses: raw.addresses, stats: raw.stats, smoothed }
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn is_direct(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn start(&self) -> Option<Vec3> {
        self.waypoints.first().copied()
    }

    pub fn end(&self) -> Option<Vec3> {
        self.waypoints.last().copied()
    }

    pub fn segment_lengths(&self) -> Vec<f32> {
        self.waypoints.windows(2).map(|w| w[0].distance(w[1])).collect()
    }

    /// Total polyline length
    pub fn length(&self) -> f32 {
        self.remaining_length(0)
    }

    /// Length still to travel from waypoint `index` to the end
    pub fn remaining_length(&self, index: usize) -> f32 {
        self.waypoints
            .get(index..)
            .map_or(0.0, |rest| rest.windows(2).map(|w| w[0].distance(w[1])).sum())
    }

    pub fn draw(&self, sink: &mut dyn DebugDrawSink) {
        for pair in self.waypoints.windows(2) {
            sink.draw_segment(pair[0], pair[1]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svo::debug::DebugCell;

    #[derive(Default)]
    struct Segments(Vec<(Vec3, Vec3)>);

    impl DebugDrawSink for Segments {
        fn draw_cell(&mut self, _cell: &DebugCell) {}

        fn draw_segment(&mut self, from: Vec3, to: Vec3) {
            self.0.push((from, to));
        }
    }

    #[test]
    fn test_lengths() {
        let path = NavPath {
            waypoints: vec![Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0), Vec3::new(3.0, 4.0, 0.0)],
            addresses: vec![NavAddress::node(0, 0)],
            stats: SearchStats::default(),
            smoothed: true,
        };
        assert_eq!(path.segment_lengths(), vec![3.0, 4.0]);
        assert_eq!(path.length(), 7.0);
        assert_eq!(path.remaining_length(1), 4.0);
        assert_eq!(path.remaining_length(2), 0.0);
        assert_eq!(path.remaining_length(10), 0.0);
        assert!(!path.is_direct());
    }

    #[test]
    fn test_direct_and_draw() {
        let path = NavPath::direct(Vec3::ZERO, Vec3::ONE);
        assert!(path.is_direct());
        assert_eq!(path.start(), Some(Vec3::ZERO));
        assert_eq!(path.end(), Some(Vec3::ONE));

        let mut sink = Segments::default();
        path.draw(&mut sink);
        assert_eq!(sink.0, vec![(Vec3::ZERO, Vec3::ONE)]);
    }
}
