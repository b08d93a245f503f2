//! Occupancy queries against world geometry.
//!
//! The builder and the path smoother only ever talk to geometry through
//! [`OccupancyOracle`]. Implementations must be safe to call from several
//! threads at once; the builder classifies whole layers in parallel.

use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::math::Aabb;
use crate::math::ray::{segment_intersects_aabb, segment_point_distance};

/// Pieces the default segment test splits a segment into at most
const BISECTION_SEGMENTS: f32 = 1024.0;
const MIN_BISECTION_LENGTH: f32 = 1e-4;

/// Hint for the octree builder about a region's content
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionHint {
    /// Nothing blocks the region
    Empty,
    /// The whole region is blocked
    Solid,
    /// Partially blocked - subdivide or voxelize
    Mixed,
    /// Classification unavailable - treated like Mixed
    Unknown,
}

impl RegionHint {
    /// Returns true if this region can be decided without subdividing
    pub fn is_terminal(&self) -> bool {
        matches!(self, RegionHint::Empty | RegionHint::Solid)
    }

    /// Returns true if this region needs subdivision
    pub fn needs_subdivision(&self) -> bool {
        matches!(self, RegionHint::Mixed | RegionHint::Unknown)
    }
}

/// Read-only collision queries supplied by the host world.
pub trait OccupancyOracle: Send + Sync {
    /// True if any geometry shares volume with the box. Touching faces do not count.
    fn overlaps(&self, aabb: &Aabb) -> bool;

    /// Classify a region for early-out during the build.
    ///
    /// The default never reports `Solid`, so fully enclosed regions are
    /// voxelized instead of collapsed; override it when containment is cheap.
    fn classify(&self, aabb: &Aabb) -> RegionHint {
        if self.overlaps(aabb) { RegionHint::Mixed } else { RegionHint::Empty }
    }

    /// True if the closed segment touches geometry.
    ///
    /// The default bisects the segment's bounding box down to a fixed fraction
    /// of its length and reports blocked at that floor.
    fn segment_blocked(&self, from: Vec3, to: Vec3) -> bool {
        segment_blocked_by_bisection(self, from, to)
    }
}

/// Segment test built from box overlap queries alone
pub fn segment_blocked_by_bisection<O: OccupancyOracle + ?Sized>(oracle: &O, from: Vec3, to: Vec3) -> bool {
    let floor = (from.distance(to) / BISECTION_SEGMENTS).max(MIN_BISECTION_LENGTH);
    let pad = floor * 0.5;
    let mut stack = vec![(from, to)];

    while let Some((a, b)) = stack.pop() {
        let bbox = Aabb::new(a.min(b), a.max(b)).inflated(pad);
        if !oracle.overlaps(&bbox) {
            continue;
        }
        if a.distance(b) <= floor {
            return true;
        }
        let mid = (a + b) * 0.5;
        stack.push((mid, b));
        stack.push((a, mid));
    }
    false
}

impl<O: OccupancyOracle + ?Sized> OccupancyOracle for Arc<O> {
    fn overlaps(&self, aabb: &Aabb) -> bool {
        (**self).overlaps(aabb)
    }

    fn classify(&self, aabb: &Aabb) -> RegionHint {
        (**self).classify(aabb)
    }

    fn segment_blocked(&self, from: Vec3, to: Vec3) -> bool {
        (**self).segment_blocked(from, to)
    }
}

impl<O: OccupancyOracle + ?Sized> OccupancyOracle for Box<O> {
    fn overlaps(&self, aabb: &Aabb) -> bool {
        (**self).overlaps(aabb)
    }

    fn classify(&self, aabb: &Aabb) -> RegionHint {
        (**self).classify(aabb)
    }

    fn segment_blocked(&self, from: Vec3, to: Vec3) -> bool {
        (**self).segment_blocked(from, to)
    }
}

/// Primitive obstacle shape
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Obstacle {
    Box { min: [f32; 3], max: [f32; 3] },
    Sphere { center: [f32; 3], radius: f32 },
}

impl Obstacle {
    pub fn from_aabb(aabb: Aabb) -> Self {
        Obstacle::Box { min: aabb.min.to_array(), max: aabb.max.to_array() }
    }

    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Obstacle::Sphere { center: center.to_array(), radius }
    }

    /// Bounding box of the obstacle
    pub fn bounds(&self) -> Aabb {
        match self {
            Obstacle::Box { min, max } => Aabb::new(Vec3::from_array(*min), Vec3::from_array(*max)),
            Obstacle::Sphere { center, radius } => {
                Aabb::from_center_half_extent(Vec3::from_array(*center), Vec3::splat(*radius))
            }
        }
    }

    pub fn overlaps(&self, aabb: &Aabb) -> bool {
        match self {
            Obstacle::Box { .. } => self.bounds().overlaps(aabb),
            Obstacle::Sphere { center, radius } => {
                let c = Vec3::from_array(*center);
                aabb.closest_point(c).distance_squared(c) < radius * radius
            }
        }
    }

    /// True if the obstacle covers the whole box
    pub fn contains(&self, aabb: &Aabb) -> bool {
        match self {
            Obstacle::Box { .. } => self.bounds().contains_aabb(aabb),
            Obstacle::Sphere { center, radius } => {
                let c = Vec3::from_array(*center);
                aabb.farthest_corner(c).distance_squared(c) <= radius * radius
            }
        }
    }

    pub fn segment_hits(&self, from: Vec3, to: Vec3) -> bool {
        match self {
            Obstacle::Box { .. } => segment_intersects_aabb(from, to, &self.bounds()),
            Obstacle::Sphere { center, radius } => {
                segment_point_distance(from, to, Vec3::from_array(*center)) <= *radius
            }
        }
    }
}

/// Oracle over a flat list of boxes and spheres
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObstacleOracle {
    obstacles: Vec<Obstacle>,
}

impl ObstacleOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_obstacles(obstacles: Vec<Obstacle>) -> Self {
        Self { obstacles }
    }

    /// Parse a JSON array of obstacles
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::InvalidConfig(format!("invalid obstacle list: {}", e)))
    }

    pub fn add_box(&mut self, aabb: Aabb) -> &mut Self {
        self.obstacles.push(Obstacle::from_aabb(aabb));
        self
    }

    pub fn add_sphere(&mut self, center: Vec3, radius: f32) -> &mut Self {
        self.obstacles.push(Obstacle::sphere(center, radius));
        self
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}

impl OccupancyOracle for ObstacleOracle {
    fn overlaps(&self, aabb: &Aabb) -> bool {
        self.obstacles.iter().any(|o| o.overlaps(aabb))
    }

    fn classify(&self, aabb: &Aabb) -> RegionHint {
        let mut hint = RegionHint::Empty;
        for obstacle in &self.obstacles {
            if obstacle.contains(aabb) {
                return RegionHint::Solid;
            }
            if obstacle.overlaps(aabb) {
                hint = RegionHint::Mixed;
            }
        }
        hint
    }

    fn segment_blocked(&self, from: Vec3, to: Vec3) -> bool {
        self.obstacles.iter().any(|o| o.segment_hits(from, to))
    }
}

/// Union of several oracles: a region is blocked if any member blocks it.
pub struct CompositeOracle {
    oracles: Vec<Box<dyn OccupancyOracle>>,
}

impl CompositeOracle {
    pub fn new() -> Self {
        Self { oracles: Vec::new() }
    }

    pub fn from_oracles(oracles: Vec<Box<dyn OccupancyOracle>>) -> Self {
        Self { oracles }
    }

    pub fn push(&mut self, oracle: Box<dyn OccupancyOracle>) {
        self.oracles.push(oracle);
    }

    pub fn len(&self) -> usize {
        self.oracles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.oracles.is_empty()
    }
}

impl Default for CompositeOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl OccupancyOracle for CompositeOracle {
    fn overlaps(&self, aabb: &Aabb) -> bool {
        self.oracles.iter().any(|o| o.overlaps(aabb))
    }

    fn classify(&self, aabb: &Aabb) -> RegionHint {
        let mut has_mixed = false;
        for oracle in &self.oracles {
            match oracle.classify(aabb) {
                RegionHint::Solid => return RegionHint::Solid,
                RegionHint::Mixed | RegionHint::Unknown => has_mixed = true,
                RegionHint::Empty => {}
            }
        }
        if has_mixed { RegionHint::Mixed } else { RegionHint::Empty }
    }

    fn segment_blocked(&self, from: Vec3, to: Vec3) -> bool {
        self.oracles.iter().any(|o| o.segment_blocked(from, to))
    }
}
