//! Ray type and segment/box queries

use crate::core::types::Vec3;
use super::aabb::Aabb;

/// Direction components below this are treated as parallel to the slab
const PARALLEL_EPSILON: f32 = 1e-8;

/// A ray defined by origin and direction
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    /// Precomputed 1/direction for fast AABB intersection
    pub inv_direction: Vec3,
}

impl Ray {
    /// Create a new ray (direction should be normalized)
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            inv_direction: Vec3::new(
                1.0 / direction.x,
                1.0 / direction.y,
                1.0 / direction.z,
            ),
        }
    }

    /// Ray running from `from` towards `to`, with the segment length.
    /// Returns None for a degenerate segment.
    pub fn from_segment(from: Vec3, to: Vec3) -> Option<(Ray, f32)> {
        let delta = to - from;
        let length = delta.length();
        if length <= f32::EPSILON {
            return None;
        }
        Some((Ray::new(from, delta / length), length))
    }

    /// Ray-AABB intersection using slab method
    /// Returns Some((t_near, t_far)) if intersection, None otherwise.
    /// Touching a face or edge counts as a hit.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> Option<(f32, f32)> {
        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;

        for axis in 0..3 {
            let origin = self.origin[axis];
            let (min, max) = (aabb.min[axis], aabb.max[axis]);

            if self.direction[axis].abs() < PARALLEL_EPSILON {
                // Parallel to this slab: either always inside it or never
                if origin < min || origin > max {
                    return None;
                }
                continue;
            }

            let inv = self.inv_direction[axis];
            let t1 = (min - origin) * inv;
            let t2 = (max - origin) * inv;
            t_near = t_near.max(t1.min(t2));
            t_far = t_far.min(t1.max(t2));
        }

        if t_near <= t_far && t_far >= 0.0 {
            Some((t_near.max(0.0), t_far))
        } else {
            None
        }
    }

    /// True if the first `length` units of the ray touch the box
    pub fn segment_hits_aabb(&self, length: f32, aabb: &Aabb) -> bool {
        matches!(self.intersects_aabb(aabb), Some((t_near, _)) if t_near <= length)
    }
}

/// True if the closed segment `from..to` touches the box
pub fn segment_intersects_aabb(from: Vec3, to: Vec3, aabb: &Aabb) -> bool {
    match Ray::from_segment(from, to) {
        Some((ray, length)) => ray.segment_hits_aabb(length, aabb),
        None => aabb.contains_point(from),
    }
}

/// Shortest distance between point `p` and the segment `from..to`
pub fn segment_point_distance(from: Vec3, to: Vec3, p: Vec3) -> f32 {
    let delta = to - from;
    let len_sq = delta.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance(from);
    }
    let t = ((p - from).dot(delta) / len_sq).clamp(0.0, 1.0);
    p.distance(from + delta * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersects_aabb_hit() {
        let ray = Ray::new(Vec3::new(-2.0, 0.5, 0.5), Vec3::X);
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let hit = ray.intersects_aabb(&aabb);
        assert!(hit.is_some());
        let (t_near, t_far) = hit.unwrap();
        assert!((t_near - 2.0).abs() < 0.001);
        assert!((t_far - 3.0).abs() < 0.001);
    }

    #[test]
    fn test_intersects_aabb_miss() {
        let ray = Ray::new(Vec3::new(-2.0, 5.0, 0.5), Vec3::X);
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert!(ray.intersects_aabb(&aabb).is_none());
    }

    #[test]
    fn test_intersects_aabb_inside() {
        let ray = Ray::new(Vec3::splat(0.5), Vec3::X);
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let hit = ray.intersects_aabb(&aabb);
        assert!(hit.is_some());
        let (t_near, _) = hit.unwrap();
        assert_eq!(t_near, 0.0); // Inside, so t_near clamped to 0
    }

    #[test]
    fn test_ray_in_face_plane_touches() {
        // Runs exactly along the y = 1 face of the box
        let ray = Ray::new(Vec3::new(-1.0, 1.0, 0.5), Vec3::X);
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert!(ray.intersects_aabb(&aabb).is_some());
    }

    #[test]
    fn test_segment_stops_short() {
        let aabb = Aabb::new(Vec3::new(2.0, 0.0, 0.0), Vec3::new(3.0, 1.0, 1.0));
        let from = Vec3::new(0.0, 0.5, 0.5);
        assert!(!segment_intersects_aabb(from, Vec3::new(1.5, 0.5, 0.5), &aabb));
        assert!(segment_intersects_aabb(from, Vec3::new(2.0, 0.5, 0.5), &aabb));
        assert!(segment_intersects_aabb(from, Vec3::new(5.0, 0.5, 0.5), &aabb));
    }

    #[test]
    fn test_segment_point_distance() {
        let d = segment_point_distance(Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), Vec3::new(2.0, 3.0, 0.0));
        assert!((d - 3.0).abs() < 1e-6);
        let d = segment_point_distance(Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), Vec3::new(-3.0, 0.0, 4.0));
        assert!((d - 5.0).abs() < 1e-6);
    }
}
