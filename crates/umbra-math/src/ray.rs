//! Parametric rays and slab-test intersection against [`Aabb`] hitboxes.

use glam::{IVec3, Vec3};

use crate::Aabb;

/// Direction components smaller than this are treated as parallel to an axis.
const PARALLEL_EPSILON: f32 = 1e-6;

/// How a ray relates to a box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum RayRelation {
    /// No contact within range.
    None,
    /// The ray enters the box through one of its faces.
    Intersect,
    /// The ray starts inside the box.
    Embedded,
}

/// Result of [`Ray::intersect_aabb`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayIntersection {
    pub relation: RayRelation,
    /// Parametric distance along the ray direction.
    pub distance: f32,
    /// Outward normal of the entry face (zero when embedded).
    pub normal: IVec3,
}

/// A ray `origin + t * direction`. The direction is not required to be normalized;
/// distances are expressed in multiples of it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Point at parametric distance `t`.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Intersects the ray with `aabb` placed at `box_pos`.
    ///
    /// Returns `None` if the box is missed, lies behind the origin, or is entered
    /// further than `max_dist`.
    pub fn intersect_aabb(
        &self,
        box_pos: Vec3,
        aabb: &Aabb,
        max_dist: f32,
    ) -> Option<RayIntersection> {
        let min = box_pos + aabb.min;
        let max = box_pos + aabb.max;

        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut normal = IVec3::ZERO;

        for axis in 0..3 {
            let o = self.origin[axis];
            let d = self.direction[axis];
            if d.abs() < PARALLEL_EPSILON {
                if o < min[axis] || o > max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut t0 = (min[axis] - o) * inv;
            let mut t1 = (max[axis] - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            if t0 > t_enter {
                t_enter = t0;
                normal = IVec3::ZERO;
                normal[axis] = if d > 0.0 { -1 } else { 1 };
            }
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return None;
            }
        }

        if t_exit < 0.0 {
            return None;
        }
        if t_enter < 0.0 {
            return Some(RayIntersection {
                relation: RayRelation::Embedded,
                distance: 0.0,
                normal: IVec3::ZERO,
            });
        }
        if t_enter > max_dist {
            return None;
        }
        Some(RayIntersection {
            relation: RayRelation::Intersect,
            distance: t_enter,
            normal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hits_box_ahead() {
        let ray = Ray::new(Vec3::new(0.5, 0.5, 0.5), Vec3::X);
        let hit = ray
            .intersect_aabb(Vec3::new(3.0, 0.0, 0.0), &Aabb::UNIT, 10.0)
            .expect("box is on the ray");
        assert_eq!(hit.relation, RayRelation::Intersect);
        assert!((hit.distance - 2.5).abs() < 1e-5);
        assert_eq!(hit.normal, IVec3::new(-1, 0, 0));
    }

    #[test]
    fn test_misses_box_behind() {
        let ray = Ray::new(Vec3::new(0.5, 0.5, 0.5), Vec3::X);
        assert!(
            ray.intersect_aabb(Vec3::new(-3.0, 0.0, 0.0), &Aabb::UNIT, 10.0)
                .is_none()
        );
    }

    #[test]
    fn test_respects_max_distance() {
        let ray = Ray::new(Vec3::new(0.5, 0.5, 0.5), Vec3::X);
        assert!(
            ray.intersect_aabb(Vec3::new(8.0, 0.0, 0.0), &Aabb::UNIT, 4.0)
                .is_none()
        );
    }

    #[test]
    fn test_parallel_ray_outside_slab_misses() {
        let ray = Ray::new(Vec3::new(0.5, 2.0, 0.5), Vec3::X);
        assert!(
            ray.intersect_aabb(Vec3::new(3.0, 0.0, 0.0), &Aabb::UNIT, 10.0)
                .is_none()
        );
    }

    #[test]
    fn test_origin_inside_is_embedded() {
        let ray = Ray::new(Vec3::new(0.5, 0.5, 0.5), Vec3::NEG_Y);
        let hit = ray
            .intersect_aabb(Vec3::ZERO, &Aabb::UNIT, 10.0)
            .expect("origin is inside");
        assert_eq!(hit.relation, RayRelation::Embedded);
        assert_eq!(hit.distance, 0.0);
    }

    #[test]
    fn test_downward_ray_hits_slab_top() {
        let slab = Aabb::new(Vec3::ZERO, Vec3::new(1.0, 0.5, 1.0));
        let ray = Ray::new(Vec3::new(0.5, 3.0, 0.5), Vec3::NEG_Y);
        let hit = ray.intersect_aabb(Vec3::ZERO, &slab, 10.0).expect("hit");
        assert!((hit.distance - 2.5).abs() < 1e-5);
        assert_eq!(hit.normal, IVec3::Y);
        assert!((ray.at(hit.distance).y - 0.5).abs() < 1e-5);
    }
}
