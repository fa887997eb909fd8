use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned box in block-local space, used for block hitboxes.
///
/// Invariant: min.x <= max.x, min.y <= max.y, min.z <= max.z.
/// The constructor enforces this by swapping components if needed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// The full unit cell `[0, 1]³`.
    pub const UNIT: Aabb = Aabb {
        min: Vec3::ZERO,
        max: Vec3::ONE,
    };

    /// Create an AABB from two corners. Automatically sorts
    /// components so that min <= max on every axis.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Returns true if the point lies inside or on the boundary.
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Returns the size along each axis.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Returns a copy shifted by `offset`.
    pub fn translated(&self, offset: Vec3) -> Aabb {
        Aabb {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Returns true if the box covers the whole unit cell.
    pub fn is_full_cell(&self) -> bool {
        self.min.cmple(Vec3::ZERO).all() && self.max.cmpge(Vec3::ONE).all()
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::UNIT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sorts_corners() {
        let aabb = Aabb::new(Vec3::new(1.0, 0.0, 0.5), Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(aabb.min, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 0.5, 0.5));
    }

    #[test]
    fn test_contains_point_on_edge() {
        let aabb = Aabb::UNIT;
        assert!(aabb.contains_point(Vec3::ZERO));
        assert!(aabb.contains_point(Vec3::ONE));
        assert!(aabb.contains_point(Vec3::new(1.0, 0.5, 0.5)));
        assert!(!aabb.contains_point(Vec3::new(1.01, 0.5, 0.5)));
    }

    #[test]
    fn test_translated_moves_both_corners() {
        let moved = Aabb::UNIT.translated(Vec3::new(2.0, -1.0, 0.5));
        assert_eq!(moved.min, Vec3::new(2.0, -1.0, 0.5));
        assert_eq!(moved.max, Vec3::new(3.0, 0.0, 1.5));
        assert_eq!(moved.size(), Vec3::ONE);
    }

    #[test]
    fn test_half_slab_is_not_full_cell() {
        let slab = Aabb::new(Vec3::ZERO, Vec3::new(1.0, 0.5, 1.0));
        assert!(!slab.is_full_cell());
        assert!(Aabb::UNIT.is_full_cell());
        assert_eq!(slab.size(), Vec3::new(1.0, 0.5, 1.0));
    }
}
