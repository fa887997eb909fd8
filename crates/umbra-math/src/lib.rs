//! Geometry primitives shared by the voxel store, light solver, and ray marcher.

mod aabb;
mod ray;
mod voxmath;

pub use aabb::Aabb;
pub use ray::{Ray, RayIntersection, RayRelation};
pub use voxmath::{floor_div, floor_mod};
