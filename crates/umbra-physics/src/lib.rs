//! Ray marching and point queries against the voxel world's block hitboxes.

mod obstacle;
pub mod voxel_raycast;

pub use obstacle::obstacle_at;
pub use voxel_raycast::{RayCastResult, RayHit, ray_cast, ray_cast_to_obstacle};
