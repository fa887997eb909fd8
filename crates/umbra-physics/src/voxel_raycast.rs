//! Voxel raycasting using the DDA (Amanatides & Woo) algorithm.
//!
//! Two casts share the traversal: [`ray_cast_to_obstacle`] stops at the first
//! obstacle and reports the contact point, [`ray_cast`] picks the first
//! selectable block and reports the cell and face that were hit.

use glam::{IVec3, Vec3};
use rustc_hash::FxHashSet;
use tracing::trace;
use umbra_math::{Ray, RayRelation};
use umbra_voxel::{BlockDef, BlockId, ChunkStore, Voxel};

/// Direction components below this are treated as parallel to the axis.
const EPSILON: f32 = 1e-6;

/// Cell-by-cell walk along a ray.
struct Traversal {
    cell: IVec3,
    step: IVec3,
    t_delta: Vec3,
    t_max: Vec3,
    t: f32,
    /// Axis crossed to enter the current cell, `None` for the start cell.
    entered: Option<usize>,
}

impl Traversal {
    fn new(start: Vec3, dir: Vec3) -> Self {
        let cell = start.floor().as_ivec3();
        let mut step = IVec3::ZERO;
        let mut t_delta = Vec3::INFINITY;
        let mut t_max = Vec3::INFINITY;
        for axis in 0..3 {
            step[axis] = if dir[axis] > 0.0 { 1 } else { -1 };
            if dir[axis].abs() < EPSILON {
                continue;
            }
            t_delta[axis] = (1.0 / dir[axis]).abs();
            let dist = if step[axis] > 0 {
                cell[axis] as f32 + 1.0 - start[axis]
            } else {
                start[axis] - cell[axis] as f32
            };
            t_max[axis] = t_delta[axis] * dist;
        }
        Self {
            cell,
            step,
            t_delta,
            t_max,
            t: 0.0,
            entered: None,
        }
    }

    /// Moves into the next cell along the axis with the nearest boundary.
    fn advance(&mut self) {
        let axis = if self.t_max.x < self.t_max.y {
            if self.t_max.x < self.t_max.z { 0 } else { 2 }
        } else if self.t_max.y < self.t_max.z {
            1
        } else {
            2
        };
        self.cell[axis] += self.step[axis];
        self.t = self.t_max[axis];
        self.t_max[axis] += self.t_delta[axis];
        self.entered = Some(axis);
    }

    /// Outward normal of the face the current cell was entered through.
    fn entry_normal(&self) -> IVec3 {
        let mut normal = IVec3::ZERO;
        if let Some(axis) = self.entered {
            normal[axis] = -self.step[axis];
        }
        normal
    }
}

/// Offset from a cell to its block's origin cell (zero unless a segment).
fn origin_offset(store: &ChunkStore, cell: IVec3, def: &BlockDef, voxel: Voxel) -> IVec3 {
    if voxel.state.is_segment() {
        store.seek_origin(cell, def, voxel.state) - cell
    } else {
        IVec3::ZERO
    }
}

/// Closest hitbox hit of the block in `cell`, as `(distance, normal)`.
fn closest_hitbox(
    store: &ChunkStore,
    ray: &Ray,
    cell: IVec3,
    def: &BlockDef,
    voxel: Voxel,
    max_dist: f32,
) -> Option<(f32, IVec3)> {
    let box_pos = (cell + origin_offset(store, cell, def, voxel)).as_vec3();
    def.hitboxes_for(voxel.state)
        .iter()
        .filter_map(|hitbox| ray.intersect_aabb(box_pos, hitbox, max_dist))
        .filter(|hit| hit.relation > RayRelation::None)
        .map(|hit| (hit.distance, hit.normal))
        .min_by(|a, b| a.0.total_cmp(&b.0))
}

/// Marches from `start` along `dir` and returns where the ray first touches
/// an obstacle, or `start + max_dist * dir` if nothing is hit.
///
/// Full-cube obstacles stop the ray at the cell boundary; other obstacles are
/// tested against their rotated hitboxes. Unloaded cells are passed through.
pub fn ray_cast_to_obstacle(store: &ChunkStore, start: Vec3, dir: Vec3, max_dist: f32) -> Vec3 {
    let registry = store.registry();
    let ray = Ray::new(start, dir);
    let mut walk = Traversal::new(start, dir);
    while walk.t <= max_dist {
        let cell = walk.cell;
        if let Some(voxel) = store.get(cell.x, cell.y, cell.z)
            && let Some(def) = registry.try_get(voxel.id)
            && def.obstacle
        {
            if def.solid {
                return ray.at(walk.t);
            }
            if let Some((distance, _)) = closest_hitbox(store, &ray, cell, def, voxel, max_dist) {
                return ray.at(distance);
            }
        }
        walk.advance();
    }
    ray.at(max_dist)
}

/// A block picked by [`ray_cast`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub voxel: Voxel,
    /// Cell that was hit.
    pub position: IVec3,
    /// Exact point where the ray met the block.
    pub end: Vec3,
    /// Outward normal of the face that was hit.
    pub normal: IVec3,
}

/// Outcome of [`ray_cast`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayCastResult {
    pub hit: Option<RayHit>,
    /// Point where the cast ended: the hit point, the first unloaded cell,
    /// or the end of the range.
    pub end: Vec3,
    /// Last cell visited.
    pub last_cell: IVec3,
}

/// Picks the first selectable block along the ray whose id is not in `filter`.
///
/// The cast stops without a hit at the first unloaded cell.
pub fn ray_cast(
    store: &ChunkStore,
    start: Vec3,
    dir: Vec3,
    max_dist: f32,
    filter: &FxHashSet<BlockId>,
) -> RayCastResult {
    let registry = store.registry();
    let ray = Ray::new(start, dir);
    let mut walk = Traversal::new(start, dir);
    while walk.t <= max_dist {
        let cell = walk.cell;
        let Some(voxel) = store.get(cell.x, cell.y, cell.z) else {
            return RayCastResult {
                hit: None,
                end: ray.at(walk.t),
                last_cell: cell,
            };
        };
        if let Some(def) = registry.try_get(voxel.id)
            && def.selectable
            && !filter.contains(&voxel.id)
        {
            let contact = if def.solid {
                Some((walk.t, walk.entry_normal()))
            } else {
                closest_hitbox(store, &ray, cell, def, voxel, max_dist)
            };
            if let Some((distance, normal)) = contact {
                let hit = RayHit {
                    voxel,
                    position: cell,
                    end: ray.at(distance),
                    normal,
                };
                trace!(block = %def.name, position = ?cell, "ray cast hit");
                return RayCastResult {
                    hit: Some(hit),
                    end: hit.end,
                    last_cell: cell,
                };
            }
        }
        walk.advance();
    }
    RayCastResult {
        hit: None,
        end: ray.at(max_dist),
        last_cell: walk.cell,
    }
}
