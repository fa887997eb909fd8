use glam::{IVec3, Vec3};
use umbra_math::Aabb;
use umbra_voxel::{CHUNK_H, ChunkStore};

/// Returns the obstacle hitbox (block-local) containing `point`, if any.
///
/// Unloaded space below the world top counts as a full-cell obstacle so
/// bodies cannot fall into chunks that are not resident yet.
pub fn obstacle_at(store: &ChunkStore, point: Vec3) -> Option<Aabb> {
    let cell = point.floor().as_ivec3();
    let Some(voxel) = store.get(cell.x, cell.y, cell.z) else {
        return (cell.y < CHUNK_H).then_some(Aabb::UNIT);
    };
    let def = store.registry().try_get(voxel.id)?;
    if !def.obstacle {
        return None;
    }
    let offset = if voxel.state.is_segment() {
        store.seek_origin(cell, def, voxel.state) - cell
    } else {
        IVec3::ZERO
    };
    let local = point - (cell + offset).as_vec3();
    def.hitboxes_for(voxel.state)
        .iter()
        .find(|hitbox| hitbox.contains_point(local))
        .copied()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use umbra_voxel::{BlockDef, BlockRegistry, BlockState, Chunk};

    use super::*;

    fn store_with_slab() -> ChunkStore {
        let mut registry = BlockRegistry::new();
        let slab = registry
            .register(BlockDef {
                name: "slab".to_string(),
                solid: false,
                hitboxes: vec![Aabb::new(Vec3::ZERO, Vec3::new(1.0, 0.5, 1.0))],
                ..BlockDef::default()
            })
            .unwrap();
        let mut store = ChunkStore::new(2, 2, 0, 0, Arc::new(registry));
        assert!(store.put_chunk(Arc::new(Chunk::new(0, 0))));
        store.set(1, 10, 1, slab, BlockState::default()).unwrap();
        store
    }

    #[test]
    fn test_point_inside_and_above_slab() {
        let store = store_with_slab();
        assert!(obstacle_at(&store, Vec3::new(1.5, 10.25, 1.5)).is_some());
        assert!(obstacle_at(&store, Vec3::new(1.5, 10.75, 1.5)).is_none());
        assert!(obstacle_at(&store, Vec3::new(2.5, 10.25, 1.5)).is_none());
    }

    #[test]
    fn test_unloaded_counts_as_solid_below_world_top() {
        let store = store_with_slab();
        assert_eq!(obstacle_at(&store, Vec3::new(-5.0, 10.0, 1.0)), Some(Aabb::UNIT));
        assert_eq!(obstacle_at(&store, Vec3::new(1.0, -3.0, 1.0)), Some(Aabb::UNIT));
        assert_eq!(obstacle_at(&store, Vec3::new(1.0, 300.0, 1.0)), None);
    }
}
