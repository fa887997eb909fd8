//! Incremental flood-fill light propagation for one light channel.
//!
//! Light decays by one per step through light-passing blocks. `add` and
//! `remove` only seed work queues; `solve` drains them. Removal runs first
//! and hands every cell still lit by another source to the add queue, so a
//! single `solve` both retracts a source and repairs the gap it leaves.

use tracing::trace;
use umbra_voxel::ChunkStore;

use crate::queue::{LightEntry, LightQueue};

/// The six axis-aligned neighbour offsets.
const NEIGHBORS_6: [(i32, i32, i32); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

/// Add/remove queues for a single channel of the chunks' light buffers.
#[derive(Debug)]
pub struct LightSolver {
    add_queue: LightQueue<LightEntry>,
    remove_queue: LightQueue<LightEntry>,
    channel: usize,
}

impl LightSolver {
    pub fn new(channel: usize) -> Self {
        debug_assert!(channel < umbra_voxel::LIGHT_CHANNELS);
        Self {
            add_queue: LightQueue::new(),
            remove_queue: LightQueue::new(),
            channel,
        }
    }

    pub fn channel(&self) -> usize {
        self.channel
    }

    /// Raises the cell to `emission` and queues it for spreading.
    ///
    /// No-op for zero emission, non-resident cells, and cells already
    /// brighter than `emission`.
    pub fn add(&mut self, store: &mut ChunkStore, x: i32, y: i32, z: i32, emission: u8) {
        if emission == 0 || store.chunk_by_voxel(x, y, z).is_none() {
            return;
        }
        let current = store.light_channel(x, y, z, self.channel);
        if emission < current {
            return;
        }
        store.set_light_channel(x, y, z, self.channel, emission);
        self.add_queue.push(LightEntry::new(x, y, z, emission));
    }

    /// Queues the cell's current light for spreading.
    pub fn add_existing(&mut self, store: &mut ChunkStore, x: i32, y: i32, z: i32) {
        let current = store.light_channel(x, y, z, self.channel);
        self.add(store, x, y, z, current);
    }

    /// Clears the cell and queues the light it held for retraction.
    pub fn remove(&mut self, store: &mut ChunkStore, x: i32, y: i32, z: i32) {
        if store.chunk_by_voxel(x, y, z).is_none() {
            return;
        }
        let light = store.light_channel(x, y, z, self.channel);
        if light == 0 {
            return;
        }
        store.set_light_channel(x, y, z, self.channel, 0);
        self.remove_queue.push(LightEntry::new(x, y, z, light));
    }

    /// Runs both phases until the queues are empty.
    pub fn solve(&mut self, store: &mut ChunkStore) {
        let removed = self.drain_remove(store);
        let added = self.drain_add(store);
        if removed + added > 0 {
            trace!(channel = self.channel, removed, added, "light solved");
        }
    }

    /// Returns `true` when nothing is queued.
    pub fn is_idle(&self) -> bool {
        self.add_queue.is_empty() && self.remove_queue.is_empty()
    }

    /// Drops all pending work without touching the light buffers.
    pub fn reset(&mut self) {
        self.add_queue.clear();
        self.remove_queue.clear();
    }

    fn drain_remove(&mut self, store: &mut ChunkStore) -> usize {
        let registry = std::sync::Arc::clone(store.registry());
        let mut processed = 0;
        while let Some(entry) = self.remove_queue.pop() {
            processed += 1;
            for (dx, dy, dz) in NEIGHBORS_6 {
                let (x, y, z) = (entry.x + dx, entry.y + dy, entry.z + dz);
                let Some(voxel) = store.get(x, y, z) else {
                    continue;
                };
                let light = store.light_channel(x, y, z, self.channel);
                if light != 0 && light < entry.light {
                    let emission = registry.emission(voxel.id, self.channel);
                    store.set_light_channel(x, y, z, self.channel, emission);
                    if emission > 0 {
                        self.add_queue.push(LightEntry::new(x, y, z, emission));
                    }
                    self.remove_queue.push(LightEntry::new(x, y, z, light));
                } else if light >= entry.light {
                    self.add_queue.push(LightEntry::new(x, y, z, light));
                }
            }
        }
        processed
    }

    fn drain_add(&mut self, store: &mut ChunkStore) -> usize {
        let registry = std::sync::Arc::clone(store.registry());
        let mut processed = 0;
        while let Some(entry) = self.add_queue.pop() {
            processed += 1;
            // Stale once a later removal or a brighter add rewrote the cell.
            if entry.light <= 1
                || store.light_channel(entry.x, entry.y, entry.z, self.channel) != entry.light
            {
                continue;
            }
            let candidate = entry.light - 1;
            for (dx, dy, dz) in NEIGHBORS_6 {
                let (x, y, z) = (entry.x + dx, entry.y + dy, entry.z + dz);
                let Some(voxel) = store.get(x, y, z) else {
                    continue;
                };
                if !registry.is_light_passing(voxel.id) {
                    continue;
                }
                if candidate > store.light_channel(x, y, z, self.channel) {
                    store.set_light_channel(x, y, z, self.channel, candidate);
                    self.add_queue.push(LightEntry::new(x, y, z, candidate));
                }
            }
        }
        processed
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use umbra_voxel::{
        BlockDef, BlockId, BlockRegistry, BlockState, CHANNEL_RED, CHANNEL_SUN, Chunk, Light,
    };

    use super::*;

    struct World {
        store: ChunkStore,
        stone: BlockId,
        lamp: BlockId,
    }

    /// A 2×2 window of all-air chunks covering x, z in `-16..16`.
    fn world() -> World {
        let mut registry = BlockRegistry::new();
        let stone = registry
            .register(BlockDef {
                name: "stone".to_string(),
                ..BlockDef::default()
            })
            .unwrap();
        let lamp = registry
            .register(BlockDef {
                name: "lamp".to_string(),
                emission: [12, 0, 0],
                ..BlockDef::default()
            })
            .unwrap();
        let mut store = ChunkStore::new(2, 2, 0, 0, Arc::new(registry));
        for cz in -1..1 {
            for cx in -1..1 {
                assert!(store.put_chunk(Arc::new(Chunk::new(cx, cz))));
            }
        }
        World { store, stone, lamp }
    }

    fn snapshot(store: &ChunkStore) -> Vec<Vec<Light>> {
        store.iter().map(|chunk| chunk.lightmap.lights().to_vec()).collect()
    }

    #[test]
    fn test_concrete_attenuation_scenario() {
        let mut w = world();
        let mut solver = LightSolver::new(CHANNEL_SUN);
        solver.add(&mut w.store, 8, 8, 8, 15);
        solver.solve(&mut w.store);
        assert_eq!(w.store.light_channel(8, 8, 8, CHANNEL_SUN), 15);
        assert_eq!(w.store.light_channel(8, 8, 9, CHANNEL_SUN), 14);
        assert_eq!(w.store.light_channel(8, 8, 10, CHANNEL_SUN), 13);
        assert_eq!(w.store.light_channel(8, 8, 8, CHANNEL_RED), 0);
        assert!(solver.is_idle());
    }

    #[test]
    fn test_solve_with_empty_queues_is_noop() {
        let mut w = world();
        let mut solver = LightSolver::new(CHANNEL_RED);
        solver.add(&mut w.store, 3, 20, 3, 10);
        solver.solve(&mut w.store);
        let before = snapshot(&w.store);
        solver.solve(&mut w.store);
        assert_eq!(snapshot(&w.store), before);
    }

    #[test]
    fn test_add_below_current_is_ignored() {
        let mut w = world();
        let mut solver = LightSolver::new(CHANNEL_RED);
        solver.add(&mut w.store, 0, 10, 0, 12);
        solver.solve(&mut w.store);
        solver.add(&mut w.store, 0, 10, 0, 5);
        assert!(solver.is_idle());
        assert_eq!(w.store.light_channel(0, 10, 0, CHANNEL_RED), 12);
        solver.add(&mut w.store, 100, 10, 0, 5);
        solver.add(&mut w.store, 0, 10, 1, 0);
        assert!(solver.is_idle());
    }

    #[test]
    fn test_add_remove_round_trip() {
        let mut w = world();
        let before = snapshot(&w.store);
        let mut solver = LightSolver::new(CHANNEL_RED);
        // Near a chunk corner so the light crosses into all four chunks.
        solver.add(&mut w.store, 0, 30, 0, 15);
        solver.solve(&mut w.store);
        assert_eq!(w.store.light_channel(-3, 30, -3, CHANNEL_RED), 9);

        solver.remove(&mut w.store, 0, 30, 0);
        solver.solve(&mut w.store);
        assert_eq!(snapshot(&w.store), before);
    }

    #[test]
    fn test_overlapping_source_survives_removal() {
        let mut w = world();
        let mut solver = LightSolver::new(CHANNEL_RED);
        solver.add(&mut w.store, 0, 30, 0, 15);
        solver.add(&mut w.store, 6, 30, 0, 15);
        solver.solve(&mut w.store);
        assert_eq!(w.store.light_channel(3, 30, 0, CHANNEL_RED), 12);

        solver.remove(&mut w.store, 0, 30, 0);
        solver.solve(&mut w.store);
        assert_eq!(w.store.light_channel(6, 30, 0, CHANNEL_RED), 15);
        assert_eq!(w.store.light_channel(3, 30, 0, CHANNEL_RED), 12);
        // Now lit only by the second source, six steps away.
        assert_eq!(w.store.light_channel(0, 30, 0, CHANNEL_RED), 9);
        assert_eq!(w.store.light_channel(-2, 30, 0, CHANNEL_RED), 7);
    }

    #[test]
    fn test_opaque_block_casts_shadow() {
        let mut w = world();
        for y in 0..64 {
            for z in -16..16 {
                w.store.set(2, y, z, w.stone, BlockState::default()).unwrap();
            }
        }
        let mut solver = LightSolver::new(CHANNEL_RED);
        solver.add(&mut w.store, 0, 30, 0, 15);
        solver.solve(&mut w.store);
        assert_eq!(w.store.light_channel(1, 30, 0, CHANNEL_RED), 14);
        assert_eq!(w.store.light_channel(2, 30, 0, CHANNEL_RED), 0);
        // The wall spans the full height the light can reach.
        assert_eq!(w.store.light_channel(3, 30, 0, CHANNEL_RED), 0);
    }

    #[test]
    fn test_removal_reseeds_emitters() {
        let mut w = world();
        w.store.set(4, 30, 0, w.lamp, BlockState::default()).unwrap();
        let mut solver = LightSolver::new(CHANNEL_RED);
        solver.add(&mut w.store, 4, 30, 0, 12);
        solver.add(&mut w.store, 0, 30, 0, 15);
        solver.solve(&mut w.store);
        // The lamp cell is opaque but was lit by its own emission.
        assert_eq!(w.store.light_channel(4, 30, 0, CHANNEL_RED), 12);

        solver.remove(&mut w.store, 0, 30, 0);
        solver.solve(&mut w.store);
        assert_eq!(w.store.light_channel(4, 30, 0, CHANNEL_RED), 12);
        assert_eq!(w.store.light_channel(5, 30, 0, CHANNEL_RED), 11);
        assert_eq!(w.store.light_channel(0, 30, 0, CHANNEL_RED), 8);
    }

    #[test]
    fn test_deferred_add_then_remove_leaves_no_light() {
        let mut w = world();
        let before = snapshot(&w.store);
        let mut solver = LightSolver::new(CHANNEL_RED);
        solver.add(&mut w.store, 0, 30, 0, 15);
        solver.remove(&mut w.store, 0, 30, 0);
        solver.solve(&mut w.store);
        assert_eq!(w.store.light_channel(0, 30, 0, CHANNEL_RED), 0);
        assert_eq!(w.store.light_channel(1, 30, 0, CHANNEL_RED), 0);
        assert_eq!(w.store.light_channel(0, 31, 0, CHANNEL_RED), 0);
        assert_eq!(snapshot(&w.store), before);
        assert!(solver.is_idle());
    }

    #[test]
    fn test_brighter_add_supersedes_queued_entry() {
        let mut w = world();
        let mut solver = LightSolver::new(CHANNEL_RED);
        solver.add(&mut w.store, 0, 30, 0, 6);
        solver.add(&mut w.store, 0, 30, 0, 10);
        solver.solve(&mut w.store);
        assert_eq!(w.store.light_channel(0, 30, 0, CHANNEL_RED), 10);
        assert_eq!(w.store.light_channel(4, 30, 0, CHANNEL_RED), 6);
    }

    #[test]
    fn test_reset_drops_pending_work() {
        let mut w = world();
        let mut solver = LightSolver::new(CHANNEL_RED);
        solver.add(&mut w.store, 0, 30, 0, 15);
        solver.reset();
        assert!(solver.is_idle());
        solver.solve(&mut w.store);
        assert_eq!(w.store.light_channel(1, 30, 0, CHANNEL_RED), 0);
    }

    #[test]
    fn test_remove_dark_cell_is_noop() {
        let mut w = world();
        let mut solver = LightSolver::new(CHANNEL_RED);
        solver.remove(&mut w.store, 0, 30, 0);
        assert!(solver.is_idle());
    }
}
