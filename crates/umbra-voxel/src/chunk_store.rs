//! Windowed cache of resident chunks around a movable centre.
//!
//! The store owns one slot per chunk position inside a `width × depth`
//! window. Moving or shrinking the window evicts the chunks that fall out of
//! it, and every eviction is reported to the registered listeners exactly
//! once so the persistence layer can save the chunk.

use std::sync::Arc;

use tracing::{debug, warn};
use umbra_math::floor_div;

use crate::area_map::AreaMap;
use crate::chunk::{CHUNK_D, CHUNK_H, CHUNK_W, Chunk};
use crate::registry::BlockRegistry;

/// Residency change reported to [`ChunkListener`]s.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkEvent {
    /// The chunk was inserted into the window.
    Shown,
    /// The chunk left the window (recentre, shrink, or clear).
    Hidden,
}

/// Receives chunk residency notifications.
///
/// Listeners get the chunk handle only, never the store, and may keep a
/// clone of the `Arc` (e.g. to hand it to a save queue).
pub trait ChunkListener {
    fn on_chunk_event(&mut self, event: ChunkEvent, chunk: &Arc<Chunk>);
}

impl<F> ChunkListener for F
where
    F: FnMut(ChunkEvent, &Arc<Chunk>),
{
    fn on_chunk_event(&mut self, event: ChunkEvent, chunk: &Arc<Chunk>) {
        self(event, chunk)
    }
}

type Listeners = Vec<Box<dyn ChunkListener + Send>>;

fn notify(listeners: &mut Listeners, event: ChunkEvent, chunk: &Arc<Chunk>) {
    for listener in listeners.iter_mut() {
        listener.on_chunk_event(event, chunk);
    }
}

/// Resident chunks plus the block table they are interpreted against.
pub struct ChunkStore {
    area: AreaMap<Arc<Chunk>>,
    registry: Arc<BlockRegistry>,
    listeners: Listeners,
}

impl ChunkStore {
    /// Creates an empty `width × depth` window centred on chunk `(origin_x, origin_z)`.
    pub fn new(
        width: u32,
        depth: u32,
        origin_x: i32,
        origin_z: i32,
        registry: Arc<BlockRegistry>,
    ) -> Self {
        let mut area = AreaMap::new(width.max(1) as i32, depth.max(1) as i32);
        area.set_center(origin_x, origin_z, |_, _, _| {});
        Self {
            area,
            registry,
            listeners: Vec::new(),
        }
    }

    /// Resizes the window to `2·radius` square if needed, then recentres on
    /// world position `(center_x, center_z)`.
    pub fn configure(&mut self, center_x: i32, center_z: i32, radius: u32) {
        let size = (radius.max(1) * 2) as i32;
        if self.area.width() != size || self.area.depth() != size {
            debug!(
                from = self.area.width(),
                to = size,
                "resizing chunk window"
            );
            let listeners = &mut self.listeners;
            self.area.resize(size, size, |x, z, chunk| {
                debug!(x, z, "chunk hidden by resize");
                notify(listeners, ChunkEvent::Hidden, &chunk);
            });
        }
        self.set_center(center_x, center_z);
    }

    /// Recentres the window on the chunk containing world position `(x, z)`.
    pub fn set_center(&mut self, x: i32, z: i32) {
        let cx = floor_div(x, CHUNK_W);
        let cz = floor_div(z, CHUNK_D);
        let listeners = &mut self.listeners;
        self.area.set_center(cx, cz, |x, z, chunk| {
            debug!(x, z, "chunk hidden");
            notify(listeners, ChunkEvent::Hidden, &chunk);
        });
    }

    /// Inserts a chunk at its own grid position.
    ///
    /// Returns `false` and drops the store's handle when the position lies
    /// outside the window. A chunk already at that position is replaced
    /// without notification.
    pub fn put_chunk(&mut self, chunk: Arc<Chunk>) -> bool {
        let (x, z) = (chunk.x, chunk.z);
        match self.area.set(x, z, Arc::clone(&chunk)) {
            Ok(_) => {
                debug!(x, z, "chunk shown");
                notify(&mut self.listeners, ChunkEvent::Shown, &chunk);
                true
            }
            Err(_) => {
                warn!(x, z, offset = ?self.area.offset(), "chunk outside window rejected");
                false
            }
        }
    }

    /// Chunk at grid position `(cx, cz)`.
    pub fn chunk(&self, cx: i32, cz: i32) -> Option<&Arc<Chunk>> {
        self.area.get(cx, cz)
    }

    /// Copy-on-write access to the chunk at `(cx, cz)`.
    pub fn chunk_mut(&mut self, cx: i32, cz: i32) -> Option<&mut Chunk> {
        self.area.get_mut(cx, cz).map(Arc::make_mut)
    }

    /// Chunk containing world position `(x, y, z)`; `None` when `y` is outside the column.
    pub fn chunk_by_voxel(&self, x: i32, y: i32, z: i32) -> Option<&Arc<Chunk>> {
        if !(0..CHUNK_H).contains(&y) {
            return None;
        }
        self.chunk(floor_div(x, CHUNK_W), floor_div(z, CHUNK_D))
    }

    pub fn chunk_by_voxel_mut(&mut self, x: i32, y: i32, z: i32) -> Option<&mut Chunk> {
        if !(0..CHUNK_H).contains(&y) {
            return None;
        }
        self.chunk_mut(floor_div(x, CHUNK_W), floor_div(z, CHUNK_D))
    }

    /// Takes a chunk out of the window. Listeners are not notified.
    pub fn remove(&mut self, cx: i32, cz: i32) -> Option<Arc<Chunk>> {
        self.area.remove(cx, cz)
    }

    /// Evicts every resident chunk, notifying listeners with [`ChunkEvent::Hidden`].
    pub fn clear(&mut self) {
        let listeners = &mut self.listeners;
        let mut count = 0usize;
        self.area.clear(|_, _, chunk| {
            count += 1;
            notify(listeners, ChunkEvent::Hidden, &chunk);
        });
        debug!(count, "chunk store cleared");
    }

    pub fn add_listener(&mut self, listener: Box<dyn ChunkListener + Send>) {
        self.listeners.push(listener);
    }

    pub fn width(&self) -> u32 {
        self.area.width() as u32
    }

    pub fn depth(&self) -> u32 {
        self.area.depth() as u32
    }

    /// Grid coordinates of the window's first slot.
    pub fn offset(&self) -> (i32, i32) {
        self.area.offset()
    }

    /// Number of resident chunks.
    pub fn len(&self) -> usize {
        self.area.len()
    }

    pub fn is_empty(&self) -> bool {
        self.area.is_empty()
    }

    /// Resident chunks in window order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Chunk>> + '_ {
        self.area.iter().map(|(_, _, chunk)| chunk)
    }

    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }
}

impl std::fmt::Debug for ChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStore")
            .field("width", &self.area.width())
            .field("depth", &self.area.depth())
            .field("offset", &self.area.offset())
            .field("resident", &self.area.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    type Log = Arc<Mutex<Vec<(ChunkEvent, i32, i32)>>>;

    fn store_with_log(width: u32) -> (ChunkStore, Log) {
        let mut store = ChunkStore::new(width, width, 0, 0, Arc::new(BlockRegistry::new()));
        let log: Log = Arc::default();
        let sink = Arc::clone(&log);
        store.add_listener(Box::new(move |event: ChunkEvent, chunk: &Arc<Chunk>| {
            sink.lock().unwrap().push((event, chunk.x, chunk.z));
        }));
        (store, log)
    }

    fn fill_window(store: &mut ChunkStore) {
        let (ox, oz) = store.offset();
        for z in oz..oz + store.depth() as i32 {
            for x in ox..ox + store.width() as i32 {
                assert!(store.put_chunk(Arc::new(Chunk::new(x, z))));
            }
        }
    }

    #[test]
    fn test_put_chunk_outside_window_rejected() {
        let (mut store, log) = store_with_log(4);
        assert!(!store.put_chunk(Arc::new(Chunk::new(50, 0))));
        assert!(store.put_chunk(Arc::new(Chunk::new(1, 1))));
        assert_eq!(*log.lock().unwrap(), vec![(ChunkEvent::Shown, 1, 1)]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_chunk_by_voxel_floor_divides() {
        let (mut store, _) = store_with_log(4);
        assert!(store.put_chunk(Arc::new(Chunk::new(-1, -1))));
        let chunk = store.chunk_by_voxel(-1, 10, -16).unwrap();
        assert_eq!((chunk.x, chunk.z), (-1, -1));
        assert!(store.chunk_by_voxel(-1, -1, -1).is_none());
        assert!(store.chunk_by_voxel(-1, CHUNK_H, -1).is_none());
        assert!(store.chunk_by_voxel(-17, 0, -1).is_none());
    }

    #[test]
    fn test_every_evicted_chunk_is_hidden_exactly_once() {
        let (mut store, log) = store_with_log(4);
        fill_window(&mut store);
        log.lock().unwrap().clear();

        // Move two chunks east: window offset -2 -> 0.
        store.set_center(2 * CHUNK_W, 0);
        let mut hidden = log.lock().unwrap().clone();
        hidden.sort_by_key(|&(_, x, z)| (x, z));
        assert_eq!(hidden.len(), 8);
        assert!(hidden.iter().all(|&(event, x, _)| event == ChunkEvent::Hidden && x < 0));
        hidden.dedup();
        assert_eq!(hidden.len(), 8);

        // Window invariant: every resident chunk lies inside bounds.
        let (ox, oz) = store.offset();
        for chunk in store.iter() {
            assert!((ox..ox + 4).contains(&chunk.x));
            assert!((oz..oz + 4).contains(&chunk.z));
        }
        assert_eq!(store.len(), 8);
    }

    #[test]
    fn test_configure_shrink_evicts_outside() {
        let (mut store, log) = store_with_log(6);
        fill_window(&mut store);
        log.lock().unwrap().clear();
        store.configure(0, 0, 1);
        assert_eq!(store.width(), 2);
        assert_eq!(store.len(), 4);
        assert_eq!(log.lock().unwrap().len(), 32);
    }

    #[test]
    fn test_remove_is_silent_and_clear_is_not() {
        let (mut store, log) = store_with_log(2);
        fill_window(&mut store);
        log.lock().unwrap().clear();

        let (ox, oz) = store.offset();
        let removed = store.remove(ox, oz).unwrap();
        assert_eq!((removed.x, removed.z), (ox, oz));
        assert!(log.lock().unwrap().is_empty());

        store.clear();
        assert_eq!(log.lock().unwrap().len(), 3);
        assert!(store.is_empty());
    }

    #[test]
    fn test_chunk_mut_copies_shared_chunk() {
        let (mut store, _) = store_with_log(2);
        let shared = Arc::new(Chunk::new(0, 0));
        assert!(store.put_chunk(Arc::clone(&shared)));
        store.chunk_mut(0, 0).unwrap().fill_layers(0, 1, crate::voxel::BlockId(1));
        assert_eq!(shared.top(), 0, "caller's handle must be untouched");
        assert_eq!(store.chunk(0, 0).unwrap().top(), 1);
    }
}
