//! # Chunk Manager Module
//!
//! Mediates every chunk access between callers and a [`ChunkAccess`] store,
//! and schedules the writes and relights that edits make necessary.
//!
//! ## Residency
//!
//! A loaded chunk lives in exactly one of three places:
//!
//! * the **window**, a small direct-mapped square around the most recent lookup
//! * the **soft cache**, a bounded LRU map behind the window
//! * the **evicted list**, for chunks pushed out of the soft cache while
//!   still dirty or still held by a caller
//!
//! Moving a chunk between them is a move of its handle, never a copy, so two
//! lookups of the same coordinate always see the same chunk. Chunks on the
//! evicted list are flushed on the next cleanup pass and dropped once clean.
//!
//! ## Lookup Order
//!
//! 1. Window hit: return it.
//! 2. Outside the window: recentre the window on the coordinate. Chunks that
//!    still owe their neighbours a notification are flushed of it first, and
//!    everything the window held moves to the soft cache.
//! 3. Soft cache or evicted list hit: move it into the window.
//! 4. Read it from the store. A read error is logged and treated as a miss.
//! 5. On a miss, create an empty chunk if asked to, marked for file creation.
//!
//! ## Flushing
//!
//! Flushing a chunk runs, in order:
//!
//! 1. **Notify**: load its 8 neighbours without moving the window and mark
//!    each one's light stale.
//! 2. **Relight**: when lighting is enabled, relight the `span x span`
//!    neighbourhood centred on the chunk.
//! 3. **Write**: store the chunk. Failed writes are retried on later flushes
//!    and dropped after `max_write_attempts` consecutive failures.
//!
//! Notifying dirties other chunks, so a full unload repeats until a pass
//! produces no new work.
//!
//! ## Lifetime
//!
//! Call [`ChunkManager::close_all`] when done. Dropping a manager that was
//! never closed runs the same unload as a fallback, logged as a warning; it
//! cannot report errors and is not a substitute for closing.
//!
//! ## Locking
//!
//! Chunk handles are [`MtResource`]s. Release every guard on a chunk before
//! calling back into the manager: flushing takes write locks on the chunks it
//! touches and would deadlock against a guard held by the same thread.

use std::collections::HashSet;
use std::num::NonZeroUsize;

use log::{debug, error, info, trace, warn};
use lru::LruCache;
use web_time::Instant;

use crate::core::MtResource;
use crate::error::{WorldError, WorldResult};
use crate::world_state::lighting::ChunkRelighter;
use crate::world_state::storage::{ChunkAccess, RegionInfo};
use crate::world_state::voxels::chunk::{Chunk, ChunkCoord, HeightMap};

pub mod config;
pub mod stats;
pub mod tracked_chunk;
pub mod window;

pub use config::ChunkManagerConfig;
pub use stats::ManagerStats;
pub use tracked_chunk::{CleanupQueue, DirtyFlags, TrackedChunk};
pub use window::ChunkWindow;

/// Shared handle to a chunk owned by a [`ChunkManager`].
pub type ChunkHandle = MtResource<TrackedChunk>;

/// How a lookup may disturb the tiers.
#[derive(Clone, Copy, Debug)]
struct Lookup {
    /// Refresh the chunk's cache position.
    priority: bool,
    /// Recentre the window if the coordinate is outside it.
    move_window: bool,
    /// Synthesize the chunk if the store has none.
    create: bool,
}

impl Lookup {
    const CALLER: Self = Self {
        priority: true,
        move_window: true,
        create: false,
    };
    const NEIGHBOR: Self = Self {
        priority: false,
        move_window: false,
        create: false,
    };
}

/// Windowed chunk cache over a backing store.
///
/// # Examples
///
/// ```
/// use cgmath::Point3;
/// use world_tools::world_state::chunk_manager::ChunkManager;
/// use world_tools::world_state::storage::MemoryChunkAccess;
/// use world_tools::world_state::voxels::chunk::ChunkCoord;
///
/// let mut manager = ChunkManager::new(MemoryChunkAccess::new()).unwrap();
///
/// let chunk = manager.get_chunk(ChunkCoord::new(0, 0), true).unwrap();
/// chunk.get_mut().set_block_id(Point3::new(8, 64, 8), 1);
/// drop(chunk);
///
/// manager.close_all().unwrap();
/// assert!(manager.access().contains(ChunkCoord::new(0, 0)));
/// ```
pub struct ChunkManager<A: ChunkAccess> {
    access: A,
    config: ChunkManagerConfig,
    window: ChunkWindow,
    cache: LruCache<ChunkCoord, ChunkHandle>,
    evicted: Vec<ChunkHandle>,
    relighter: ChunkRelighter,
    cleanup: CleanupQueue,
    stats: ManagerStats,
    closed: bool,
}

impl<A: ChunkAccess> ChunkManager<A> {
    /// Creates a manager over `access` with the default configuration.
    ///
    /// # Errors
    /// Never fails with the default configuration; the result mirrors
    /// [`ChunkManager::with_config`].
    pub fn new(access: A) -> WorldResult<Self> {
        Self::with_config(access, ChunkManagerConfig::default())
    }

    /// Creates a manager over `access`.
    ///
    /// # Errors
    /// Returns [`WorldError::InvalidConfig`] if `config` fails validation.
    pub fn with_config(access: A, config: ChunkManagerConfig) -> WorldResult<Self> {
        config.validate()?;
        let capacity = NonZeroUsize::new(config.cache_capacity).ok_or_else(|| {
            WorldError::InvalidConfig("cache_capacity must be at least 1".to_string())
        })?;

        Ok(Self {
            access,
            window: ChunkWindow::new(config.window_scale),
            cache: LruCache::new(capacity),
            evicted: Vec::new(),
            relighter: ChunkRelighter::new(config.span)?,
            cleanup: CleanupQueue::new(Vec::new()),
            stats: ManagerStats::default(),
            closed: false,
            config,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &ChunkManagerConfig {
        &self.config
    }

    /// Turns relighting on flush on or off.
    pub fn set_lighting_enabled(&mut self, enabled: bool) {
        self.config.lighting_enabled = enabled;
    }

    /// Whether flushing relights chunks.
    pub fn lighting_enabled(&self) -> bool {
        self.config.lighting_enabled
    }

    /// Counters since the manager was created.
    pub fn stats(&self) -> ManagerStats {
        self.stats
    }

    /// The backing store.
    pub fn access(&self) -> &A {
        &self.access
    }

    /// The backing store, mutably. Chunks written here directly are not seen
    /// by chunks the manager already holds.
    pub fn access_mut(&mut self) -> &mut A {
        &mut self.access
    }

    /// Regions listed by the backing store.
    ///
    /// # Errors
    /// Propagates the store's error.
    pub fn regions(&self) -> WorldResult<Vec<RegionInfo>> {
        self.access.regions()
    }

    /// Number of chunks currently held in memory.
    pub fn resident_count(&self) -> usize {
        self.window.len() + self.cache.len() + self.evicted.len()
    }

    /// Number of chunks in the soft cache.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Number of chunk coordinates waiting for a cleanup pass.
    pub fn pending_cleanup(&self) -> usize {
        self.cleanup.get().len()
    }

    /// Looks up the chunk at `coord`.
    ///
    /// Returns `None` when the store has no such chunk and `create` is
    /// false. With `create` set, a missing chunk is created empty and will
    /// be written on its first flush.
    ///
    /// Runs a cleanup pass afterwards once enough chunks are queued.
    pub fn get_chunk(&mut self, coord: ChunkCoord, create: bool) -> Option<ChunkHandle> {
        self.closed = false;
        let chunk = self.lookup(coord, Lookup { create, ..Lookup::CALLER });
        self.do_cleanup(self.config.cleanup_threshold);
        chunk
    }

    /// Flushes every queued chunk now, regardless of the threshold.
    ///
    /// Returns whether the pass produced further work.
    pub fn flush_pending(&mut self) -> bool {
        self.do_cleanup(0)
    }

    /// Flushes every resident chunk until nothing is dirty, then empties
    /// every tier.
    pub fn unload_all(&mut self) {
        let start = Instant::now();
        debug!("Unloading {} chunks", self.resident_count());

        self.invalidate_window_lights();

        let mut passes = 0;
        loop {
            passes += 1;
            let mut pending = false;
            for handle in self.resident_handles() {
                pending |= self.flush_changes(&handle);
            }
            pending |= self.do_cleanup(0);
            pending |= self.flush_evicted();

            if !pending && !self.any_dirty() {
                break;
            }
        }

        self.window.drain();
        self.cache.clear();
        self.evicted.clear();

        info!(
            "Unloaded all chunks in {} passes ({:?}), {} reads, {} writes",
            passes,
            start.elapsed(),
            self.stats.reads,
            self.stats.writes
        );
    }

    /// Unloads everything and closes the backing store.
    ///
    /// # Errors
    /// Propagates the store's error from closing.
    pub fn close_all(&mut self) -> WorldResult<()> {
        self.unload_all();
        self.closed = true;
        self.access.close_all()
    }

    fn lookup(&mut self, coord: ChunkCoord, lookup: Lookup) -> Option<ChunkHandle> {
        if let Some(handle) = self.window.get(coord) {
            self.stats.window_hits += 1;
            return Some(handle.clone());
        }
        if !self.window.contains(coord) && lookup.move_window {
            self.recenter(coord);
        }
        trace!("Window miss for chunk {coord}");
        let in_window = self.window.contains(coord);

        let cached = if lookup.priority {
            self.cache.get(&coord).cloned()
        } else {
            self.cache.peek(&coord).cloned()
        };
        if let Some(handle) = cached {
            self.stats.cache_hits += 1;
            if in_window {
                self.cache.pop(&coord);
                self.window.insert(coord, handle.clone());
            }
            return Some(handle);
        }

        if let Some(index) = self
            .evicted
            .iter()
            .position(|handle| handle.get().coord() == coord)
        {
            trace!("Rescued evicted chunk {coord}");
            let handle = self.evicted.swap_remove(index);
            self.install(coord, handle.clone(), in_window, lookup.priority);
            return Some(handle);
        }
        trace!("Cache miss for chunk {coord}");

        let handle = match self.read_chunk(coord) {
            Some(chunk) => MtResource::new(TrackedChunk::new(chunk, self.cleanup.clone())),
            None if lookup.create => {
                debug!("Creating chunk {coord}");
                self.stats.chunks_created += 1;
                let mut tracked = TrackedChunk::new(Chunk::new(coord), self.cleanup.clone());
                tracked.invalidate_file();
                MtResource::new(tracked)
            }
            None => return None,
        };

        self.install(coord, handle.clone(), in_window, lookup.priority);
        Some(handle)
    }

    fn install(&mut self, coord: ChunkCoord, handle: ChunkHandle, in_window: bool, priority: bool) {
        if in_window {
            self.window.insert(coord, handle);
        } else {
            self.insert_cache(coord, handle, priority);
        }
    }

    fn insert_cache(&mut self, coord: ChunkCoord, handle: ChunkHandle, priority: bool) {
        let displaced = self.cache.push(coord, handle);
        if !priority {
            self.cache.demote(&coord);
        }

        let Some((old_coord, old)) = displaced else {
            return;
        };
        if old_coord == coord {
            return;
        }
        self.stats.evictions += 1;

        let keep = old.get().is_dirty(self.config.lighting_enabled) || old.handle_count() > 1;
        if keep {
            trace!("Evicted chunk {old_coord} is still in use");
            self.evicted.push(old);
        } else {
            trace!("Dropped chunk {old_coord}");
        }
    }

    fn recenter(&mut self, coord: ChunkCoord) {
        if self.config.lighting_enabled {
            self.invalidate_window_lights();
        }
        for (held, handle) in self.window.recenter(coord) {
            self.insert_cache(held, handle, true);
        }
        trace!("Window moved to {}", self.window.origin());
    }

    /// Notifies the neighbours of every windowed chunk that still owes it.
    fn invalidate_window_lights(&mut self) {
        let held: Vec<ChunkHandle> = self.window.handles().cloned().collect();
        for handle in held {
            let notify = handle.get().needs_neighbor_notify();
            if notify {
                self.notify_neighbors(&handle);
            }
        }
    }

    fn notify_neighbors(&mut self, handle: &ChunkHandle) {
        let coord = handle.get().coord();
        for neighbor in coord.neighbors() {
            if let Some(chunk) = self.lookup(neighbor, Lookup::NEIGHBOR) {
                chunk.get_mut().invalidate_lights();
            }
        }
        self.cache.promote(&coord);
        handle.get_mut().validate_neighbor_notify();
    }

    /// Runs the flush protocol on one chunk. Returns whether neighbours were notified.
    fn flush_changes(&mut self, handle: &ChunkHandle) -> bool {
        let mut pending = false;

        let notify = handle.get().needs_neighbor_notify();
        if notify {
            self.notify_neighbors(handle);
            pending = true;
        }

        let relight = self.config.lighting_enabled && handle.get().needs_relight();
        if relight {
            self.relight_chunk(handle);
        }

        let write = handle.get().needs_write();
        if write {
            self.write_chunk(handle);
        }

        pending
    }

    fn relight_chunk(&mut self, handle: &ChunkHandle) {
        let span = self.relighter.span();
        let half = (span / 2) as i32;
        let centre = span * span / 2;
        let coord = handle.get().coord();

        let mut neighbourhood: Vec<Option<ChunkHandle>> = Vec::with_capacity(span * span);
        for z in 0..span {
            for x in 0..span {
                let index = x + z * span;
                if index == centre {
                    neighbourhood.push(Some(handle.clone()));
                } else {
                    let at = coord.offset(x as i32 - half, z as i32 - half);
                    neighbourhood.push(self.lookup(at, Lookup::NEIGHBOR));
                }
            }
        }

        // The relighter rebuilds every height map it is given, ring included.
        let mut reshaped = vec![false; span * span];
        let result = {
            let mut guards: Vec<_> = neighbourhood
                .iter()
                .map(|slot| slot.as_ref().map(|h| h.get_mut()))
                .collect();
            let mut chunks: Vec<Option<&mut Chunk>> = guards
                .iter_mut()
                .map(|guard| guard.as_mut().map(|g| &mut g.chunk))
                .collect();
            let heights: Vec<Option<HeightMap>> = chunks
                .iter()
                .map(|chunk| chunk.as_ref().map(|c| c.height_map().clone()))
                .collect();

            let result = self.relighter.light_chunks(&mut chunks);

            for (i, (chunk, before)) in chunks.iter().zip(&heights).enumerate() {
                if let (Some(chunk), Some(before)) = (chunk, before) {
                    reshaped[i] = chunk.height_map() != before;
                }
            }
            result
        };
        if let Err(e) = result {
            error!("Relighting chunk {coord} failed: {e}");
        }
        self.stats.relights += 1;

        handle.get_mut().validate_lights();
        for (i, slot) in neighbourhood.iter().enumerate() {
            let (x, z) = (i % span, i / span);
            let inner = !self.relighter.is_outer_ring(x, z);
            if i == centre || !(inner || reshaped[i]) {
                continue;
            }
            if let Some(chunk) = slot {
                chunk.get_mut().invalidate_write();
            }
        }
    }

    fn write_chunk(&mut self, handle: &ChunkHandle) {
        let result = {
            let tracked = handle.get();
            self.access.write_chunk(tracked.chunk())
        };

        let mut tracked = handle.get_mut();
        match result {
            Ok(()) => {
                tracked.validate_file();
                self.stats.writes += 1;
            }
            Err(e) => {
                self.stats.write_failures += 1;
                let attempts = tracked.record_write_failure();
                error!(
                    "Writing chunk {} failed (attempt {attempts}): {e}",
                    tracked.coord()
                );
                if attempts >= self.config.max_write_attempts {
                    tracked.abandon_write();
                    self.stats.abandoned_writes += 1;
                }
            }
        }
    }

    fn read_chunk(&mut self, coord: ChunkCoord) -> Option<Chunk> {
        match self.access.read_chunk(coord) {
            Ok(Some(chunk)) => {
                self.stats.reads += 1;
                Some(chunk)
            }
            Ok(None) => None,
            Err(e) => {
                error!("Reading chunk {coord} failed: {e}");
                None
            }
        }
    }

    /// Flushes every queued chunk if at least `minimum` are queued.
    fn do_cleanup(&mut self, minimum: usize) -> bool {
        let batch = {
            let mut queue = self.cleanup.get_mut();
            if queue.len() < minimum {
                return false;
            }
            std::mem::take(&mut *queue)
        };
        if !batch.is_empty() {
            debug!("Cleaning up {} chunks", batch.len());
        }

        let mut pending = false;
        let mut seen = HashSet::with_capacity(batch.len());
        for coord in batch {
            if !seen.insert(coord) {
                continue;
            }
            if let Some(handle) = self.find_resident(coord) {
                handle.get_mut().dequeue();
                pending |= self.flush_changes(&handle);
            }
        }
        pending |= self.flush_evicted();
        pending
    }

    /// Flushes dirty chunks on the evicted list and drops the ones no longer needed.
    fn flush_evicted(&mut self) -> bool {
        let lighting = self.config.lighting_enabled;
        let mut pending = false;

        let snapshot = self.evicted.clone();
        for handle in &snapshot {
            let dirty = handle.get().is_dirty(lighting);
            if dirty {
                pending |= self.flush_changes(handle);
            }
        }
        drop(snapshot);

        self.evicted
            .retain(|handle| handle.get().is_dirty(lighting) || handle.handle_count() > 1);
        pending
    }

    fn find_resident(&self, coord: ChunkCoord) -> Option<ChunkHandle> {
        if let Some(handle) = self.window.get(coord) {
            return Some(handle.clone());
        }
        if let Some(handle) = self.cache.peek(&coord) {
            return Some(handle.clone());
        }
        self.evicted
            .iter()
            .find(|handle| handle.get().coord() == coord)
            .cloned()
    }

    fn resident_handles(&self) -> Vec<ChunkHandle> {
        self.window
            .handles()
            .chain(self.cache.iter().map(|(_, handle)| handle))
            .chain(self.evicted.iter())
            .cloned()
            .collect()
    }

    fn any_dirty(&self) -> bool {
        let lighting = self.config.lighting_enabled;
        self.resident_handles()
            .iter()
            .any(|handle| handle.get().is_dirty(lighting))
    }
}

impl<A: ChunkAccess> Drop for ChunkManager<A> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if self.resident_count() > 0 {
            warn!(
                "ChunkManager dropped without close_all; unloading {} chunks",
                self.resident_count()
            );
        }
        self.unload_all();
        if let Err(e) = self.access.close_all() {
            error!("Closing the chunk store failed: {e}");
        }
    }
}
