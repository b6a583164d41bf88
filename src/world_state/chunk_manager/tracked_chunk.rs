//! # Tracked Chunk Module
//!
//! A [`Chunk`] together with the bookkeeping the manager needs to decide
//! what still has to happen to it before it can be dropped.
//!
//! Mutations made through a `TrackedChunk` set the matching dirty flags and,
//! the first time the chunk becomes dirty, put its coordinate on the
//! manager's cleanup queue.

use cgmath::Point3;
use log::error;

use crate::core::MtResource;
use crate::world_state::voxels::block::BlockId;
use crate::world_state::voxels::chunk::{Chunk, ChunkCoord};
use crate::world_state::voxels::section::LightChannel;

/// Coordinates of chunks waiting for a flush, shared with every tracked chunk.
pub type CleanupQueue = MtResource<Vec<ChunkCoord>>;

/// Work a chunk still owes before it is clean.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirtyFlags {
    /// The chunk differs from its stored version.
    pub needs_write: bool,
    /// The chunk's light field is stale.
    pub needs_relight: bool,
    /// The chunk's geometry changed in a way its neighbours' light can see.
    pub needs_neighbor_notify: bool,
    /// The store has no record of this chunk yet.
    pub needs_file_creation: bool,
}

impl DirtyFlags {
    /// Whether any flag is set.
    pub fn any(&self) -> bool {
        self.needs_write || self.needs_relight || self.needs_neighbor_notify || self.needs_file_creation
    }
}

/// A chunk owned by the manager, with its dirty state.
pub struct TrackedChunk {
    pub(super) chunk: Chunk,
    flags: DirtyFlags,
    write_failures: u32,
    queued: bool,
    cleanup: CleanupQueue,
}

impl TrackedChunk {
    pub(super) fn new(chunk: Chunk, cleanup: CleanupQueue) -> Self {
        Self {
            chunk,
            flags: DirtyFlags::default(),
            write_failures: 0,
            queued: false,
            cleanup,
        }
    }

    /// The chunk's coordinate.
    pub fn coord(&self) -> ChunkCoord {
        self.chunk.coord()
    }

    /// Read access to the chunk.
    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    /// Write access to the chunk.
    ///
    /// The manager cannot see what changes, so this marks the chunk for
    /// rewriting, relighting, and neighbour notification.
    pub fn chunk_mut(&mut self) -> &mut Chunk {
        self.invalidate_blocks();
        &mut self.chunk
    }

    /// Current dirty flags.
    pub fn flags(&self) -> DirtyFlags {
        self.flags
    }

    /// Whether the chunk must be written back.
    pub fn needs_write(&self) -> bool {
        self.flags.needs_write
    }

    /// Whether the chunk's light is stale.
    pub fn needs_relight(&self) -> bool {
        self.flags.needs_relight
    }

    /// Whether the chunk's neighbours must be told to relight.
    pub fn needs_neighbor_notify(&self) -> bool {
        self.flags.needs_neighbor_notify
    }

    /// Whether the store has never seen this chunk.
    pub fn needs_file_creation(&self) -> bool {
        self.flags.needs_file_creation
    }

    /// Block id at chunk-local `pos`.
    pub fn block_id(&self, pos: Point3<usize>) -> BlockId {
        self.chunk.block_id(pos)
    }

    /// Sets the block id at chunk-local `pos`.
    ///
    /// A change marks the chunk for writing, relighting, and neighbour
    /// notification.
    pub fn set_block_id(&mut self, pos: Point3<usize>, id: BlockId) {
        if self.chunk.block_id(pos) == id {
            return;
        }
        self.chunk.set_block_id(pos, id);
        self.invalidate_blocks();
    }

    /// Metadata at chunk-local `pos`.
    pub fn metadata(&self, pos: Point3<usize>) -> u8 {
        self.chunk.metadata(pos)
    }

    /// Sets the metadata at chunk-local `pos`. A change marks the chunk for writing.
    pub fn set_metadata(&mut self, pos: Point3<usize>, value: u8) {
        if self.chunk.metadata(pos) == value & 0xF {
            return;
        }
        self.chunk.set_metadata(pos, value);
        self.invalidate_data();
    }

    /// Light of `channel` at chunk-local `pos`.
    pub fn light(&self, channel: LightChannel, pos: Point3<usize>) -> u8 {
        self.chunk.light(channel, pos)
    }

    /// Marks the chunk's light as stale.
    pub fn invalidate_lights(&mut self) {
        self.flags.needs_relight = true;
        self.flags.needs_write = true;
        self.request_cleanup();
    }

    /// Marks the chunk as unknown to the store.
    pub fn invalidate_file(&mut self) {
        self.flags.needs_file_creation = true;
        self.flags.needs_write = true;
        self.request_cleanup();
    }

    fn invalidate_blocks(&mut self) {
        self.flags.needs_neighbor_notify = true;
        self.flags.needs_relight = true;
        self.flags.needs_write = true;
        self.request_cleanup();
    }

    fn invalidate_data(&mut self) {
        self.flags.needs_write = true;
        self.request_cleanup();
    }

    pub(super) fn invalidate_write(&mut self) {
        self.invalidate_data();
    }

    pub(super) fn validate_lights(&mut self) {
        self.flags.needs_relight = false;
    }

    pub(super) fn validate_neighbor_notify(&mut self) {
        self.flags.needs_neighbor_notify = false;
    }

    pub(super) fn validate_file(&mut self) {
        self.flags.needs_write = false;
        self.flags.needs_file_creation = false;
        self.write_failures = 0;
    }

    /// Counts a failed write and returns the consecutive failure count.
    pub(super) fn record_write_failure(&mut self) -> u32 {
        self.write_failures += 1;
        self.write_failures
    }

    /// Drops the pending write after repeated failures.
    pub(super) fn abandon_write(&mut self) {
        error!(
            "Dropping pending write for chunk {} after {} failures",
            self.coord(),
            self.write_failures
        );
        self.flags.needs_write = false;
        self.write_failures = 0;
    }

    /// Takes the chunk off the cleanup queue's books before it is flushed.
    pub(super) fn dequeue(&mut self) {
        self.queued = false;
    }

    /// Whether the chunk still has work the manager must do before dropping it.
    pub(super) fn is_dirty(&self, lighting_enabled: bool) -> bool {
        self.flags.needs_write
            || self.flags.needs_neighbor_notify
            || (lighting_enabled && self.flags.needs_relight)
    }

    fn request_cleanup(&mut self) {
        if self.queued {
            return;
        }
        self.queued = true;
        let coord = self.coord();
        self.cleanup.get_mut().push(coord);
    }
}

impl std::fmt::Debug for TrackedChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedChunk")
            .field("coord", &self.coord())
            .field("flags", &self.flags)
            .field("write_failures", &self.write_failures)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracked() -> (TrackedChunk, CleanupQueue) {
        let queue = CleanupQueue::new(Vec::new());
        let chunk = TrackedChunk::new(Chunk::new(ChunkCoord::new(3, 4)), queue.clone());
        (chunk, queue)
    }

    #[test]
    fn block_change_sets_every_geometry_flag() {
        let (mut chunk, queue) = tracked();
        chunk.set_block_id(Point3::new(1, 2, 3), 1);

        let flags = chunk.flags();
        assert!(flags.needs_write && flags.needs_relight && flags.needs_neighbor_notify);
        assert!(!flags.needs_file_creation);
        assert_eq!(*queue.get(), vec![ChunkCoord::new(3, 4)]);
    }

    #[test]
    fn unchanged_block_leaves_chunk_clean() {
        let (mut chunk, queue) = tracked();
        chunk.set_block_id(Point3::new(1, 2, 3), 0);

        assert!(!chunk.flags().any());
        assert!(queue.get().is_empty());
    }

    #[test]
    fn metadata_change_only_needs_a_write() {
        let (mut chunk, _queue) = tracked();
        chunk.set_metadata(Point3::new(0, 0, 0), 5);

        assert_eq!(
            chunk.flags(),
            DirtyFlags {
                needs_write: true,
                ..DirtyFlags::default()
            }
        );
    }

    #[test]
    fn chunk_is_queued_once_until_dequeued() {
        let (mut chunk, queue) = tracked();
        chunk.invalidate_lights();
        chunk.invalidate_file();
        assert_eq!(queue.get().len(), 1);

        chunk.dequeue();
        chunk.invalidate_lights();
        assert_eq!(queue.get().len(), 2);
    }

    #[test]
    fn relight_only_counts_when_lighting_is_enabled() {
        let (mut chunk, _queue) = tracked();
        chunk.invalidate_lights();
        chunk.validate_file();

        assert!(chunk.is_dirty(true));
        assert!(!chunk.is_dirty(false));
    }

    #[test]
    fn abandoning_a_write_clears_it() {
        let (mut chunk, _queue) = tracked();
        chunk.invalidate_file();
        assert_eq!(chunk.record_write_failure(), 1);
        assert_eq!(chunk.record_write_failure(), 2);

        chunk.abandon_write();
        assert!(!chunk.needs_write());
        assert_eq!(chunk.record_write_failure(), 1);
    }
}
