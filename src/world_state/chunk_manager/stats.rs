//! Counters kept by the chunk manager.

/// Running totals for one [`ChunkManager`](super::ChunkManager).
///
/// Returned by value from [`ChunkManager::stats`](super::ChunkManager::stats).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ManagerStats {
    /// Chunks read from the backing store.
    pub reads: u64,
    /// Chunks written to the backing store.
    pub writes: u64,
    /// Writes the backing store rejected.
    pub write_failures: u64,
    /// Pending writes dropped after too many failures.
    pub abandoned_writes: u64,
    /// Chunks synthesized because the store had none.
    pub chunks_created: u64,
    /// Relight passes run.
    pub relights: u64,
    /// Lookups answered by the window.
    pub window_hits: u64,
    /// Lookups answered by the soft cache.
    pub cache_hits: u64,
    /// Chunks pushed out of the soft cache.
    pub evictions: u64,
}

impl ManagerStats {
    /// Whether any write has failed so far.
    pub fn has_write_failures(&self) -> bool {
        self.write_failures > 0
    }
}
