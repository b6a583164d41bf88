//! In-memory chunk store.

use std::collections::HashMap;

use log::trace;

use crate::error::WorldResult;
use crate::world_state::voxels::chunk::{Chunk, ChunkCoord, ChunkRecord};

use super::{group_regions, ChunkAccess, RegionInfo};

/// Keeps chunk records in a map.
///
/// Chunks are stored in their record form, so a write followed by a read
/// returns an independent copy, the same as a store on disk would.
#[derive(Clone, Debug, Default)]
pub struct MemoryChunkAccess {
    records: HashMap<ChunkCoord, ChunkRecord>,
}

impl MemoryChunkAccess {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored chunks.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether a chunk is stored at `coord`.
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.records.contains_key(&coord)
    }

    /// The stored record at `coord`.
    pub fn record(&self, coord: ChunkCoord) -> Option<&ChunkRecord> {
        self.records.get(&coord)
    }

    /// Stores `chunk` directly, bypassing any manager.
    pub fn insert(&mut self, chunk: &Chunk) {
        self.records.insert(chunk.coord(), chunk.to_record());
    }
}

impl ChunkAccess for MemoryChunkAccess {
    fn read_chunk(&mut self, coord: ChunkCoord) -> WorldResult<Option<Chunk>> {
        trace!("Reading chunk {coord} from memory");
        self.records
            .get(&coord)
            .cloned()
            .map(Chunk::from_record)
            .transpose()
    }

    fn write_chunk(&mut self, chunk: &Chunk) -> WorldResult<()> {
        trace!("Writing chunk {} to memory", chunk.coord());
        self.insert(chunk);
        Ok(())
    }

    fn regions(&self) -> WorldResult<Vec<RegionInfo>> {
        Ok(group_regions(self.records.keys().copied()))
    }

    fn close_all(&mut self) -> WorldResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;

    #[test]
    fn written_chunks_read_back_as_copies() {
        let mut store = MemoryChunkAccess::new();
        let mut chunk = Chunk::new(ChunkCoord::new(1, 1));
        chunk.set_block_id(Point3::new(1, 1, 1), 3);
        store.write_chunk(&chunk).unwrap();

        chunk.set_block_id(Point3::new(1, 1, 1), 4);
        let read = store.read_chunk(ChunkCoord::new(1, 1)).unwrap().unwrap();
        assert_eq!(read.block_id(Point3::new(1, 1, 1)), 3);
    }

    #[test]
    fn missing_chunk_reads_as_none() {
        let mut store = MemoryChunkAccess::new();
        assert!(store.read_chunk(ChunkCoord::ZERO).unwrap().is_none());
    }

    #[test]
    fn regions_list_stored_chunks() {
        let mut store = MemoryChunkAccess::new();
        store.insert(&Chunk::new(ChunkCoord::new(0, 0)));
        store.insert(&Chunk::new(ChunkCoord::new(40, 0)));

        let regions = store.regions().unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[1].chunks, vec![ChunkCoord::new(40, 0)]);
    }
}
