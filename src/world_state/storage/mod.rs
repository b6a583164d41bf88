//! # Storage Module
//!
//! The backing store a [`ChunkManager`](crate::world_state::chunk_manager::ChunkManager)
//! reads chunks from and writes them back to.
//!
//! ## Implementations
//!
//! * [`MemoryChunkAccess`] - chunk records held in a map, for tests and tools
//! * [`DirectoryChunkAccess`] - one JSON record file per chunk in a directory
//!
//! Stores group their chunks into 32x32-chunk regions for listing, see
//! [`RegionInfo`].

use std::collections::BTreeMap;

use crate::error::WorldResult;
use crate::world_state::voxels::chunk::{Chunk, ChunkCoord};

pub mod directory_access;
pub mod memory_access;

pub use directory_access::DirectoryChunkAccess;
pub use memory_access::MemoryChunkAccess;

/// A persistent store of chunks.
pub trait ChunkAccess {
    /// Reads the chunk at `coord`.
    ///
    /// Returns `Ok(None)` when the store holds no such chunk.
    fn read_chunk(&mut self, coord: ChunkCoord) -> WorldResult<Option<Chunk>>;

    /// Writes `chunk`, replacing any stored version.
    fn write_chunk(&mut self, chunk: &Chunk) -> WorldResult<()>;

    /// Lists every region that holds at least one chunk.
    fn regions(&self) -> WorldResult<Vec<RegionInfo>>;

    /// Releases any open resources. The store stays usable afterwards.
    fn close_all(&mut self) -> WorldResult<()>;
}

/// A 32x32-chunk region and the chunks stored in it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionInfo {
    /// Region X coordinate.
    pub x: i32,
    /// Region Z coordinate.
    pub z: i32,
    /// Stored chunks of the region, sorted.
    pub chunks: Vec<ChunkCoord>,
}

/// Groups chunk coordinates by region, ordered by region then chunk.
pub fn group_regions(coords: impl IntoIterator<Item = ChunkCoord>) -> Vec<RegionInfo> {
    let mut regions: BTreeMap<(i32, i32), Vec<ChunkCoord>> = BTreeMap::new();
    for coord in coords {
        regions.entry(coord.region()).or_default().push(coord);
    }

    regions
        .into_iter()
        .map(|((x, z), mut chunks)| {
            chunks.sort();
            chunks.dedup();
            RegionInfo { x, z, chunks }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_are_grouped_by_region() {
        let regions = group_regions([
            ChunkCoord::new(33, 0),
            ChunkCoord::new(-1, 5),
            ChunkCoord::new(2, 3),
            ChunkCoord::new(0, 0),
        ]);

        assert_eq!(regions.len(), 3);
        assert_eq!((regions[0].x, regions[0].z), (-1, 0));
        assert_eq!(
            regions[1],
            RegionInfo {
                x: 0,
                z: 0,
                chunks: vec![ChunkCoord::new(0, 0), ChunkCoord::new(2, 3)],
            }
        );
        assert_eq!((regions[2].x, regions[2].z), (1, 0));
    }
}
