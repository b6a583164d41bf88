//! # Directory Store Module
//!
//! Stores each chunk as a JSON [`ChunkRecord`] in its own file,
//! `c.<x>.<z>.json`, directly under a root directory.
//!
//! Writes go to a `.tmp` sibling first and are renamed into place, so a
//! crash mid-write leaves the previous version intact.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::error::WorldResult;
use crate::world_state::voxels::chunk::{Chunk, ChunkCoord, ChunkRecord};

use super::{group_regions, ChunkAccess, RegionInfo};

const FILE_PREFIX: &str = "c.";
const FILE_SUFFIX: &str = ".json";

/// A chunk store backed by a directory of record files.
#[derive(Debug)]
pub struct DirectoryChunkAccess {
    root: PathBuf,
}

impl DirectoryChunkAccess {
    /// Opens `root`, creating the directory if it does not exist.
    ///
    /// # Errors
    /// Returns [`WorldError::Io`](crate::error::WorldError::Io) if the
    /// directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> WorldResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!("Opened chunk directory {}", root.display());
        Ok(Self { root })
    }

    /// The directory chunks are stored in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the record file for `coord`.
    pub fn chunk_path(&self, coord: ChunkCoord) -> PathBuf {
        self.root
            .join(format!("{FILE_PREFIX}{}.{}{FILE_SUFFIX}", coord.x, coord.z))
    }

    fn parse_file_name(name: &str) -> Option<ChunkCoord> {
        let body = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
        let (x, z) = body.split_once('.')?;
        Some(ChunkCoord::new(x.parse().ok()?, z.parse().ok()?))
    }
}

impl ChunkAccess for DirectoryChunkAccess {
    fn read_chunk(&mut self, coord: ChunkCoord) -> WorldResult<Option<Chunk>> {
        let path = self.chunk_path(coord);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        trace!("Reading chunk {coord} from {}", path.display());
        let record: ChunkRecord = serde_json::from_reader(BufReader::new(file))?;
        Ok(Some(Chunk::from_record(record)?))
    }

    fn write_chunk(&mut self, chunk: &Chunk) -> WorldResult<()> {
        let path = self.chunk_path(chunk.coord());
        let tmp_path = path.with_extension("json.tmp");
        trace!("Writing chunk {} to {}", chunk.coord(), path.display());

        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            serde_json::to_writer(&mut writer, &chunk.to_record())?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn regions(&self) -> WorldResult<Vec<RegionInfo>> {
        let mut coords = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if let Some(coord) = entry.file_name().to_str().and_then(Self::parse_file_name) {
                coords.push(coord);
            }
        }
        Ok(group_regions(coords))
    }

    fn close_all(&mut self) -> WorldResult<()> {
        debug!("Closed chunk directory {}", self.root.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;
    use crate::error::WorldError;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("world-tools-{:016x}", fastrand::u64(..)))
    }

    #[test]
    fn file_names_parse_back_to_coordinates() {
        assert_eq!(
            DirectoryChunkAccess::parse_file_name("c.-3.12.json"),
            Some(ChunkCoord::new(-3, 12))
        );
        assert_eq!(DirectoryChunkAccess::parse_file_name("c.1.json"), None);
        assert_eq!(DirectoryChunkAccess::parse_file_name("c.1.2.json.tmp"), None);
        assert_eq!(DirectoryChunkAccess::parse_file_name("level.dat"), None);
    }

    #[test]
    fn chunks_survive_a_reopen() {
        let dir = scratch_dir();
        let mut chunk = Chunk::new(ChunkCoord::new(-3, 12));
        chunk.set_block_id(Point3::new(4, 70, 9), 89);

        {
            let mut store = DirectoryChunkAccess::open(&dir).unwrap();
            store.write_chunk(&chunk).unwrap();
            store.close_all().unwrap();
        }

        let mut store = DirectoryChunkAccess::open(&dir).unwrap();
        let read = store.read_chunk(ChunkCoord::new(-3, 12)).unwrap().unwrap();
        assert_eq!(read, chunk);
        assert!(store.read_chunk(ChunkCoord::ZERO).unwrap().is_none());

        let regions = store.regions().unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].chunks, vec![ChunkCoord::new(-3, 12)]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = scratch_dir();
        let mut store = DirectoryChunkAccess::open(&dir).unwrap();
        fs::write(store.chunk_path(ChunkCoord::ZERO), b"{ not json").unwrap();

        assert!(matches!(
            store.read_chunk(ChunkCoord::ZERO),
            Err(WorldError::Json(_))
        ));

        fs::remove_dir_all(&dir).unwrap();
    }
}
