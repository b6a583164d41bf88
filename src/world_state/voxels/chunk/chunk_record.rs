//! # Chunk Record Module
//!
//! The persisted form of a [`Chunk`]: its position, the height map as 256
//! integers in column order, and the list of present sections.

use serde::{Deserialize, Serialize};

use crate::error::{WorldError, WorldResult};
use crate::world_state::voxels::section::{Section, SectionRecord};

use super::{Chunk, ChunkCoord, CHUNK_COLUMNS, CHUNK_HEIGHT, CHUNK_SECTIONS, CHUNK_WIDTH};

/// One chunk as stored by a backing store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Chunk X coordinate.
    #[serde(rename = "xPos")]
    pub x_pos: i32,
    /// Chunk Z coordinate.
    #[serde(rename = "zPos")]
    pub z_pos: i32,
    /// Column heights, index `x + z * 16`.
    #[serde(rename = "HeightMap")]
    pub height_map: Vec<i32>,
    /// Present sections, in any order.
    #[serde(rename = "Sections")]
    pub sections: Vec<SectionRecord>,
}

impl ChunkRecord {
    /// Coordinate named by the record.
    pub fn coord(&self) -> ChunkCoord {
        ChunkCoord::new(self.x_pos, self.z_pos)
    }
}

impl Chunk {
    /// Encodes the chunk into its persisted record.
    pub fn to_record(&self) -> ChunkRecord {
        ChunkRecord {
            x_pos: self.coord.x,
            z_pos: self.coord.z,
            height_map: self.heights.iter().map(|h| h as i32).collect(),
            sections: self.sections().map(Section::to_record).collect(),
        }
    }

    /// Decodes a persisted record.
    ///
    /// # Errors
    /// - [`WorldError::ChunkFormat`] if the height map is not 256 entries in
    ///   `[0, 256]`, or if a section's `Y` is out of range or repeated.
    /// - [`WorldError::SectionFormat`] if any section's arrays are malformed.
    pub fn from_record(record: ChunkRecord) -> WorldResult<Self> {
        if record.height_map.len() != CHUNK_COLUMNS {
            return Err(WorldError::ChunkFormat(format!(
                "height map holds {} columns, expected {CHUNK_COLUMNS}",
                record.height_map.len()
            )));
        }

        let mut chunk = Chunk::new(record.coord());

        for (i, &height) in record.height_map.iter().enumerate() {
            if !(0..=CHUNK_HEIGHT as i32).contains(&height) {
                return Err(WorldError::ChunkFormat(format!(
                    "column {i} has height {height}"
                )));
            }
            chunk
                .heights
                .set(i % CHUNK_WIDTH, i / CHUNK_WIDTH, height as usize);
        }

        for section in record.sections {
            if !(0..CHUNK_SECTIONS as i8).contains(&section.y) {
                return Err(WorldError::ChunkFormat(format!(
                    "section y {} is outside the chunk",
                    section.y
                )));
            }
            let y = section.y;
            if chunk.install_section(Section::from_record(section)?).is_some() {
                return Err(WorldError::ChunkFormat(format!("section y {y} appears twice")));
            }
        }

        Ok(chunk)
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;
    use crate::world_state::voxels::block::{BlockTable, BlockType};

    fn sample_chunk() -> Chunk {
        let mut chunk = Chunk::new(ChunkCoord::new(-4, 9));
        chunk.set_block_id(Point3::new(2, 5, 7), BlockType::STONE.id());
        chunk.set_block_id(Point3::new(8, 70, 8), BlockType::GLOWSTONE.id());
        chunk.recompute_heightmap(&BlockTable::default());
        chunk
    }

    #[test]
    fn record_restores_sections_and_heights() {
        let chunk = sample_chunk();
        let restored = Chunk::from_record(chunk.to_record()).unwrap();

        assert_eq!(restored, chunk);
        assert_eq!(restored.coord(), ChunkCoord::new(-4, 9));
        assert_eq!(restored.height(8, 8), 71);
        assert!(restored.section(1).is_none());
    }

    #[test]
    fn record_survives_json() {
        let record = sample_chunk().to_record();
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"xPos\":-4"));

        let decoded: ChunkRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn short_height_map_is_rejected() {
        let mut record = sample_chunk().to_record();
        record.height_map.pop();
        assert!(matches!(
            Chunk::from_record(record),
            Err(WorldError::ChunkFormat(_))
        ));
    }

    #[test]
    fn duplicate_section_is_rejected() {
        let mut record = sample_chunk().to_record();
        let copy = record.sections[0].clone();
        record.sections.push(copy);
        assert!(matches!(
            Chunk::from_record(record),
            Err(WorldError::ChunkFormat(_))
        ));
    }

    #[test]
    fn section_above_the_chunk_is_rejected() {
        let mut record = sample_chunk().to_record();
        record.sections[0].y = 16;
        assert!(matches!(
            Chunk::from_record(record),
            Err(WorldError::ChunkFormat(_))
        ));
    }
}
