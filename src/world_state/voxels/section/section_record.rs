//! # Section Record Module
//!
//! The persisted form of a [`Section`]: a tagged compound with the fields
//! `Y`, `Blocks`, `Data`, `SkyLight`, and `BlockLight`. Field names are fixed
//! by the on-disk format, hence the explicit serde renames.

use serde::{Deserialize, Serialize};

use crate::error::{WorldError, WorldResult};

use super::{nibble_array::NibbleArray, Section, SECTION_NIBBLE_BYTES, SECTION_VOLUME};

/// One section as stored by a backing store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRecord {
    /// Vertical index of the section within its chunk.
    #[serde(rename = "Y")]
    pub y: i8,
    /// One block id per voxel, 4096 bytes.
    #[serde(rename = "Blocks")]
    pub blocks: Vec<u8>,
    /// Packed 4-bit metadata, 2048 bytes.
    #[serde(rename = "Data")]
    pub data: Vec<u8>,
    /// Packed 4-bit sky light, 2048 bytes.
    #[serde(rename = "SkyLight")]
    pub sky_light: Vec<u8>,
    /// Packed 4-bit block light, 2048 bytes.
    #[serde(rename = "BlockLight")]
    pub block_light: Vec<u8>,
}

impl Section {
    /// Encodes the section into its persisted record.
    pub fn to_record(&self) -> SectionRecord {
        SectionRecord {
            y: self.y() as i8,
            blocks: self.blocks.clone(),
            data: self.metadata.as_bytes().to_vec(),
            sky_light: self.sky_light.as_bytes().to_vec(),
            block_light: self.block_light.as_bytes().to_vec(),
        }
    }

    /// Decodes a persisted record.
    ///
    /// # Errors
    /// Returns [`WorldError::SectionFormat`] when any array does not match the
    /// section volume (4096 bytes of ids, 2048 bytes per packed array). The
    /// record is rejected outright; nothing is truncated or padded.
    pub fn from_record(record: SectionRecord) -> WorldResult<Self> {
        check_len("Blocks", &record.blocks, SECTION_VOLUME)?;
        check_len("Data", &record.data, SECTION_NIBBLE_BYTES)?;
        check_len("SkyLight", &record.sky_light, SECTION_NIBBLE_BYTES)?;
        check_len("BlockLight", &record.block_light, SECTION_NIBBLE_BYTES)?;

        Section::from_parts(
            record.y as i32,
            record.blocks,
            NibbleArray::from_bytes(record.data),
            NibbleArray::from_bytes(record.block_light),
            NibbleArray::from_bytes(record.sky_light),
        )
    }
}

fn check_len(field: &'static str, bytes: &[u8], expected: usize) -> WorldResult<()> {
    if bytes.len() == expected {
        Ok(())
    } else {
        Err(WorldError::SectionFormat {
            field,
            expected,
            actual: bytes.len(),
        })
    }
}
