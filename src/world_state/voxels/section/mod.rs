//! # Section Module
//!
//! A section is a 16x16x16 block of voxels, the unit a chunk is stacked from.
//! Each voxel carries four values held in parallel arrays:
//!
//! - a block id (one byte per voxel)
//! - metadata, block light, and sky light (4 bits per voxel, packed in
//!   [`NibbleArray`]s)
//!
//! All four arrays address voxel `(x, y, z)` at `x + z * 16 + y * 256`.
//!
//! Accessors take section-local coordinates in `[0, 16)`. Anything outside
//! that range is a caller bug and panics.

use crate::error::{WorldError, WorldResult};

use super::block::BlockId;

pub mod nibble_array;
pub mod section_record;

pub use nibble_array::NibbleArray;
pub use section_record::SectionRecord;

/// Width of a section along X, in voxels.
pub const SECTION_WIDTH: usize = 16;
/// Length of a section along Z, in voxels.
pub const SECTION_LENGTH: usize = 16;
/// Height of a section along Y, in voxels.
pub const SECTION_HEIGHT: usize = 16;
/// Voxels per section.
pub const SECTION_VOLUME: usize = SECTION_WIDTH * SECTION_LENGTH * SECTION_HEIGHT;
/// Bytes needed for one packed 4-bit channel.
pub const SECTION_NIBBLE_BYTES: usize = SECTION_VOLUME / 2;

/// The largest value either light channel can hold.
pub const MAX_LIGHT: u8 = 15;
/// The id every voxel of a fresh section holds.
pub const DEFAULT_BLOCK_ID: BlockId = 0;

/// Selects one of the two light channels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LightChannel {
    /// Light emitted by blocks.
    BlockLight,
    /// Light coming down from the sky.
    SkyLight,
}

/// A 16x16x16 block of voxel data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
    y: i32,
    blocks: Vec<BlockId>,
    metadata: NibbleArray,
    block_light: NibbleArray,
    sky_light: NibbleArray,
}

impl Section {
    /// Creates an all-air, unlit section at vertical index `y`.
    pub fn new(y: i32) -> Self {
        Self {
            y,
            blocks: vec![DEFAULT_BLOCK_ID; SECTION_VOLUME],
            metadata: NibbleArray::new(SECTION_VOLUME),
            block_light: NibbleArray::new(SECTION_VOLUME),
            sky_light: NibbleArray::new(SECTION_VOLUME),
        }
    }

    /// Assembles a section from existing arrays.
    ///
    /// # Errors
    /// Returns [`WorldError::SectionFormat`] if any array does not cover
    /// exactly [`SECTION_VOLUME`] voxels.
    pub fn from_parts(
        y: i32,
        blocks: Vec<BlockId>,
        metadata: NibbleArray,
        block_light: NibbleArray,
        sky_light: NibbleArray,
    ) -> WorldResult<Self> {
        let lengths = [
            ("Blocks", blocks.len()),
            ("Data", metadata.len()),
            ("BlockLight", block_light.len()),
            ("SkyLight", sky_light.len()),
        ];
        if let Some(&(field, actual)) = lengths.iter().find(|(_, len)| *len != SECTION_VOLUME) {
            return Err(WorldError::SectionFormat {
                field,
                expected: SECTION_VOLUME,
                actual,
            });
        }

        Ok(Self {
            y,
            blocks,
            metadata,
            block_light,
            sky_light,
        })
    }

    /// The section's vertical index within its chunk.
    pub fn y(&self) -> i32 {
        self.y
    }

    /// Block id at `(x, y, z)`.
    pub fn block_id(&self, x: usize, y: usize, z: usize) -> BlockId {
        self.blocks[Self::index(x, y, z)]
    }

    /// Sets the block id at `(x, y, z)`.
    pub fn set_block_id(&mut self, x: usize, y: usize, z: usize, id: BlockId) {
        self.blocks[Self::index(x, y, z)] = id;
    }

    /// Metadata at `(x, y, z)`.
    pub fn metadata(&self, x: usize, y: usize, z: usize) -> u8 {
        self.metadata.get(Self::index(x, y, z))
    }

    /// Sets the metadata at `(x, y, z)`, masked to 4 bits.
    pub fn set_metadata(&mut self, x: usize, y: usize, z: usize, value: u8) {
        self.metadata.set(Self::index(x, y, z), value);
    }

    /// Block light at `(x, y, z)`.
    pub fn block_light(&self, x: usize, y: usize, z: usize) -> u8 {
        self.block_light.get(Self::index(x, y, z))
    }

    /// Sets the block light at `(x, y, z)`, masked to 4 bits.
    pub fn set_block_light(&mut self, x: usize, y: usize, z: usize, value: u8) {
        self.block_light.set(Self::index(x, y, z), value);
    }

    /// Sky light at `(x, y, z)`.
    pub fn sky_light(&self, x: usize, y: usize, z: usize) -> u8 {
        self.sky_light.get(Self::index(x, y, z))
    }

    /// Sets the sky light at `(x, y, z)`, masked to 4 bits.
    pub fn set_sky_light(&mut self, x: usize, y: usize, z: usize, value: u8) {
        self.sky_light.set(Self::index(x, y, z), value);
    }

    /// Whether every voxel still holds the default block id.
    pub fn is_empty_air(&self) -> bool {
        self.blocks.iter().all(|&id| id == DEFAULT_BLOCK_ID)
    }

    /// Block id at a flat voxel index.
    #[inline]
    pub(crate) fn block_id_at(&self, index: usize) -> BlockId {
        self.blocks[index]
    }

    /// Light of `channel` at a flat voxel index.
    #[inline]
    pub(crate) fn light_at(&self, channel: LightChannel, index: usize) -> u8 {
        self.channel(channel).get(index)
    }

    /// Sets the light of `channel` at a flat voxel index.
    #[inline]
    pub(crate) fn set_light_at(&mut self, channel: LightChannel, index: usize, value: u8) {
        self.channel_mut(channel).set(index, value);
    }

    /// Resets every voxel of `channel` to `value`.
    pub(crate) fn fill_light(&mut self, channel: LightChannel, value: u8) {
        self.channel_mut(channel).fill(value);
    }

    fn channel(&self, channel: LightChannel) -> &NibbleArray {
        match channel {
            LightChannel::BlockLight => &self.block_light,
            LightChannel::SkyLight => &self.sky_light,
        }
    }

    fn channel_mut(&mut self, channel: LightChannel) -> &mut NibbleArray {
        match channel {
            LightChannel::BlockLight => &mut self.block_light,
            LightChannel::SkyLight => &mut self.sky_light,
        }
    }

    /// Whether `(x, y, z)` lies inside a section.
    #[inline]
    pub fn in_bounds(x: usize, y: usize, z: usize) -> bool {
        x < SECTION_WIDTH && y < SECTION_HEIGHT && z < SECTION_LENGTH
    }

    /// Flat index of `(x, y, z)`.
    ///
    /// # Panics
    /// Panics if any coordinate is outside `[0, 16)`.
    #[inline]
    pub fn index(x: usize, y: usize, z: usize) -> usize {
        assert!(
            Self::in_bounds(x, y, z),
            "voxel ({x}, {y}, {z}) is outside the section"
        );
        x + (z << 4) + (y << 8)
    }
}
