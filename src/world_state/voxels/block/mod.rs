//! # Block Module
//!
//! The read-only block property table the lighting engine consults.
//!
//! Every block id maps to three properties:
//! - **luminance**: the light the block emits on its own (0 = none)
//! - **diffusion**: extra attenuation applied to light entering the block,
//!   on top of the one-unit-per-hop baseline
//! - **opaque**: whether light can be stored in the block at all
//!
//! The standard ids are kept in a compile-time `phf` map; anything not listed
//! there behaves like air.

use phf::phf_map;

pub mod block_type;

pub use block_type::BlockType;

/// The raw per-voxel block id stored in a section.
pub type BlockId = u8;

/// Number of distinct block ids.
pub const BLOCK_ID_COUNT: usize = 256;

/// Lighting-relevant properties of one block id.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockProperties {
    /// Light emitted by the block, in `[0, 15]`.
    pub luminance: u8,
    /// Extra attenuation for light passing into the block.
    pub diffusion: u8,
    /// Whether light is blocked outright.
    pub opaque: bool,
}

impl BlockProperties {
    /// Air: no emission, no attenuation, not opaque.
    pub const AIR: Self = Self::new(0, 0, false);
    /// A plain solid block.
    pub const OPAQUE: Self = Self::new(0, 0, true);

    /// Creates a property set.
    pub const fn new(luminance: u8, diffusion: u8, opaque: bool) -> Self {
        Self {
            luminance,
            diffusion,
            opaque,
        }
    }

    /// A non-opaque block that weakens light passing through it.
    pub const fn diffusing(diffusion: u8) -> Self {
        Self::new(0, diffusion, false)
    }

    /// A block that emits light.
    pub const fn emitting(luminance: u8, opaque: bool) -> Self {
        Self::new(luminance, 0, opaque)
    }

    /// Whether the block stops the sky from being fully visible below it.
    ///
    /// Height maps are computed against this.
    pub const fn attenuates_light(&self) -> bool {
        self.opaque || self.diffusion > 0
    }
}

/// Properties of the standard block ids, keyed by raw id.
static STANDARD_BLOCKS: phf::Map<u8, BlockProperties> = phf_map! {
    1u8 => BlockProperties::OPAQUE,                // stone
    2u8 => BlockProperties::OPAQUE,                // grass
    3u8 => BlockProperties::OPAQUE,                // dirt
    4u8 => BlockProperties::OPAQUE,                // cobblestone
    5u8 => BlockProperties::OPAQUE,                // planks
    7u8 => BlockProperties::OPAQUE,                // bedrock
    8u8 => BlockProperties::diffusing(3),          // water
    9u8 => BlockProperties::diffusing(3),          // stationary water
    10u8 => BlockProperties::emitting(15, true),   // lava
    11u8 => BlockProperties::emitting(15, true),   // stationary lava
    12u8 => BlockProperties::OPAQUE,               // sand
    13u8 => BlockProperties::OPAQUE,               // gravel
    14u8 => BlockProperties::OPAQUE,               // gold ore
    15u8 => BlockProperties::OPAQUE,               // iron ore
    16u8 => BlockProperties::OPAQUE,               // coal ore
    17u8 => BlockProperties::OPAQUE,               // log
    18u8 => BlockProperties::diffusing(1),         // leaves
    20u8 => BlockProperties::AIR,                  // glass
    30u8 => BlockProperties::diffusing(1),         // cobweb
    50u8 => BlockProperties::emitting(14, false),  // torch
    51u8 => BlockProperties::emitting(15, false),  // fire
    76u8 => BlockProperties::emitting(7, false),   // redstone torch
    79u8 => BlockProperties::diffusing(3),         // ice
    89u8 => BlockProperties::emitting(15, true),   // glowstone
    91u8 => BlockProperties::emitting(15, true),   // jack-o-lantern
};

/// A dense lookup table from block id to [`BlockProperties`].
///
/// The default table holds the standard blocks. Individual ids can be
/// overridden with [`BlockTable::set`] before the table is handed to a
/// relighter; once installed it is only ever read.
///
/// # Examples
///
/// ```
/// use world_tools::world_state::voxels::block::{BlockProperties, BlockTable, BlockType};
///
/// let mut table = BlockTable::default();
/// assert_eq!(table.luminance(BlockType::TORCH.id()), 14);
///
/// table.set(200, BlockProperties::diffusing(5));
/// assert_eq!(table.diffusion(200), 5);
/// ```
#[derive(Clone, Debug)]
pub struct BlockTable {
    properties: [BlockProperties; BLOCK_ID_COUNT],
}

impl BlockTable {
    /// A table in which every id behaves like air.
    pub fn empty() -> Self {
        Self {
            properties: [BlockProperties::AIR; BLOCK_ID_COUNT],
        }
    }

    /// Overrides the properties of one id.
    pub fn set(&mut self, id: BlockId, properties: BlockProperties) {
        self.properties[id as usize] = properties;
    }

    /// All properties of `id`.
    #[inline]
    pub fn get(&self, id: BlockId) -> BlockProperties {
        self.properties[id as usize]
    }

    /// Light emitted by `id`.
    #[inline]
    pub fn luminance(&self, id: BlockId) -> u8 {
        self.properties[id as usize].luminance
    }

    /// Extra attenuation of `id`.
    #[inline]
    pub fn diffusion(&self, id: BlockId) -> u8 {
        self.properties[id as usize].diffusion
    }

    /// Whether `id` blocks light.
    #[inline]
    pub fn is_opaque(&self, id: BlockId) -> bool {
        self.properties[id as usize].opaque
    }
}

impl Default for BlockTable {
    fn default() -> Self {
        let mut table = Self::empty();
        for (&id, &properties) in STANDARD_BLOCKS.entries() {
            table.set(id, properties);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn air_is_inert() {
        let table = BlockTable::default();
        assert_eq!(table.get(BlockType::AIR.id()), BlockProperties::AIR);
    }

    #[test]
    fn standard_blocks_are_installed() {
        let table = BlockTable::default();

        assert!(table.is_opaque(BlockType::STONE.id()));
        assert_eq!(table.diffusion(BlockType::WATER.id()), 3);
        assert_eq!(table.luminance(BlockType::GLOWSTONE.id()), 15);
        assert!(!table.is_opaque(BlockType::GLASS.id()));
    }

    #[test]
    fn unknown_ids_default_to_air() {
        let table = BlockTable::default();
        assert_eq!(table.get(250), BlockProperties::AIR);
    }

    #[test]
    fn overrides_replace_one_entry() {
        let mut table = BlockTable::default();
        table.set(BlockType::GLASS.id(), BlockProperties::diffusing(5));

        assert_eq!(table.diffusion(BlockType::GLASS.id()), 5);
        assert!(table.is_opaque(BlockType::STONE.id()));
    }
}
