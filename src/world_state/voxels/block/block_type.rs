//! # Block Type Module
//!
//! Names for the standard block ids the default [`BlockTable`](super::BlockTable)
//! knows about. Block ids in sections are raw bytes; this enum only exists so
//! callers and tests can say `BlockType::TORCH` instead of `50`.

use num_derive::FromPrimitive;

use super::BlockId;

/// The standard block ids.
///
/// The discriminants are the persisted ids, so `BlockType::GLASS as BlockId`
/// is what ends up in a section's `Blocks` array. Ids with no variant are
/// still valid block ids; they simply have default (air-like) properties
/// unless the table overrides them.
#[allow(non_camel_case_types, missing_docs)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u8)]
pub enum BlockType {
    AIR = 0,
    STONE = 1,
    GRASS = 2,
    DIRT = 3,
    COBBLESTONE = 4,
    PLANKS = 5,
    BEDROCK = 7,
    WATER = 8,
    STATIONARY_WATER = 9,
    LAVA = 10,
    STATIONARY_LAVA = 11,
    SAND = 12,
    GRAVEL = 13,
    LOG = 17,
    LEAVES = 18,
    GLASS = 20,
    COBWEB = 30,
    TORCH = 50,
    FIRE = 51,
    REDSTONE_TORCH = 76,
    ICE = 79,
    GLOWSTONE = 89,
    JACK_O_LANTERN = 91,
}

impl BlockType {
    /// Looks up the name of a raw block id.
    ///
    /// # Returns
    /// `None` for ids that have no standard name.
    pub fn from_id(id: BlockId) -> Option<Self> {
        num_traits::FromPrimitive::from_u8(id)
    }

    /// The raw id stored in sections for this block.
    pub const fn id(self) -> BlockId {
        self as BlockId
    }
}
