//! # Chunk Module
//!
//! A chunk is a vertical stack of up to 16 [`Section`]s covering a 16x256x16
//! column of the world, plus a height map with one entry per column.
//!
//! ## Section Slots
//!
//! Slots are indexed by the section's vertical index. A slot can be empty,
//! which means "no geometry here yet": reads from an empty slot report air
//! and full light, and writing a non-air block allocates the section.
//!
//! ## Height Map
//!
//! `height(x, z)` is one above the highest block in the column that
//! attenuates light (opaque, or with non-zero diffusion), or 0 for a column
//! with no such block. It is derived data: callers recompute it with
//! [`Chunk::recompute_heightmap`] after changing geometry. The relighter does
//! this itself before every pass.

use cgmath::Point3;

use super::block::{BlockId, BlockTable};
use super::section::{LightChannel, Section, DEFAULT_BLOCK_ID, MAX_LIGHT, SECTION_HEIGHT};

pub mod chunk_coord;
pub mod chunk_record;
pub mod chunk_view;

pub use chunk_coord::ChunkCoord;
pub use chunk_record::ChunkRecord;
pub use chunk_view::{ChunkView, ChunkViewMut};

/// Width of a chunk along X, in voxels.
pub const CHUNK_WIDTH: usize = 16;
/// Length of a chunk along Z, in voxels.
pub const CHUNK_LENGTH: usize = 16;
/// Number of section slots in a chunk.
pub const CHUNK_SECTIONS: usize = 16;
/// Height of a chunk along Y, in voxels.
pub const CHUNK_HEIGHT: usize = CHUNK_SECTIONS * SECTION_HEIGHT;
/// Number of columns in a chunk.
pub const CHUNK_COLUMNS: usize = CHUNK_WIDTH * CHUNK_LENGTH;

/// Per-column heights of a chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeightMap {
    heights: [u16; CHUNK_COLUMNS],
}

impl HeightMap {
    /// A height map with every column at 0.
    pub fn new() -> Self {
        Self {
            heights: [0; CHUNK_COLUMNS],
        }
    }

    /// Height of column `(x, z)`.
    #[inline]
    pub fn get(&self, x: usize, z: usize) -> usize {
        self.heights[Self::index(x, z)] as usize
    }

    /// Sets the height of column `(x, z)`.
    pub fn set(&mut self, x: usize, z: usize, height: usize) {
        debug_assert!(height <= CHUNK_HEIGHT);
        self.heights[Self::index(x, z)] = height as u16;
    }

    /// Heights in column order (`x + z * 16`).
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.heights.iter().map(|&h| h as usize)
    }

    #[inline]
    fn index(x: usize, z: usize) -> usize {
        assert!(
            x < CHUNK_WIDTH && z < CHUNK_LENGTH,
            "column ({x}, {z}) is outside the chunk"
        );
        x + z * CHUNK_WIDTH
    }
}

impl Default for HeightMap {
    fn default() -> Self {
        Self::new()
    }
}

/// A 16x256x16 column of voxels stored as optional sections.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    coord: ChunkCoord,
    sections: [Option<Box<Section>>; CHUNK_SECTIONS],
    heights: HeightMap,
}

impl Chunk {
    /// Creates a chunk with no sections at `coord`.
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord,
            sections: std::array::from_fn(|_| None),
            heights: HeightMap::new(),
        }
    }

    /// The chunk's coordinate.
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Section in slot `index`, if present.
    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)?.as_deref()
    }

    /// Mutable section in slot `index`, if present.
    pub fn section_mut(&mut self, index: usize) -> Option<&mut Section> {
        self.sections.get_mut(index)?.as_deref_mut()
    }

    /// Section in slot `index`, allocating an empty one if the slot is vacant.
    ///
    /// # Panics
    /// Panics if `index >= CHUNK_SECTIONS`.
    pub fn section_or_insert(&mut self, index: usize) -> &mut Section {
        self.sections[index].get_or_insert_with(|| Box::new(Section::new(index as i32)))
    }

    /// Places `section` in the slot named by its own `y`, returning the previous occupant.
    pub(crate) fn install_section(&mut self, section: Section) -> Option<Box<Section>> {
        let index = section.y() as usize;
        self.sections[index].replace(Box::new(section))
    }

    /// Iterates over the present sections, bottom to top.
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter_map(|s| s.as_deref())
    }

    /// One past the highest present section slot; 0 for a chunk with no sections.
    ///
    /// Empty slots below the top still count, so a chunk holding only
    /// sections 0 and 2 has a section top of 3.
    pub fn section_top(&self) -> usize {
        chunk_view::section_top(&self.sections)
    }

    /// Block id at chunk-local `pos`; an empty slot reads as air.
    pub fn block_id(&self, pos: Point3<usize>) -> BlockId {
        Self::check_local(pos);
        self.section(pos.y / SECTION_HEIGHT)
            .map(|s| s.block_id(pos.x, pos.y % SECTION_HEIGHT, pos.z))
            .unwrap_or(DEFAULT_BLOCK_ID)
    }

    /// Sets the block id at chunk-local `pos`.
    ///
    /// Writing air into an empty slot leaves the slot empty.
    pub fn set_block_id(&mut self, pos: Point3<usize>, id: BlockId) {
        Self::check_local(pos);
        let index = pos.y / SECTION_HEIGHT;
        if id == DEFAULT_BLOCK_ID && self.section(index).is_none() {
            return;
        }
        self.section_or_insert(index)
            .set_block_id(pos.x, pos.y % SECTION_HEIGHT, pos.z, id);
    }

    /// Metadata at chunk-local `pos`; an empty slot reads as 0.
    pub fn metadata(&self, pos: Point3<usize>) -> u8 {
        Self::check_local(pos);
        self.section(pos.y / SECTION_HEIGHT)
            .map(|s| s.metadata(pos.x, pos.y % SECTION_HEIGHT, pos.z))
            .unwrap_or(0)
    }

    /// Sets the metadata at chunk-local `pos`, allocating the section if needed.
    pub fn set_metadata(&mut self, pos: Point3<usize>, value: u8) {
        Self::check_local(pos);
        self.section_or_insert(pos.y / SECTION_HEIGHT)
            .set_metadata(pos.x, pos.y % SECTION_HEIGHT, pos.z, value);
    }

    /// Light of `channel` at chunk-local `pos`.
    ///
    /// An empty slot reads as [`MAX_LIGHT`]: missing geometry is open space.
    pub fn light(&self, channel: LightChannel, pos: Point3<usize>) -> u8 {
        Self::check_local(pos);
        self.section(pos.y / SECTION_HEIGHT)
            .map(|s| s.light_at(channel, Section::index(pos.x, pos.y % SECTION_HEIGHT, pos.z)))
            .unwrap_or(MAX_LIGHT)
    }

    /// Height of column `(x, z)`.
    pub fn height(&self, x: usize, z: usize) -> usize {
        self.heights.get(x, z)
    }

    /// The chunk's height map.
    pub fn height_map(&self) -> &HeightMap {
        &self.heights
    }

    /// Drops trailing sections that hold nothing but air.
    ///
    /// Stops at the first section from the top that contains a block; empty
    /// sections below it are kept.
    pub fn trim_sections(&mut self) {
        for slot in self.sections.iter_mut().rev() {
            match slot {
                Some(section) if section.is_empty_air() => *slot = None,
                Some(_) => break,
                None => {}
            }
        }
    }

    /// Rebuilds the height map from the current blocks.
    pub fn recompute_heightmap(&mut self, blocks: &BlockTable) {
        let top = self.section_top() * SECTION_HEIGHT;

        for z in 0..CHUNK_LENGTH {
            for x in 0..CHUNK_WIDTH {
                let height = (0..top)
                    .rev()
                    .find(|&y| blocks.get(self.block_id(Point3::new(x, y, z))).attenuates_light())
                    .map_or(0, |y| y + 1);
                self.heights.set(x, z, height);
            }
        }
    }

    /// A read-only view of the chunk.
    pub fn view(&self) -> ChunkView<'_> {
        ChunkView {
            coord: self.coord,
            heights: &self.heights,
            sections: std::array::from_fn(|i| self.sections[i].as_deref()),
        }
    }

    /// A view with writable sections.
    pub fn view_mut(&mut self) -> ChunkViewMut<'_> {
        ChunkViewMut {
            coord: self.coord,
            heights: &self.heights,
            sections: self.sections.each_mut().map(|s| s.as_deref_mut()),
        }
    }

    fn check_local(pos: Point3<usize>) {
        assert!(
            pos.x < CHUNK_WIDTH && pos.y < CHUNK_HEIGHT && pos.z < CHUNK_LENGTH,
            "voxel ({}, {}, {}) is outside the chunk",
            pos.x,
            pos.y,
            pos.z
        );
    }
}
