//! # Chunk View Module
//!
//! Borrowed views of a chunk for the lighting engine.
//!
//! A relight pass needs two kinds of access to the chunks it covers:
//!
//! * [`ChunkView`] borrows everything immutably. It is what the outer ring of
//!   a relight neighbourhood is installed as, so nothing can write light into
//!   those chunks.
//! * [`ChunkViewMut`] borrows the height map immutably and the sections
//!   mutably, which lets the light cache hold section references and column
//!   heights for the same chunk at the same time.
//!
//! Neither view copies any voxel storage.

use super::{ChunkCoord, HeightMap, CHUNK_SECTIONS};
use crate::world_state::voxels::section::Section;

/// Read-only access to one chunk's sections and heights.
#[derive(Clone, Copy)]
pub struct ChunkView<'a> {
    pub(super) coord: ChunkCoord,
    pub(super) heights: &'a HeightMap,
    pub(super) sections: [Option<&'a Section>; CHUNK_SECTIONS],
}

impl<'a> ChunkView<'a> {
    /// Coordinate of the viewed chunk.
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// The chunk's height map.
    pub fn heights(&self) -> &'a HeightMap {
        self.heights
    }

    /// Section at vertical slot `index`, if present.
    pub fn section(&self, index: usize) -> Option<&'a Section> {
        self.sections.get(index).copied().flatten()
    }

    /// One past the highest present section slot.
    pub fn section_top(&self) -> usize {
        section_top(&self.sections)
    }

    /// Splits the view into its height map and sections.
    pub fn into_parts(self) -> (&'a HeightMap, [Option<&'a Section>; CHUNK_SECTIONS]) {
        (self.heights, self.sections)
    }
}

/// Access to one chunk with writable sections and a read-only height map.
pub struct ChunkViewMut<'a> {
    pub(super) coord: ChunkCoord,
    pub(super) heights: &'a HeightMap,
    pub(super) sections: [Option<&'a mut Section>; CHUNK_SECTIONS],
}

impl<'a> ChunkViewMut<'a> {
    /// Coordinate of the viewed chunk.
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// One past the highest present section slot.
    pub fn section_top(&self) -> usize {
        section_top(&self.sections)
    }

    /// Splits the view into its height map and writable sections.
    pub fn into_parts(self) -> (&'a HeightMap, [Option<&'a mut Section>; CHUNK_SECTIONS]) {
        (self.heights, self.sections)
    }
}

pub(super) fn section_top<T>(sections: &[Option<T>]) -> usize {
    sections.iter().rposition(Option::is_some).map_or(0, |index| index + 1)
}
