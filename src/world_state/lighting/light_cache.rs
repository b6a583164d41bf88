//! # Light Cache Module
//!
//! Flat addressing over a `width16 x length16` neighbourhood of chunks for
//! one relight pass.
//!
//! ## Layout
//!
//! Sections are kept in one flat vector indexed by
//! `x16 + (z16 << zoff) + (y16 << yoff)`, where `zoff = ceil(log2(width16))`
//! and `yoff = zoff + ceil(log2(length16))`. The horizontal extent is rounded
//! up to a power of two so that every voxel lookup is a handful of shifts.
//! Slots beyond the real neighbourhood stay [`SectionSlot::Absent`].
//!
//! ## Read-only Chunks
//!
//! Chunks installed with [`LightCache::set_read_only_chunk`] contribute their
//! geometry and height map, but their sections are only ever borrowed
//! immutably. Light that propagates through them lands in a scratch overlay
//! owned by the cache and is discarded when the cache is dropped.
//!
//! ## Absent Geometry
//!
//! A voxel whose section is missing reads light [`MAX_LIGHT`] and block id 0.
//! Missing geometry is open space, never an artificial shadow.

use cgmath::Point3;

use crate::world_state::voxels::block::{BlockId, BlockTable};
use crate::world_state::voxels::chunk::{
    ChunkView, ChunkViewMut, HeightMap, CHUNK_LENGTH, CHUNK_SECTIONS, CHUNK_WIDTH,
};
use crate::world_state::voxels::section::{
    LightChannel, NibbleArray, Section, DEFAULT_BLOCK_ID, MAX_LIGHT, SECTION_HEIGHT,
    SECTION_LENGTH, SECTION_VOLUME, SECTION_WIDTH,
};

use super::wavefront_queue::{pack, WavefrontQueue};

/// One vertical section slot of the cache.
pub enum SectionSlot<'a> {
    /// No section here.
    Absent,
    /// A section of a read-only chunk, with scratch light for propagation.
    ReadOnly {
        /// The borrowed section.
        section: &'a Section,
        /// Light written while propagating through this section.
        overlay: NibbleArray,
    },
    /// A section whose light this pass writes.
    Writable(&'a mut Section),
}

impl<'a> SectionSlot<'a> {
    fn block_id(&self, index: usize) -> BlockId {
        match self {
            SectionSlot::Absent => DEFAULT_BLOCK_ID,
            SectionSlot::ReadOnly { section, .. } => section.block_id_at(index),
            SectionSlot::Writable(section) => section.block_id_at(index),
        }
    }

    fn light(&self, channel: LightChannel, index: usize) -> u8 {
        match self {
            SectionSlot::Absent => MAX_LIGHT,
            SectionSlot::ReadOnly { overlay, .. } => overlay.get(index),
            SectionSlot::Writable(section) => section.light_at(channel, index),
        }
    }

    fn set_light(&mut self, channel: LightChannel, index: usize, value: u8) {
        match self {
            SectionSlot::Absent => {}
            SectionSlot::ReadOnly { overlay, .. } => overlay.set(index, value),
            SectionSlot::Writable(section) => section.set_light_at(channel, index, value),
        }
    }

    fn clear_light(&mut self, channel: LightChannel) {
        match self {
            SectionSlot::Absent => {}
            SectionSlot::ReadOnly { overlay, .. } => overlay.fill(0),
            SectionSlot::Writable(section) => section.fill_light(channel, 0),
        }
    }

    fn is_present(&self) -> bool {
        !matches!(self, SectionSlot::Absent)
    }
}

/// Height data for one chunk column of the cache.
#[derive(Clone, Copy)]
struct ColumnInfo<'a> {
    heights: &'a HeightMap,
    section_top: usize,
}

/// Flattened light and geometry access over a neighbourhood of chunks.
pub struct LightCache<'a> {
    width16: usize,
    length16: usize,
    zoff: u32,
    yoff: u32,
    channel: LightChannel,
    blocks: &'a BlockTable,
    sections: Vec<SectionSlot<'a>>,
    columns: Vec<Option<ColumnInfo<'a>>>,
}

impl<'a> LightCache<'a> {
    /// Creates an empty cache covering `width16 x length16` chunks.
    ///
    /// # Panics
    /// Panics if either dimension is zero.
    pub fn new(width16: usize, length16: usize, blocks: &'a BlockTable) -> Self {
        assert!(
            width16 > 0 && length16 > 0,
            "light cache needs a non-empty neighbourhood"
        );

        let wscale = width16.next_power_of_two().trailing_zeros();
        let lscale = length16.next_power_of_two().trailing_zeros();
        let columns = 1usize << (wscale + lscale);

        Self {
            width16,
            length16,
            zoff: wscale,
            yoff: wscale + lscale,
            channel: LightChannel::BlockLight,
            blocks,
            sections: std::iter::repeat_with(|| SectionSlot::Absent)
                .take(columns * CHUNK_SECTIONS)
                .collect(),
            columns: vec![None; columns],
        }
    }

    /// Width of the neighbourhood in voxels.
    pub fn width(&self) -> usize {
        self.width16 * CHUNK_WIDTH
    }

    /// Length of the neighbourhood in voxels.
    pub fn length(&self) -> usize {
        self.length16 * CHUNK_LENGTH
    }

    /// Height of the neighbourhood in voxels.
    pub fn height(&self) -> usize {
        CHUNK_SECTIONS * SECTION_HEIGHT
    }

    /// Installs a chunk whose light this cache may write, or clears the column.
    pub fn set_chunk(&mut self, x16: usize, z16: usize, chunk: Option<ChunkViewMut<'a>>) {
        let column = self.column_index(x16, z16);
        match chunk {
            Some(view) => {
                let section_top = view.section_top();
                let (heights, sections) = view.into_parts();
                self.columns[column] = Some(ColumnInfo {
                    heights,
                    section_top,
                });
                for (y16, section) in sections.into_iter().enumerate() {
                    let index = self.section_index(x16, y16, z16);
                    self.sections[index] = section.map_or(SectionSlot::Absent, SectionSlot::Writable);
                }
            }
            None => self.clear_column(x16, z16),
        }
    }

    /// Installs a chunk that contributes geometry only, or clears the column.
    pub fn set_read_only_chunk(&mut self, x16: usize, z16: usize, chunk: Option<ChunkView<'a>>) {
        let column = self.column_index(x16, z16);
        match chunk {
            Some(view) => {
                let section_top = view.section_top();
                let (heights, sections) = view.into_parts();
                self.columns[column] = Some(ColumnInfo {
                    heights,
                    section_top,
                });
                for (y16, section) in sections.into_iter().enumerate() {
                    let index = self.section_index(x16, y16, z16);
                    self.sections[index] = match section {
                        Some(section) => SectionSlot::ReadOnly {
                            section,
                            overlay: NibbleArray::new(SECTION_VOLUME),
                        },
                        None => SectionSlot::Absent,
                    };
                }
            }
            None => self.clear_column(x16, z16),
        }
    }

    /// Releases every installed chunk.
    pub fn clear(&mut self) {
        self.sections.iter_mut().for_each(|s| *s = SectionSlot::Absent);
        self.columns.iter_mut().for_each(|c| *c = None);
    }

    /// Selects the channel that light reads and writes go to.
    pub fn set_mode(&mut self, channel: LightChannel) {
        self.channel = channel;
    }

    /// The channel light reads and writes currently go to.
    pub fn mode(&self) -> LightChannel {
        self.channel
    }

    /// Zeroes `channel` in every present section.
    pub fn clear_lights(&mut self, channel: LightChannel) {
        self.sections.iter_mut().for_each(|s| s.clear_light(channel));
    }

    /// Light of the current channel at `pos`.
    pub fn light(&self, pos: Point3<usize>) -> u8 {
        let (section, element) = self.locate(pos);
        self.sections[section].light(self.channel, element)
    }

    /// Sets the light of the current channel at `pos`. Ignored where no section is present.
    pub fn set_light(&mut self, pos: Point3<usize>, value: u8) {
        let (section, element) = self.locate(pos);
        let channel = self.channel;
        self.sections[section].set_light(channel, element, value);
    }

    /// Block id at `pos`.
    pub fn block_id(&self, pos: Point3<usize>) -> BlockId {
        let (section, element) = self.locate(pos);
        self.sections[section].block_id(element)
    }

    /// Light emitted by the block at `pos`.
    pub fn luminance(&self, pos: Point3<usize>) -> u8 {
        self.blocks.luminance(self.block_id(pos))
    }

    /// Extra attenuation of the block at `pos`.
    pub fn diffusion(&self, pos: Point3<usize>) -> u8 {
        self.blocks.diffusion(self.block_id(pos))
    }

    /// Whether the block at `pos` blocks light.
    pub fn is_opaque(&self, pos: Point3<usize>) -> bool {
        self.blocks.is_opaque(self.block_id(pos))
    }

    /// Height of voxel column `(x, z)`; 0 where no chunk is installed.
    pub fn column_height(&self, x: usize, z: usize) -> usize {
        self.columns[self.column_index(x >> 4, z >> 4)]
            .map_or(0, |c| c.heights.get(x & 0xF, z & 0xF))
    }

    /// Seeds block light: every emitting voxel gets its luminance and is queued.
    pub fn enqueue_block_lights(&mut self, queue: &mut WavefrontQueue) {
        let x_mask = (1usize << self.zoff) - 1;
        let z_mask = (1usize << (self.yoff - self.zoff)) - 1;

        for index in 0..self.sections.len() {
            if !self.sections[index].is_present() {
                continue;
            }
            let origin = Point3::new(
                (index & x_mask) * SECTION_WIDTH,
                (index >> self.yoff) * SECTION_HEIGHT,
                ((index >> self.zoff) & z_mask) * SECTION_LENGTH,
            );

            for element in 0..SECTION_VOLUME {
                let luminance = self.blocks.luminance(self.sections[index].block_id(element));
                if luminance == 0 {
                    continue;
                }
                self.sections[index].set_light(LightChannel::BlockLight, element, luminance);
                let pos = Point3::new(
                    origin.x + (element & 0xF),
                    origin.y + (element >> 8),
                    origin.z + ((element >> 4) & 0xF),
                );
                queue.push(pack(pos, luminance));
            }
        }
    }

    /// Seeds sky light from the height maps.
    ///
    /// Every column is filled with full light from its own height up to the
    /// top of its chunk's highest present section. Missing slots in between
    /// are skipped; they already read as full light. Cells between the column's
    /// height and the tallest lateral neighbour are queued so light can
    /// spread sideways under overhangs of the neighbouring terrain.
    pub fn enqueue_sky_lights(&mut self, queue: &mut WavefrontQueue) {
        let (width, length) = (self.width(), self.length());
        let top = self.height() - 1;

        for z in 0..length {
            for x in 0..width {
                let h = self.column_height(x, z);
                let mut h_max = h;
                if z > 0 {
                    h_max = h_max.max(self.column_height(x, z - 1));
                }
                if z + 1 < length {
                    h_max = h_max.max(self.column_height(x, z + 1));
                }
                if x > 0 {
                    h_max = h_max.max(self.column_height(x - 1, z));
                }
                if x + 1 < width {
                    h_max = h_max.max(self.column_height(x + 1, z));
                }

                self.light_column(x, h, z);
                for y in h..=h_max.min(top) {
                    queue.push(pack(Point3::new(x, y, z), MAX_LIGHT));
                }
            }
        }
    }

    fn light_column(&mut self, x: usize, from_y: usize, z: usize) {
        let Some(column) = self.columns[self.column_index(x >> 4, z >> 4)] else {
            return;
        };
        let top = column.section_top * SECTION_HEIGHT;
        for y in from_y..top {
            self.set_light(Point3::new(x, y, z), MAX_LIGHT);
        }
    }

    fn clear_column(&mut self, x16: usize, z16: usize) {
        let column = self.column_index(x16, z16);
        self.columns[column] = None;
        for y16 in 0..CHUNK_SECTIONS {
            let index = self.section_index(x16, y16, z16);
            self.sections[index] = SectionSlot::Absent;
        }
    }

    /// Section slot and element index of voxel `pos`.
    ///
    /// # Panics
    /// Panics if `pos` lies outside the neighbourhood.
    #[inline]
    fn locate(&self, pos: Point3<usize>) -> (usize, usize) {
        assert!(
            pos.x < self.width() && pos.y < self.height() && pos.z < self.length(),
            "voxel ({}, {}, {}) is outside the light cache",
            pos.x,
            pos.y,
            pos.z
        );
        (
            self.section_index(pos.x >> 4, pos.y >> 4, pos.z >> 4),
            Section::index(pos.x & 0xF, pos.y & 0xF, pos.z & 0xF),
        )
    }

    #[inline]
    fn column_index(&self, x16: usize, z16: usize) -> usize {
        assert!(
            x16 < self.width16 && z16 < self.length16,
            "chunk ({x16}, {z16}) is outside the light cache"
        );
        x16 + (z16 << self.zoff)
    }

    #[inline]
    fn section_index(&self, x16: usize, y16: usize, z16: usize) -> usize {
        self.column_index(x16, z16) + (y16 << self.yoff)
    }
}
