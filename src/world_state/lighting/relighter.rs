//! # Chunk Relighter Module
//!
//! Recomputes block light and sky light for a `span x span` neighbourhood
//! of chunks centred on the chunk being relit.
//!
//! ## Passes
//!
//! 1. **Block light**: clear the channel, seed every emitting voxel with its
//!    luminance, propagate.
//! 2. **Sky light**: clear the channel, fill every column down to its height,
//!    seed the cells where neighbouring columns differ, propagate.
//!
//! ## Propagation
//!
//! Each popped entry loses one unit of light and offers the remainder to its
//! six neighbours. A neighbour with diffusion `d > 0` takes a further `d - 1`.
//! The neighbour is updated and queued only if the offered light is at least
//! 1, strictly brighter than what it holds, and the neighbour is not opaque.
//! Light is four bits and drops by at least one per hop, so every pass ends.
//!
//! ## Outer Ring
//!
//! Chunks in the first or last row or column of the neighbourhood are
//! installed read-only. They shape the light field of the inner chunks but
//! their stored light is never written.

use log::debug;
use web_time::Instant;

use crate::error::{WorldError, WorldResult};
use crate::world_state::voxels::block::BlockTable;
use crate::world_state::voxels::chunk::{Chunk, CHUNK_HEIGHT, CHUNK_LENGTH, CHUNK_WIDTH};
use crate::world_state::voxels::section::LightChannel;

use super::light_cache::LightCache;
use super::wavefront_queue::{pack, unpack, WavefrontQueue};

/// Smallest supported span.
pub const MIN_SPAN: usize = 3;
/// Largest supported span.
pub const MAX_SPAN: usize = 34;
/// Span used when none is configured.
pub const DEFAULT_SPAN: usize = 3;

/// Checks that `span` is odd and within [`MIN_SPAN`]..=[`MAX_SPAN`].
///
/// # Errors
/// Returns [`WorldError::InvalidConfig`] otherwise.
pub fn validate_span(span: usize) -> WorldResult<()> {
    if !(MIN_SPAN..=MAX_SPAN).contains(&span) {
        return Err(WorldError::InvalidConfig(format!(
            "span {span} is outside {MIN_SPAN}..={MAX_SPAN}"
        )));
    }
    if span % 2 == 0 {
        return Err(WorldError::InvalidConfig(format!(
            "span {span} must be odd so the relit chunk is the centre"
        )));
    }
    Ok(())
}

/// Runs both light passes over a neighbourhood of chunks.
///
/// The queue and block table are kept between calls; nothing else survives a
/// call to [`ChunkRelighter::light_chunks`].
///
/// # Examples
///
/// ```
/// use world_tools::world_state::lighting::ChunkRelighter;
/// use world_tools::world_state::voxels::chunk::{Chunk, ChunkCoord};
///
/// let mut relighter = ChunkRelighter::new(3).unwrap();
/// let mut centre = Chunk::new(ChunkCoord::ZERO);
///
/// let mut neighbourhood: Vec<Option<&mut Chunk>> = (0..9).map(|_| None).collect();
/// neighbourhood[4] = Some(&mut centre);
/// relighter.light_chunks(&mut neighbourhood).unwrap();
/// ```
pub struct ChunkRelighter {
    span: usize,
    queue: WavefrontQueue,
    blocks: BlockTable,
}

impl ChunkRelighter {
    /// Creates a relighter for `span` using the standard block table.
    ///
    /// # Errors
    /// Returns [`WorldError::InvalidConfig`] if the span is even or out of range.
    pub fn new(span: usize) -> WorldResult<Self> {
        Self::with_blocks(span, BlockTable::default())
    }

    /// Creates a relighter for `span` using a custom block table.
    ///
    /// # Errors
    /// Returns [`WorldError::InvalidConfig`] if the span is even or out of range.
    pub fn with_blocks(span: usize, blocks: BlockTable) -> WorldResult<Self> {
        validate_span(span)?;
        let volume = span * CHUNK_WIDTH * span * CHUNK_LENGTH * CHUNK_HEIGHT;
        Ok(Self {
            span,
            queue: WavefrontQueue::with_capacity(volume),
            blocks,
        })
    }

    /// Side length of the neighbourhood, in chunks.
    pub fn span(&self) -> usize {
        self.span
    }

    /// The block table light is computed against.
    pub fn blocks(&self) -> &BlockTable {
        &self.blocks
    }

    /// Whether slot `(x, z)` of the neighbourhood is installed read-only.
    pub fn is_outer_ring(&self, x: usize, z: usize) -> bool {
        x == 0 || z == 0 || x + 1 >= self.span || z + 1 >= self.span
    }

    /// Relights a `span x span` neighbourhood.
    ///
    /// `chunks` is indexed `x + z * span`; `None` marks a missing chunk. Every
    /// present chunk has its empty top sections trimmed and its height map
    /// recomputed first. Only chunks off the outer ring have their light
    /// rewritten.
    ///
    /// # Errors
    /// Returns [`WorldError::NeighborhoodSize`] if `chunks.len() != span * span`.
    pub fn light_chunks(&mut self, chunks: &mut [Option<&mut Chunk>]) -> WorldResult<()> {
        let expected = self.span * self.span;
        if chunks.len() != expected {
            return Err(WorldError::NeighborhoodSize {
                expected,
                actual: chunks.len(),
            });
        }

        let start = Instant::now();
        let span = self.span;

        for chunk in chunks.iter_mut().flatten() {
            chunk.trim_sections();
            chunk.recompute_heightmap(&self.blocks);
        }

        let mut cache = LightCache::new(span, span, &self.blocks);
        for (i, slot) in chunks.iter_mut().enumerate() {
            let (x, z) = (i % span, i / span);
            let Some(chunk) = slot else {
                continue;
            };
            if self.is_outer_ring(x, z) {
                cache.set_read_only_chunk(x, z, Some(chunk.view()));
            } else {
                cache.set_chunk(x, z, Some(chunk.view_mut()));
            }
        }

        self.queue.clear();
        cache.set_mode(LightChannel::BlockLight);
        cache.clear_lights(LightChannel::BlockLight);
        cache.enqueue_block_lights(&mut self.queue);
        propagate_lights(&mut self.queue, &mut cache);

        self.queue.clear();
        cache.set_mode(LightChannel::SkyLight);
        cache.clear_lights(LightChannel::SkyLight);
        cache.enqueue_sky_lights(&mut self.queue);
        propagate_lights(&mut self.queue, &mut cache);

        cache.clear();

        debug!(
            "Relit {}x{} chunks in {:?}",
            span,
            span,
            start.elapsed()
        );
        Ok(())
    }
}

/// Drains the queue, spreading light until no cell can be improved.
fn propagate_lights(queue: &mut WavefrontQueue, cache: &mut LightCache) {
    let (width, height, length) = (cache.width(), cache.height(), cache.length());

    while let Some(entry) = queue.pop() {
        let (pos, light) = unpack(entry);
        let light = i32::from(light) - 1;

        if pos.y + 1 < height {
            propagate_light(queue, cache, pos.x, pos.y + 1, pos.z, light);
        }
        if pos.y > 0 {
            propagate_light(queue, cache, pos.x, pos.y - 1, pos.z, light);
        }
        if pos.x > 0 {
            propagate_light(queue, cache, pos.x - 1, pos.y, pos.z, light);
        }
        if pos.x + 1 < width {
            propagate_light(queue, cache, pos.x + 1, pos.y, pos.z, light);
        }
        if pos.z + 1 < length {
            propagate_light(queue, cache, pos.x, pos.y, pos.z + 1, light);
        }
        if pos.z > 0 {
            propagate_light(queue, cache, pos.x, pos.y, pos.z - 1, light);
        }
    }
}

fn propagate_light(
    queue: &mut WavefrontQueue,
    cache: &mut LightCache,
    x: usize,
    y: usize,
    z: usize,
    mut light: i32,
) {
    let pos = cgmath::Point3::new(x, y, z);

    let diffusion = i32::from(cache.diffusion(pos));
    if diffusion > 0 {
        light -= diffusion - 1;
        if light < 1 {
            return;
        }
    }

    if light <= i32::from(cache.light(pos)) || cache.is_opaque(pos) {
        return;
    }

    let light = light as u8;
    cache.set_light(pos, light);
    queue.push(pack(pos, light));
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;
    use crate::world_state::voxels::block::{BlockProperties, BlockType};
    use crate::world_state::voxels::chunk::ChunkCoord;
    use crate::world_state::voxels::section::MAX_LIGHT;

    const DIFFUSER: u8 = 200;

    /// A 3x3 neighbourhood of chunks with sections 0..=2 present.
    fn open_neighbourhood() -> Vec<Chunk> {
        (0..9)
            .map(|i| {
                let mut chunk = Chunk::new(ChunkCoord::new(i % 3 - 1, i / 3 - 1));
                chunk.section_or_insert(0);
                chunk.section_or_insert(1);
                chunk.set_block_id(Point3::new(0, 47, 0), BlockType::GLASS.id());
                chunk
            })
            .collect()
    }

    fn relight(relighter: &mut ChunkRelighter, chunks: &mut [Chunk]) {
        let mut slots: Vec<Option<&mut Chunk>> = chunks.iter_mut().map(Some).collect();
        relighter.light_chunks(&mut slots).unwrap();
    }

    fn block_light(chunk: &Chunk, x: usize, y: usize, z: usize) -> u8 {
        chunk.light(LightChannel::BlockLight, Point3::new(x, y, z))
    }

    #[test]
    fn spans_must_be_odd_and_in_range() {
        assert!(ChunkRelighter::new(1).is_err());
        assert!(ChunkRelighter::new(4).is_err());
        assert!(ChunkRelighter::new(34).is_err());
        assert!(ChunkRelighter::new(35).is_err());
        assert_eq!(ChunkRelighter::new(5).unwrap().span(), 5);
    }

    #[test]
    fn wrong_neighbourhood_size_is_rejected() {
        let mut relighter = ChunkRelighter::new(3).unwrap();
        let mut slots: Vec<Option<&mut Chunk>> = (0..8).map(|_| None).collect();

        assert!(matches!(
            relighter.light_chunks(&mut slots),
            Err(WorldError::NeighborhoodSize { expected: 9, actual: 8 })
        ));
    }

    #[test]
    fn emitter_falls_off_with_manhattan_distance() {
        let mut relighter = ChunkRelighter::new(3).unwrap();
        let mut chunks = open_neighbourhood();
        chunks[4].set_block_id(Point3::new(8, 20, 8), BlockType::TORCH.id());
        relight(&mut relighter, &mut chunks);

        let centre = &chunks[4];
        assert_eq!(block_light(centre, 8, 20, 8), 14);
        assert_eq!(block_light(centre, 9, 20, 8), 13);
        assert_eq!(block_light(centre, 8, 25, 8), 9);
        assert_eq!(block_light(centre, 3, 18, 10), 5);
        assert_eq!(block_light(centre, 8, 33, 8), 1);
        assert_eq!(block_light(centre, 8, 34, 8), 0);
        assert_eq!(block_light(centre, 15, 20, 15), 0);
        assert_eq!(block_light(centre, 0, 20, 8), 6);
    }

    #[test]
    fn diffusing_block_takes_its_full_cost() {
        let mut blocks = BlockTable::default();
        blocks.set(DIFFUSER, BlockProperties::diffusing(5));
        let mut relighter = ChunkRelighter::with_blocks(3, blocks).unwrap();

        let mut chunks = open_neighbourhood();
        chunks[4].set_block_id(Point3::new(8, 20, 8), BlockType::TORCH.id());
        chunks[4].set_block_id(Point3::new(9, 20, 8), DIFFUSER);
        relight(&mut relighter, &mut chunks);

        assert_eq!(block_light(&chunks[4], 9, 20, 8), 14 - 5);
        assert_eq!(block_light(&chunks[4], 7, 20, 8), 13);
    }

    #[test]
    fn opaque_blocks_stay_dark() {
        let mut relighter = ChunkRelighter::new(3).unwrap();
        let mut chunks = open_neighbourhood();
        chunks[4].set_block_id(Point3::new(8, 20, 8), BlockType::TORCH.id());
        chunks[4].set_block_id(Point3::new(9, 20, 8), BlockType::STONE.id());
        relight(&mut relighter, &mut chunks);

        assert_eq!(block_light(&chunks[4], 9, 20, 8), 0);
        assert_eq!(block_light(&chunks[4], 10, 20, 8), 10);
    }

    #[test]
    fn relighting_twice_changes_nothing() {
        let mut relighter = ChunkRelighter::new(3).unwrap();
        let mut chunks = open_neighbourhood();
        chunks[4].set_block_id(Point3::new(3, 9, 12), BlockType::GLOWSTONE.id());
        chunks[4].set_block_id(Point3::new(5, 0, 5), BlockType::STONE.id());
        chunks[1].set_block_id(Point3::new(7, 30, 15), BlockType::TORCH.id());

        relight(&mut relighter, &mut chunks);
        let first = chunks.clone();
        relight(&mut relighter, &mut chunks);

        assert_eq!(chunks, first);
    }

    #[test]
    fn outer_ring_light_is_never_written() {
        let mut relighter = ChunkRelighter::new(3).unwrap();
        let mut chunks = open_neighbourhood();
        chunks[3].set_block_id(Point3::new(14, 20, 8), BlockType::TORCH.id());
        for chunk in chunks.iter_mut() {
            chunk.trim_sections();
            chunk.recompute_heightmap(relighter.blocks());
        }
        let before = chunks.clone();

        relight(&mut relighter, &mut chunks);

        for (i, (after, before)) in chunks.iter().zip(&before).enumerate() {
            if i != 4 {
                assert_eq!(after, before, "ring chunk {i} was modified");
            }
        }
        // The torch sits two cells west of the centre chunk, inside the ring.
        assert_eq!(block_light(&chunks[4], 0, 20, 8), 12);
        assert_eq!(block_light(&chunks[3], 15, 20, 8), 0);
        assert_eq!(block_light(&chunks[3], 14, 20, 8), 0);
    }

    #[test]
    fn missing_sections_read_as_full_light() {
        let mut relighter = ChunkRelighter::new(3).unwrap();
        let mut chunks = open_neighbourhood();
        relight(&mut relighter, &mut chunks);

        let centre = &chunks[4];
        assert!(centre.section(5).is_none());
        assert_eq!(centre.light(LightChannel::BlockLight, Point3::new(4, 90, 4)), MAX_LIGHT);
        assert_eq!(centre.light(LightChannel::SkyLight, Point3::new(4, 90, 4)), MAX_LIGHT);
    }

    #[test]
    fn flat_world_is_lit_above_the_ground_only() {
        let mut relighter = ChunkRelighter::new(3).unwrap();
        let mut chunks: Vec<Chunk> = (0..9)
            .map(|i| {
                let mut chunk = Chunk::new(ChunkCoord::new(i % 3, i / 3));
                for y in 0..4 {
                    for z in 0..16 {
                        for x in 0..16 {
                            chunk.set_block_id(Point3::new(x, y, z), BlockType::STONE.id());
                        }
                    }
                }
                chunk
            })
            .collect();

        relight(&mut relighter, &mut chunks);

        let centre = &chunks[4];
        for z in 0..16 {
            for x in 0..16 {
                assert_eq!(centre.height(x, z), 4);
                for y in 0..4 {
                    assert_eq!(centre.light(LightChannel::SkyLight, Point3::new(x, y, z)), 0);
                }
                for y in 4..CHUNK_HEIGHT {
                    assert_eq!(
                        centre.light(LightChannel::SkyLight, Point3::new(x, y, z)),
                        MAX_LIGHT
                    );
                }
            }
        }
    }

    #[test]
    fn sky_fills_sections_above_a_missing_one() {
        let mut relighter = ChunkRelighter::new(3).unwrap();
        let mut chunks: Vec<Chunk> = (0..9)
            .map(|i| {
                let mut chunk = Chunk::new(ChunkCoord::new(i % 3, i / 3));
                for y in 0..4 {
                    for z in 0..16 {
                        for x in 0..16 {
                            chunk.set_block_id(Point3::new(x, y, z), BlockType::STONE.id());
                        }
                    }
                }
                chunk
            })
            .collect();
        // Creates section 2 and leaves section 1 empty.
        chunks[4].set_block_id(Point3::new(0, 40, 0), BlockType::STONE.id());
        assert!(chunks[4].section(1).is_none());

        relight(&mut relighter, &mut chunks);

        let sky = |x, y, z| chunks[4].light(LightChannel::SkyLight, Point3::new(x, y, z));
        assert_eq!(sky(15, 40, 15), MAX_LIGHT);
        assert_eq!(sky(8, 47, 8), MAX_LIGHT);
        assert_eq!(sky(1, 40, 0), MAX_LIGHT);
        assert_eq!(sky(8, 10, 8), MAX_LIGHT);
        assert_eq!(sky(0, 40, 0), 0);
        assert_eq!(sky(0, 39, 0), 14);
    }

    #[test]
    fn propagation_never_lowers_a_cell() {
        let blocks = BlockTable::default();
        let mut chunks = open_neighbourhood();
        let section = chunks[4].section_mut(1).unwrap();
        for y in 0..16 {
            for z in 0..16 {
                for x in 0..16 {
                    section.set_block_light(x, y, z, ((x + y + z) % 16) as u8);
                }
            }
        }
        let before = chunks[4].clone();

        let mut queue = WavefrontQueue::with_capacity(1024);
        {
            let mut cache = LightCache::new(3, 3, &blocks);
            cache.set_chunk(1, 1, Some(chunks[4].view_mut()));
            cache.set_mode(LightChannel::BlockLight);
            let seed = Point3::new(24, 20, 24);
            cache.set_light(seed, 14);
            queue.push(pack(seed, 14));
            propagate_lights(&mut queue, &mut cache);
        }

        let after = &chunks[4];
        for y in 0..48 {
            for z in 0..16 {
                for x in 0..16 {
                    let pos = Point3::new(x, y, z);
                    let (old, new) = (
                        before.light(LightChannel::BlockLight, pos),
                        after.light(LightChannel::BlockLight, pos),
                    );
                    assert!(new >= old, "{pos:?} dropped from {old} to {new}");
                }
            }
        }
        // A dark neighbour of the seed was raised; a distant bright cell was left alone.
        assert_eq!(block_light(&before, 8, 20, 9), 5);
        assert_eq!(block_light(after, 8, 20, 9), 13);
        assert_eq!(block_light(after, 8, 31, 8), 15);
    }

    #[test]
    fn overlapping_emitters_keep_the_brighter_light() {
        // Both orders, so either emitter can be queued first.
        for (bright_x, dim_x) in [(4usize, 7usize), (7, 4)] {
            let mut relighter = ChunkRelighter::new(3).unwrap();
            let mut chunks = open_neighbourhood();
            chunks[4].set_block_id(Point3::new(bright_x, 20, 8), BlockType::TORCH.id());
            chunks[4].set_block_id(Point3::new(dim_x, 20, 8), BlockType::REDSTONE_TORCH.id());
            relight(&mut relighter, &mut chunks);

            for x in 0..16 {
                let from_bright = 14 - bright_x.abs_diff(x) as i32;
                let from_dim = 7 - dim_x.abs_diff(x) as i32;
                let expected = from_bright.max(from_dim).max(0) as u8;
                assert_eq!(
                    block_light(&chunks[4], x, 20, 8),
                    expected,
                    "x = {x} with the torch at {bright_x}"
                );
            }
        }
    }

    #[test]
    fn sky_light_spreads_under_an_overhang() {
        let mut relighter = ChunkRelighter::new(3).unwrap();
        let mut chunks = open_neighbourhood();
        // A roof over x in 0..8 at y = 10, open to the east.
        for z in 0..16 {
            for x in 0..8 {
                chunks[4].set_block_id(Point3::new(x, 10, z), BlockType::STONE.id());
            }
        }
        relight(&mut relighter, &mut chunks);

        let sky = |x, y, z| chunks[4].light(LightChannel::SkyLight, Point3::new(x, y, z));
        assert_eq!(sky(8, 5, 8), MAX_LIGHT);
        assert_eq!(sky(7, 5, 8), 14);
        assert_eq!(sky(4, 5, 8), 11);
        assert_eq!(sky(4, 10, 8), 0);
        assert_eq!(sky(4, 11, 8), MAX_LIGHT);
    }
}
