//! # Lighting Module
//!
//! Wavefront light propagation over a neighbourhood of chunks.
//!
//! * `wavefront_queue` - the packed FIFO the flood fill runs on
//! * `light_cache` - flat voxel addressing over the borrowed chunks
//! * `relighter` - the two-pass driver, [`ChunkRelighter`]
//!
//! A [`LightCache`] only lives for one call to
//! [`ChunkRelighter::light_chunks`]; it borrows the chunks it covers and
//! releases them when the call returns.

pub mod light_cache;
pub mod relighter;
pub mod wavefront_queue;

pub use light_cache::LightCache;
pub use relighter::ChunkRelighter;
pub use wavefront_queue::WavefrontQueue;
