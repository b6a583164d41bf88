//! # Voxel Data
//!
//! The storage types a world is built from, smallest first:
//!
//! * **Block**: block ids and the per-id lighting properties
//! * **Section**: a 16x16x16 cube of block ids, metadata, and two light channels
//! * **Chunk**: a column of up to 16 sections with a height map
//!
//! Each type also has a persisted record form (`SectionRecord`,
//! `ChunkRecord`) that backing stores serialize with serde.
//!
//! ## Coordinates
//!
//! Voxel coordinates inside a section or chunk are always local and
//! non-negative. Chunk coordinates ([`chunk::ChunkCoord`]) are signed and
//! address whole columns in the horizontal plane.

pub mod block;
pub mod chunk;
pub mod section;
