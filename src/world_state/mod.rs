//! # World State Module
//!
//! Everything that holds or transforms persisted world data.
//!
//! ## Key Components
//!
//! * `voxels` - Sections, chunks, block properties, and their record forms
//! * `lighting` - The wavefront relighter that recomputes block and sky light
//! * `storage` - The `ChunkAccess` trait and its in-memory and directory stores
//! * `chunk_manager` - The windowed chunk cache that batches relighting and writes
//!
//! ## Data Flow
//!
//! 1. The `ChunkManager` reads a chunk through its `ChunkAccess` store
//! 2. Callers edit the chunk through the manager's handle, marking it dirty
//! 3. A flush notifies the neighbours, relights the chunk, and writes it back

pub mod chunk_manager;
pub mod lighting;
pub mod storage;
pub mod voxels;
