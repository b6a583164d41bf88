#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # World Tools
//!
//! Chunk storage, caching, and light propagation for block-based voxel worlds.
//!
//! A world is an unbounded grid of 16x256x16 chunks, each made of up to
//! sixteen 16x16x16 sections. This crate loads those chunks from a backing
//! store, keeps the recently used ones in memory, and recomputes their block
//! and sky light whenever their geometry changes.
//!
//! ## Key Modules
//!
//! * `core` - Shared-ownership primitives used throughout the crate
//! * `error` - The crate-wide error type
//! * `world_state` - Voxel data, the relighter, backing stores, and the chunk manager
//!
//! ## Architecture
//!
//! The crate is layered bottom-up:
//! * Voxel storage (sections, chunks, and their persisted records)
//! * Lighting (a wavefront flood fill over a neighbourhood of chunks)
//! * Storage (the `ChunkAccess` trait and its implementations)
//! * Chunk management (a windowed cache that batches relights and writes)
//!
//! ## Usage
//!
//! ```rust
//! use cgmath::Point3;
//! use world_tools::world_state::chunk_manager::ChunkManager;
//! use world_tools::world_state::storage::MemoryChunkAccess;
//! use world_tools::world_state::voxels::block::BlockType;
//! use world_tools::world_state::voxels::chunk::ChunkCoord;
//! use world_tools::world_state::voxels::section::LightChannel;
//!
//! let mut manager = ChunkManager::new(MemoryChunkAccess::new())?;
//!
//! let chunk = manager.get_chunk(ChunkCoord::new(0, 0), true).unwrap();
//! chunk
//!     .get_mut()
//!     .set_block_id(Point3::new(8, 10, 8), BlockType::TORCH.id());
//! drop(chunk);
//!
//! manager.flush_pending();
//! let chunk = manager.get_chunk(ChunkCoord::new(0, 0), false).unwrap();
//! assert_eq!(chunk.get().light(LightChannel::BlockLight, Point3::new(9, 10, 8)), 13);
//! drop(chunk);
//!
//! manager.close_all()?;
//! # Ok::<(), world_tools::error::WorldError>(())
//! ```

use std::path::PathBuf;

use log::{error, info};
use web_time::Instant;

use crate::error::{WorldError, WorldResult};
use crate::world_state::chunk_manager::{ChunkManager, ChunkManagerConfig, ManagerStats};
use crate::world_state::storage::{ChunkAccess, DirectoryChunkAccess};

pub mod core;
pub mod error;
pub mod world_state;

/// Marks the light of every chunk in the store stale and flushes it.
///
/// Every chunk is relit and rewritten before this returns. Chunks whose
/// writes kept failing are counted in the returned statistics.
///
/// # Errors
/// Propagates failures listing or closing the store. Individual chunk
/// read and write failures are logged and do not stop the pass.
pub fn relight_world<A: ChunkAccess>(manager: &mut ChunkManager<A>) -> WorldResult<ManagerStats> {
    let start = Instant::now();
    let regions = manager.regions()?;
    info!("Relighting {} regions", regions.len());

    let mut invalidated = 0usize;
    for region in &regions {
        for &coord in &region.chunks {
            if let Some(chunk) = manager.get_chunk(coord, false) {
                chunk.get_mut().invalidate_lights();
                invalidated += 1;
            }
        }
    }

    manager.close_all()?;
    let stats = manager.stats();
    info!(
        "Relit {invalidated} chunks in {:?} ({} relights, {} writes, {} abandoned)",
        start.elapsed(),
        stats.relights,
        stats.writes,
        stats.abandoned_writes
    );
    Ok(stats)
}

/// Entry point of the `world-tools` binary.
///
/// Usage: `world-tools <world-dir> [config.json]`. Relights every chunk of
/// the world stored in `world-dir`.
///
/// # Errors
/// Returns any configuration or store error; they are also logged.
pub fn run() -> WorldResult<()> {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let result = run_with_args(std::env::args().skip(1));
    if let Err(e) = &result {
        error!("{e}");
    }
    result
}

fn run_with_args(mut args: impl Iterator<Item = String>) -> WorldResult<()> {
    let root = args.next().map(PathBuf::from).ok_or_else(|| {
        WorldError::InvalidConfig("usage: world-tools <world-dir> [config.json]".to_string())
    })?;
    let config = match args.next() {
        Some(path) => ChunkManagerConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => ChunkManagerConfig::default(),
    };

    let access = DirectoryChunkAccess::open(&root)?;
    let mut manager = ChunkManager::with_config(access, config)?;
    let stats = relight_world(&mut manager)?;

    if stats.has_write_failures() {
        error!(
            "{} writes failed, {} chunks were not saved",
            stats.write_failures, stats.abandoned_writes
        );
    }
    Ok(())
}
