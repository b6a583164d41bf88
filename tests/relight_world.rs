use std::path::PathBuf;

use cgmath::Point3;
use world_tools::relight_world;
use world_tools::world_state::chunk_manager::{ChunkManager, ChunkManagerConfig};
use world_tools::world_state::storage::{ChunkAccess, DirectoryChunkAccess, MemoryChunkAccess};
use world_tools::world_state::voxels::block::BlockType;
use world_tools::world_state::voxels::chunk::{Chunk, ChunkCoord};
use world_tools::world_state::voxels::section::{LightChannel, MAX_LIGHT};

fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("world-tools-it-{:016x}", fastrand::u64(..)))
}

/// A chunk with a stone floor at y = 0 and no light at all.
fn floor_chunk(coord: ChunkCoord) -> Chunk {
    let mut chunk = Chunk::new(coord);
    for z in 0..16 {
        for x in 0..16 {
            chunk.set_block_id(Point3::new(x, 0, z), BlockType::STONE.id());
        }
    }
    chunk
}

fn seed_world(access: &mut impl ChunkAccess) {
    let mut lit = floor_chunk(ChunkCoord::new(0, 0));
    lit.set_block_id(Point3::new(15, 1, 8), BlockType::TORCH.id());
    access.write_chunk(&lit).unwrap();
    access.write_chunk(&floor_chunk(ChunkCoord::new(1, 0))).unwrap();
    access.write_chunk(&floor_chunk(ChunkCoord::new(2, 0))).unwrap();
}

#[test]
fn relighting_a_directory_world_rewrites_every_chunk() {
    let root = scratch_dir();
    seed_world(&mut DirectoryChunkAccess::open(&root).unwrap());

    let mut manager =
        ChunkManager::new(DirectoryChunkAccess::open(&root).unwrap()).unwrap();
    let stats = relight_world(&mut manager).unwrap();
    drop(manager);

    assert_eq!(stats.reads, 3);
    assert_eq!(stats.writes, 3);
    assert_eq!(stats.relights, 3);
    assert!(!stats.has_write_failures());

    let mut access = DirectoryChunkAccess::open(&root).unwrap();
    let lit = access.read_chunk(ChunkCoord::new(0, 0)).unwrap().unwrap();
    let east = access.read_chunk(ChunkCoord::new(1, 0)).unwrap().unwrap();
    let far = access.read_chunk(ChunkCoord::new(2, 0)).unwrap().unwrap();

    assert_eq!(lit.light(LightChannel::BlockLight, Point3::new(15, 1, 8)), 14);
    // Light crosses the chunk border.
    assert_eq!(east.light(LightChannel::BlockLight, Point3::new(0, 1, 8)), 13);
    assert_eq!(east.light(LightChannel::BlockLight, Point3::new(5, 1, 8)), 8);
    assert_eq!(far.light(LightChannel::BlockLight, Point3::new(0, 1, 8)), 0);

    for chunk in [&lit, &east, &far] {
        assert_eq!(chunk.light(LightChannel::SkyLight, Point3::new(3, 1, 3)), MAX_LIGHT);
        assert_eq!(chunk.light(LightChannel::SkyLight, Point3::new(3, 0, 3)), 0);
        assert_eq!(chunk.height(3, 3), 1);
    }

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn relight_survives_a_tiny_cache() {
    let mut access = MemoryChunkAccess::new();
    seed_world(&mut access);
    for x in 3..20 {
        access.write_chunk(&floor_chunk(ChunkCoord::new(x, x))).unwrap();
    }

    let config = ChunkManagerConfig {
        window_scale: 0,
        cache_capacity: 1,
        cleanup_threshold: 4,
        ..ChunkManagerConfig::default()
    };
    let mut manager = ChunkManager::with_config(access, config).unwrap();
    let stats = relight_world(&mut manager).unwrap();

    assert_eq!(stats.abandoned_writes, 0);
    assert!(stats.evictions > 0);
    let east = manager.access_mut().read_chunk(ChunkCoord::new(1, 0)).unwrap().unwrap();
    assert_eq!(east.light(LightChannel::BlockLight, Point3::new(0, 1, 8)), 13);

    for x in 3..20 {
        let chunk = manager.access_mut().read_chunk(ChunkCoord::new(x, x)).unwrap().unwrap();
        assert_eq!(
            chunk.light(LightChannel::SkyLight, Point3::new(8, 2, 8)),
            MAX_LIGHT,
            "chunk {x} was not relit"
        );
    }
}

#[test]
fn config_file_values_reach_the_manager() {
    let config = ChunkManagerConfig::from_json(r#"{ "span": 5, "window_scale": 3 }"#).unwrap();
    let manager = ChunkManager::with_config(MemoryChunkAccess::new(), config).unwrap();

    assert_eq!(manager.config().span, 5);
    assert_eq!(manager.config().window_size(), 8);
}
