//! Chunk coordinate type for chunk-space addressing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Chunks per region side.
pub const REGION_CHUNKS: i32 = 32;

/// Horizontal chunk coordinate (chunk-space, not voxel-space).
///
/// Coordinates can be negative; the world is unbounded in both directions.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct ChunkCoord {
    /// Chunk index along X.
    pub x: i32,
    /// Chunk index along Z.
    pub z: i32,
}

impl ChunkCoord {
    /// Origin chunk at (0, 0).
    pub const ZERO: ChunkCoord = ChunkCoord { x: 0, z: 0 };

    /// Create a new chunk coordinate.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The coordinate `dx`, `dz` chunks away.
    pub const fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            z: self.z + dz,
        }
    }

    /// The 8 horizontally and diagonally adjacent chunks.
    ///
    /// Row by row, starting at `(-1, -1)`; the centre is skipped.
    pub fn neighbors(self) -> [ChunkCoord; 8] {
        [
            self.offset(-1, -1),
            self.offset(0, -1),
            self.offset(1, -1),
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(-1, 1),
            self.offset(0, 1),
            self.offset(1, 1),
        ]
    }

    /// The region this chunk belongs to.
    pub const fn region(self) -> (i32, i32) {
        (
            self.x.div_euclid(REGION_CHUNKS),
            self.z.div_euclid(REGION_CHUNKS),
        )
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}
