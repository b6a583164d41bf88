//! # Wavefront Queue Module
//!
//! A FIFO ring buffer of packed light-propagation entries.
//!
//! Each entry is one `u32` holding a voxel position inside the relight
//! neighbourhood plus the light value that reached it:
//!
//! ```text
//!  31        22 21        12 11      4 3    0
//! +------------+------------+---------+------+
//! |  x (10)    |  z (10)    |  y (8)  | light|
//! +------------+------------+---------+------+
//! ```
//!
//! Ten bits for `x` and `z` cover the widest supported neighbourhood
//! (34 chunks, 544 voxels); eight bits for `y` cover the full chunk height.

use cgmath::Point3;
use log::warn;

/// Largest packable `x` or `z`, exclusive.
pub const MAX_HORIZONTAL: usize = 1 << 10;
/// Largest packable `y`, exclusive.
pub const MAX_VERTICAL: usize = 1 << 8;

/// Packs a position and light value into a queue entry.
///
/// # Panics
/// Panics if the position or light value does not fit its bit field.
#[inline]
pub fn pack(pos: Point3<usize>, light: u8) -> u32 {
    assert!(
        pos.x < MAX_HORIZONTAL && pos.z < MAX_HORIZONTAL && pos.y < MAX_VERTICAL && light < 16,
        "cannot pack voxel ({}, {}, {}) with light {}",
        pos.x,
        pos.y,
        pos.z,
        light
    );
    ((pos.x as u32) << 22) | ((pos.z as u32) << 12) | ((pos.y as u32) << 4) | light as u32
}

/// Splits a queue entry back into its position and light value.
#[inline]
pub fn unpack(entry: u32) -> (Point3<usize>, u8) {
    let x = (entry >> 22) & 0x3FF;
    let z = (entry >> 12) & 0x3FF;
    let y = (entry >> 4) & 0xFF;
    (
        Point3::new(x as usize, y as usize, z as usize),
        (entry & 0xF) as u8,
    )
}

/// Circular FIFO of packed entries.
///
/// The capacity is chosen up front from the neighbourhood volume, which is
/// enough for any pass in practice. If a pass ever fills it the storage is
/// doubled rather than dropping entries.
pub struct WavefrontQueue {
    buffer: Box<[u32]>,
    head: usize,
    len: usize,
}

impl WavefrontQueue {
    /// Creates an empty queue holding up to `capacity` entries before growing.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "wavefront queue needs a non-zero capacity");
        Self {
            buffer: vec![0; capacity].into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    /// Appends an entry at the tail.
    #[inline]
    pub fn push(&mut self, entry: u32) {
        if self.len == self.buffer.len() {
            self.grow();
        }
        let tail = (self.head + self.len) % self.buffer.len();
        self.buffer[tail] = entry;
        self.len += 1;
    }

    /// Removes the entry at the head.
    #[inline]
    pub fn pop(&mut self) -> Option<u32> {
        if self.len == 0 {
            return None;
        }
        let entry = self.buffer[self.head];
        self.head = (self.head + 1) % self.buffer.len();
        self.len -= 1;
        Some(entry)
    }

    /// Drops every queued entry.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Whether no entries are queued.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of queued entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Entries the queue can hold before it has to grow.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    fn grow(&mut self) {
        let capacity = self.buffer.len() * 2;
        warn!(
            "Wavefront queue overflowed {} entries, growing to {}",
            self.buffer.len(),
            capacity
        );

        let mut buffer = vec![0; capacity];
        for (i, slot) in buffer.iter_mut().take(self.len).enumerate() {
            *slot = self.buffer[(self.head + i) % self.buffer.len()];
        }
        self.buffer = buffer.into_boxed_slice();
        self.head = 0;
    }
}
