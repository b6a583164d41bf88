//! The direct-mapped window of most recently used chunks.

use crate::world_state::voxels::chunk::ChunkCoord;

use super::ChunkHandle;

/// A `2^scale x 2^scale` square of chunk slots anchored at a movable origin.
///
/// Each coordinate inside the square maps to exactly one slot, so a lookup is
/// a subtraction, a mask test, and an index.
pub struct ChunkWindow {
    scale: u32,
    mask: i32,
    min_x: i32,
    min_z: i32,
    slots: Vec<Option<(ChunkCoord, ChunkHandle)>>,
}

impl ChunkWindow {
    /// An empty window anchored at the origin.
    pub fn new(scale: u32) -> Self {
        let size = 1usize << scale;
        Self {
            scale,
            mask: (1 << scale) - 1,
            min_x: 0,
            min_z: 0,
            slots: std::iter::repeat_with(|| None).take(size * size).collect(),
        }
    }

    /// Side length in chunks.
    pub fn size(&self) -> usize {
        1 << self.scale
    }

    /// Lowest coordinate covered by the window.
    pub fn origin(&self) -> ChunkCoord {
        ChunkCoord::new(self.min_x, self.min_z)
    }

    /// Whether `coord` falls inside the window.
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.slot_index(coord).is_some()
    }

    /// The chunk held for `coord`, if any.
    pub fn get(&self, coord: ChunkCoord) -> Option<&ChunkHandle> {
        let index = self.slot_index(coord)?;
        self.slots[index].as_ref().map(|(_, handle)| handle)
    }

    /// Places `handle` in the slot for `coord`.
    ///
    /// Returns `false` and leaves the window untouched when `coord` is outside it.
    pub fn insert(&mut self, coord: ChunkCoord, handle: ChunkHandle) -> bool {
        match self.slot_index(coord) {
            Some(index) => {
                self.slots[index] = Some((coord, handle));
                true
            }
            None => false,
        }
    }

    /// Moves the window so that `coord` sits at its centre, returning every
    /// chunk that was held.
    pub fn recenter(&mut self, coord: ChunkCoord) -> Vec<(ChunkCoord, ChunkHandle)> {
        let offset = (self.size() / 2) as i32;
        self.min_x = coord.x - offset;
        self.min_z = coord.z - offset;
        self.drain()
    }

    /// Empties the window, returning every chunk that was held.
    pub fn drain(&mut self) -> Vec<(ChunkCoord, ChunkHandle)> {
        self.slots.iter_mut().filter_map(Option::take).collect()
    }

    /// Handles of every held chunk.
    pub fn handles(&self) -> impl Iterator<Item = &ChunkHandle> {
        self.slots.iter().flatten().map(|(_, handle)| handle)
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Whether no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot_index(&self, coord: ChunkCoord) -> Option<usize> {
        let wx = coord.x.wrapping_sub(self.min_x);
        let wz = coord.z.wrapping_sub(self.min_z);
        if wx & self.mask != wx || wz & self.mask != wz {
            return None;
        }
        Some((wx + (wz << self.scale)) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world_state::chunk_manager::tracked_chunk::{CleanupQueue, TrackedChunk};
    use crate::world_state::voxels::chunk::Chunk;

    fn handle(coord: ChunkCoord) -> ChunkHandle {
        ChunkHandle::new(TrackedChunk::new(
            Chunk::new(coord),
            CleanupQueue::new(Vec::new()),
        ))
    }

    #[test]
    fn window_starts_at_the_origin() {
        let window = ChunkWindow::new(2);
        assert!(window.contains(ChunkCoord::new(0, 0)));
        assert!(window.contains(ChunkCoord::new(3, 3)));
        assert!(!window.contains(ChunkCoord::new(4, 0)));
        assert!(!window.contains(ChunkCoord::new(-1, 0)));
    }

    #[test]
    fn recenter_puts_the_coordinate_in_the_middle() {
        let mut window = ChunkWindow::new(2);
        window.recenter(ChunkCoord::new(10, -10));

        assert_eq!(window.origin(), ChunkCoord::new(8, -12));
        assert!(window.contains(ChunkCoord::new(10, -10)));
        assert!(window.contains(ChunkCoord::new(8, -12)));
        assert!(!window.contains(ChunkCoord::new(12, -10)));
    }

    #[test]
    fn recenter_hands_back_every_held_chunk() {
        let mut window = ChunkWindow::new(1);
        assert!(window.insert(ChunkCoord::new(0, 0), handle(ChunkCoord::new(0, 0))));
        assert!(window.insert(ChunkCoord::new(1, 1), handle(ChunkCoord::new(1, 1))));
        assert!(!window.insert(ChunkCoord::new(2, 0), handle(ChunkCoord::new(2, 0))));

        let drained = window.recenter(ChunkCoord::new(50, 50));
        assert_eq!(drained.len(), 2);
        assert!(window.is_empty());
    }

    #[test]
    fn scale_zero_holds_a_single_chunk() {
        let mut window = ChunkWindow::new(0);
        window.recenter(ChunkCoord::new(5, 5));
        assert!(window.contains(ChunkCoord::new(5, 5)));
        assert!(!window.contains(ChunkCoord::new(5, 6)));
    }
}
