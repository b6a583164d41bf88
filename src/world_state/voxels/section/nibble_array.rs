//! # Nibble Array Module
//!
//! A packed array of 4-bit values, two per byte.
//!
//! Element `i` occupies the low nibble of byte `i / 2` when `i` is even and
//! the high nibble when it is odd, which is the order the persisted `Data`,
//! `SkyLight`, and `BlockLight` arrays use. Storage is a least-significant-bit
//! first `BitVec<u8>`, so the raw byte slice can be written out unchanged.

use bitvec::prelude::*;

/// Bits per element.
const NIBBLE_BITS: usize = 4;
/// Mask applied to every stored value.
pub const NIBBLE_MASK: u8 = 0xF;

/// A fixed-length array of 4-bit values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NibbleArray {
    bits: BitVec<u8, Lsb0>,
    len: usize,
}

impl NibbleArray {
    /// Creates a zero-filled array of `len` elements.
    ///
    /// The backing storage holds `ceil(len / 2)` bytes.
    pub fn new(len: usize) -> Self {
        Self {
            bits: bitvec![u8, Lsb0; 0; len * NIBBLE_BITS],
            len,
        }
    }

    /// Wraps packed bytes; the array holds two elements per byte.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let len = bytes.len() * 2;
        Self {
            bits: BitVec::from_vec(bytes),
            len,
        }
    }

    /// Number of 4-bit elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reads element `index`.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    #[inline]
    pub fn get(&self, index: usize) -> u8 {
        self.nibble(index).load_le::<u8>()
    }

    /// Writes element `index`, keeping only the low four bits of `value`.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    #[inline]
    pub fn set(&mut self, index: usize, value: u8) {
        self.nibble_mut(index).store_le::<u8>(value & NIBBLE_MASK);
    }

    /// Sets every element to `value`.
    pub fn fill(&mut self, value: u8) {
        let value = value & NIBBLE_MASK;
        if value == 0 {
            self.bits.fill(false);
            return;
        }
        for index in 0..self.len {
            self.set(index, value);
        }
    }

    /// The packed bytes backing the array.
    pub fn as_bytes(&self) -> &[u8] {
        self.bits.as_raw_slice()
    }

    #[inline]
    fn nibble(&self, index: usize) -> &BitSlice<u8, Lsb0> {
        assert!(index < self.len, "nibble index {index} out of range for length {}", self.len);
        let start = index * NIBBLE_BITS;
        &self.bits[start..start + NIBBLE_BITS]
    }

    #[inline]
    fn nibble_mut(&mut self, index: usize) -> &mut BitSlice<u8, Lsb0> {
        assert!(index < self.len, "nibble index {index} out of range for length {}", self.len);
        let start = index * NIBBLE_BITS;
        &mut self.bits[start..start + NIBBLE_BITS]
    }
}
