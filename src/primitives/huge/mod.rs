//! Paged arrays addressable by a 64-bit index.
//!
//! A huge array is one logically contiguous array split into fixed-size
//! pages, so billions of entries never need a single contiguous allocation.
//! Page sizes are powers of two: an index splits into `(index >> shift,
//! index & mask)`.
//!
//! Elements are stored as atomics so that disjoint regions can be written
//! from several import workers through shared references. Writers use
//! relaxed stores; the import joins every worker before any reader runs,
//! and that join is the synchronisation point for the written values.

mod byte_array;
mod long_array;

pub use byte_array::{BulkAdder, ByteAllocator, ByteReader, HugeByteArray};
pub use long_array::HugeLongArray;

/// Default page shift for long arrays (4096 entries, 32 KiB per page).
pub const DEFAULT_LONG_PAGE_SHIFT: u32 = 12;
/// Default page shift for byte arrays (32 KiB per page).
pub const DEFAULT_BYTE_PAGE_SHIFT: u32 = 15;
/// Smallest accepted page shift.
pub const MIN_PAGE_SHIFT: u32 = 3;
/// Largest accepted page shift.
pub const MAX_PAGE_SHIFT: u32 = 30;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct PageLayout {
    shift: u32,
    mask: u64,
}

impl PageLayout {
    pub(crate) fn new(shift: u32) -> Self {
        assert!(
            (MIN_PAGE_SHIFT..=MAX_PAGE_SHIFT).contains(&shift),
            "page shift {shift} outside [{MIN_PAGE_SHIFT}, {MAX_PAGE_SHIFT}]"
        );
        Self {
            shift,
            mask: (1u64 << shift) - 1,
        }
    }

    #[inline]
    pub(crate) fn page_size(self) -> usize {
        1usize << self.shift
    }

    #[inline]
    pub(crate) fn page_index(self, index: u64) -> usize {
        (index >> self.shift) as usize
    }

    #[inline]
    pub(crate) fn index_in_page(self, index: u64) -> usize {
        (index & self.mask) as usize
    }

    /// Number of pages needed to hold `length` entries.
    #[inline]
    pub(crate) fn pages_for(self, length: u64) -> usize {
        length.div_ceil(1u64 << self.shift) as usize
    }
}
