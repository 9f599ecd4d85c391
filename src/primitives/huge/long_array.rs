use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{PageLayout, DEFAULT_LONG_PAGE_SHIFT};

/// Fixed-length, zero-initialised array of `u64` values addressed by a 64-bit index.
pub struct HugeLongArray {
    length: u64,
    layout: PageLayout,
    pages: Vec<Box<[AtomicU64]>>,
}

impl HugeLongArray {
    /// Allocates a zeroed array of `length` entries with the default page size.
    pub fn allocate(length: u64) -> Self {
        Self::with_page_shift(length, DEFAULT_LONG_PAGE_SHIFT)
    }

    /// Allocates a zeroed array whose pages hold `1 << page_shift` entries.
    pub fn with_page_shift(length: u64, page_shift: u32) -> Self {
        let layout = PageLayout::new(page_shift);
        let page_count = layout.pages_for(length);
        let mut pages = Vec::with_capacity(page_count);
        let mut remaining = length;
        for _ in 0..page_count {
            let size = remaining.min(layout.page_size() as u64) as usize;
            pages.push((0..size).map(|_| AtomicU64::new(0)).collect());
            remaining -= size as u64;
        }
        Self {
            length,
            layout,
            pages,
        }
    }

    /// Logical number of entries.
    pub fn len(&self) -> u64 {
        self.length
    }

    /// Returns `true` when the array holds no entries.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Reads the value at `index`.
    #[inline]
    pub fn get(&self, index: u64) -> u64 {
        self.slot(index).load(Ordering::Relaxed)
    }

    /// Writes `value` at `index`.
    ///
    /// Concurrent callers must write disjoint indices.
    #[inline]
    pub fn set(&self, index: u64, value: u64) {
        self.slot(index).store(value, Ordering::Relaxed);
    }

    /// Iterates all values in index order.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.pages
            .iter()
            .flat_map(|page| page.iter().map(|v| v.load(Ordering::Relaxed)))
    }

    /// Approximate heap usage in bytes.
    pub fn memory_usage(&self) -> usize {
        self.length as usize * mem::size_of::<u64>()
            + self.pages.capacity() * mem::size_of::<Box<[AtomicU64]>>()
    }

    #[inline]
    fn slot(&self, index: u64) -> &AtomicU64 {
        assert!(
            index < self.length,
            "index {index} out of bounds for huge array of length {}",
            self.length
        );
        &self.pages[self.layout.page_index(index)][self.layout.index_in_page(index)]
    }
}

impl fmt::Debug for HugeLongArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HugeLongArray")
            .field("length", &self.length)
            .field("pages", &self.pages.len())
            .finish()
    }
}
