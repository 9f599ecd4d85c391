use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::{PageLayout, DEFAULT_BYTE_PAGE_SHIFT};
use crate::primitives::bytes::{be, var};

type Page = Arc<[AtomicU8]>;

/// Growable byte array addressed by a 64-bit index, with bump allocation for concurrent writers.
///
/// The first byte is reserved and never handed out by an allocator, so offset
/// `0` can mark "no record" in an offsets array.
pub struct HugeByteArray {
    layout: PageLayout,
    pages: RwLock<Vec<Page>>,
    length: AtomicU64,
    next_free: AtomicU64,
}

/// Number of leading bytes never handed out by [`ByteAllocator::allocate`].
pub(crate) const RESERVED_PREFIX: u64 = 1;

impl HugeByteArray {
    /// Creates a zeroed array of `length` bytes with the default page size.
    pub fn allocate(length: u64) -> Self {
        Self::with_page_shift(length, DEFAULT_BYTE_PAGE_SHIFT)
    }

    /// Creates a zeroed array whose pages hold `1 << page_shift` bytes.
    pub fn with_page_shift(length: u64, page_shift: u32) -> Self {
        let array = Self {
            layout: PageLayout::new(page_shift),
            pages: RwLock::new(Vec::new()),
            length: AtomicU64::new(0),
            next_free: AtomicU64::new(RESERVED_PREFIX),
        };
        array.grow(length);
        array
    }

    /// Logical length in bytes.
    pub fn len(&self) -> u64 {
        self.length.load(Ordering::Acquire)
    }

    /// Returns `true` when no bytes are addressable.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes claimed by allocators so far, including the reserved prefix.
    pub fn allocated(&self) -> u64 {
        self.next_free.load(Ordering::Acquire)
    }

    /// Extends the array to at least `new_length` bytes, preserving existing content.
    ///
    /// Never shrinks. Pages are appended under the directory write lock, so a
    /// region is fully backed before the caller that requested it writes to it.
    pub fn grow(&self, new_length: u64) {
        if self.length.load(Ordering::Acquire) >= new_length {
            return;
        }
        let mut pages = self.pages.write();
        let needed = self.layout.pages_for(new_length);
        while pages.len() < needed {
            let page: Page = (0..self.layout.page_size())
                .map(|_| AtomicU8::new(0))
                .collect();
            pages.push(page);
        }
        self.length.fetch_max(new_length, Ordering::AcqRel);
    }

    /// Reads the byte at `index`.
    pub fn get(&self, index: u64) -> u8 {
        let mut pages = PageCache::new(self);
        pages.slot(index).load(Ordering::Relaxed)
    }

    /// Vends a thread-confined allocator bound to this array.
    pub fn new_allocator(&self) -> ByteAllocator<'_> {
        ByteAllocator {
            pages: PageCache::new(self),
        }
    }

    /// Opens a sequential reader positioned at `offset`.
    pub fn reader(&self, offset: u64) -> ByteReader<'_> {
        ByteReader {
            pages: PageCache::new(self),
            pos: offset,
        }
    }

    /// Approximate heap usage in bytes.
    pub fn memory_usage(&self) -> usize {
        self.pages.read().len() * self.layout.page_size()
    }

    fn page(&self, page_index: usize) -> Page {
        Arc::clone(&self.pages.read()[page_index])
    }
}

impl fmt::Debug for HugeByteArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HugeByteArray")
            .field("length", &self.len())
            .field("allocated", &self.allocated())
            .finish()
    }
}

/// Remembers the most recently touched page so sequential access only hits
/// the page directory when it crosses a page boundary.
struct PageCache<'a> {
    array: &'a HugeByteArray,
    current: Option<(usize, Page)>,
}

impl<'a> PageCache<'a> {
    fn new(array: &'a HugeByteArray) -> Self {
        Self {
            array,
            current: None,
        }
    }

    #[inline]
    fn slot(&mut self, index: u64) -> &AtomicU8 {
        let length = self.array.len();
        assert!(
            index < length,
            "index {index} out of bounds for huge byte array of length {length}"
        );
        let layout = self.array.layout;
        let page_index = layout.page_index(index);
        let stale = !matches!(&self.current, Some((cached, _)) if *cached == page_index);
        if stale {
            self.current = Some((page_index, self.array.page(page_index)));
        }
        match &self.current {
            Some((_, page)) => &page[layout.index_in_page(index)],
            None => unreachable!("page cache populated above"),
        }
    }
}

/// Claims disjoint byte ranges from a shared [`HugeByteArray`].
///
/// One allocator per worker; the only shared state touched is the array's
/// reservation counter.
pub struct ByteAllocator<'a> {
    pages: PageCache<'a>,
}

impl<'a> ByteAllocator<'a> {
    /// Reserves `num_bytes` contiguous bytes and returns a writer over them.
    ///
    /// The range `[offset, offset + num_bytes)` is exclusive to this caller.
    pub fn allocate(&mut self, num_bytes: u64) -> BulkAdder<'_, 'a> {
        let array = self.pages.array;
        let start = array.next_free.fetch_add(num_bytes, Ordering::AcqRel);
        let end = start + num_bytes;
        array.grow(end);
        BulkAdder {
            pages: &mut self.pages,
            start,
            pos: start,
            end,
        }
    }
}

/// Writer cursor over a freshly reserved range.
pub struct BulkAdder<'c, 'a> {
    pages: &'c mut PageCache<'a>,
    start: u64,
    pos: u64,
    end: u64,
}

impl BulkAdder<'_, '_> {
    /// Offset of the first reserved byte.
    pub fn offset(&self) -> u64 {
        self.start
    }

    /// Bytes still unwritten in the reserved range.
    pub fn remaining(&self) -> u64 {
        self.end - self.pos
    }

    /// Appends one byte.
    #[inline]
    pub fn add_u8(&mut self, byte: u8) {
        assert!(
            self.pos < self.end,
            "write beyond reserved range [{}, {})",
            self.start,
            self.end
        );
        self.pages.slot(self.pos).store(byte, Ordering::Relaxed);
        self.pos += 1;
    }

    /// Appends a big-endian unsigned 32-bit integer.
    pub fn add_u32(&mut self, value: u32) {
        let mut bytes = [0u8; 4];
        be::put_u32(&mut bytes, value);
        for byte in bytes {
            self.add_u8(byte);
        }
    }

    /// Appends a varint.
    pub fn add_vlong(&mut self, value: u64) {
        var::encode_u64_with(value, |byte| self.add_u8(byte));
    }
}

impl Drop for BulkAdder<'_, '_> {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            debug_assert_eq!(
                self.pos, self.end,
                "reserved range [{}, {}) left partially written",
                self.start, self.end
            );
        }
    }
}

/// Sequential reader over a [`HugeByteArray`].
pub struct ByteReader<'a> {
    pages: PageCache<'a>,
    pos: u64,
}

impl ByteReader<'_> {
    /// Current read position.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Reads one byte.
    #[inline]
    pub fn read_u8(&mut self) -> u8 {
        let byte = self.pages.slot(self.pos).load(Ordering::Relaxed);
        self.pos += 1;
        byte
    }

    /// Reads a big-endian unsigned 32-bit integer.
    pub fn read_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        for byte in &mut bytes {
            *byte = self.read_u8();
        }
        be::get_u32(&bytes)
    }

    /// Reads a varint.
    pub fn read_vlong(&mut self) -> u64 {
        let length = self.pages.array.len();
        var::decode_u64_with(|| {
            if self.pos < length {
                Some(self.read_u8())
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn grow_preserves_written_bytes() {
        let array = HugeByteArray::with_page_shift(0, 3);
        assert!(array.is_empty());
        let mut alloc = array.new_allocator();
        let offset = {
            let mut adder = alloc.allocate(6);
            adder.add_u8(7);
            adder.add_u8(8);
            adder.add_u32(0x0102_0304);
            adder.offset()
        };
        assert_eq!(offset, RESERVED_PREFIX);
        array.grow(1_000);
        assert_eq!(array.len(), 1_000);
        assert_eq!(array.get(1), 7);
        assert_eq!(array.get(2), 8);
        assert_eq!(array.get(3), 1);
        assert_eq!(array.get(6), 4);
        assert_eq!(array.get(999), 0);
    }

    #[test]
    fn grow_never_shrinks() {
        let array = HugeByteArray::with_page_shift(100, 4);
        array.grow(10);
        assert_eq!(array.len(), 100);
    }

    #[test]
    fn records_cross_page_boundaries() {
        let array = HugeByteArray::with_page_shift(0, 3);
        let mut alloc = array.new_allocator();
        let values = [0u64, 127, 128, 300, (1 << 63) - 1];
        let size = 4 + values.iter().map(|v| var::vsize(*v) as u64).sum::<u64>();
        let offset = {
            let mut adder = alloc.allocate(size);
            adder.add_u32(values.len() as u32);
            for v in values {
                adder.add_vlong(v);
            }
            assert_eq!(adder.remaining(), 0);
            adder.offset()
        };
        let mut reader = array.reader(offset);
        assert_eq!(reader.read_u32(), values.len() as u32);
        for v in values {
            assert_eq!(reader.read_vlong(), v);
        }
        assert_eq!(reader.position(), offset + size);
    }

    #[test]
    fn u32_layout_matches_big_endian_codec() {
        let array = HugeByteArray::with_page_shift(0, 3);
        let mut alloc = array.new_allocator();
        let offset = {
            let mut adder = alloc.allocate(4);
            adder.add_u32(0xdead_beef);
            adder.offset()
        };
        let bytes: Vec<u8> = (offset..offset + 4).map(|i| array.get(i)).collect();
        assert_eq!(be::get_u32(&bytes), 0xdead_beef);
    }

    #[test]
    #[should_panic(expected = "write beyond reserved range")]
    fn adder_refuses_to_overrun_its_range() {
        let array = HugeByteArray::with_page_shift(0, 3);
        let mut alloc = array.new_allocator();
        let mut adder = alloc.allocate(1);
        adder.add_u8(1);
        adder.add_u8(2);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn reader_fails_fast_past_the_end() {
        let array = HugeByteArray::with_page_shift(8, 3);
        let _ = array.get(8);
    }

    #[test]
    fn concurrent_allocators_get_disjoint_ranges() {
        let array = HugeByteArray::with_page_shift(0, 5);
        let ranges: Vec<(u64, u64, u8)> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8u8)
                .map(|t| {
                    let array = &array;
                    scope.spawn(move || {
                        let mut alloc = array.new_allocator();
                        let mut out = Vec::new();
                        for i in 0..200u64 {
                            let len = 1 + (i % 13);
                            let mut adder = alloc.allocate(len);
                            for _ in 0..len {
                                adder.add_u8(t);
                            }
                            out.push((adder.offset(), len, t));
                        }
                        out
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });

        let mut seen = HashSet::new();
        for (offset, len, tag) in &ranges {
            for i in *offset..offset + len {
                assert!(seen.insert(i), "byte {i} granted twice");
                assert_eq!(array.get(i), *tag);
            }
        }
        assert_eq!(array.allocated(), RESERVED_PREFIX + seen.len() as u64);
    }
}
