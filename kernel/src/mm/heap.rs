use core::mem::size_of;
use core::ptr::{self, NonNull};

/// Granularity of every block size and payload address.
pub const HEAP_ALIGN: usize = 4;

/// Block header stored immediately before each payload.
///
/// Offsets rather than pointers so the layout is the same on 32- and 64-bit
/// targets. `size` packs the payload size in the low 31 bits and the
/// allocated flag in bit 31.
#[repr(C)]
#[derive(Copy, Clone)]
struct BlockHeader {
    /// Arena offset of the next free block; only meaningful while free.
    next: u32,
    size: u32,
}

const HEADER_SIZE: usize = size_of::<BlockHeader>();
const ALLOCATED_BIT: u32 = 1 << 31;
const SIZE_MASK: u32 = !ALLOCATED_BIT;
const NIL: u32 = u32::MAX;

/// Leftover larger than this is split off into its own free block.
const SPLIT_THRESHOLD: usize = HEADER_SIZE * 2;

impl BlockHeader {
    const fn new(next: u32, size: u32, allocated: bool) -> Self {
        let flag = if allocated { ALLOCATED_BIT } else { 0 };
        Self {
            next,
            size: (size & SIZE_MASK) | flag,
        }
    }

    const fn size(self) -> u32 {
        self.size & SIZE_MASK
    }

    const fn is_allocated(self) -> bool {
        self.size & ALLOCATED_BIT != 0
    }
}

const fn align_up(size: usize) -> usize {
    (size + HEAP_ALIGN - 1) & !(HEAP_ALIGN - 1)
}

/// One block of the arena, as reported by [`Heap::blocks`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BlockInfo {
    /// Arena offset of the payload.
    pub offset: usize,
    pub size: usize,
    pub allocated: bool,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct HeapStats {
    pub total: usize,
    pub free: usize,
    pub allocated: usize,
    /// Bytes taken by block headers.
    pub overhead: usize,
    pub free_blocks: usize,
    pub largest_free: usize,
}

/// First-fit allocator over one contiguous arena.
///
/// Free blocks form a singly linked list in ascending address order,
/// rooted at `free`. Every insertion into that list merges the block with
/// a physically adjacent free neighbour on either side, so two adjacent
/// free blocks never coexist once an operation returns.
///
/// `Heap` does no locking of its own; see
/// [`HeapAllocator`](super::heap_allocator::HeapAllocator) for the masked
/// front-end.
pub struct Heap {
    base: NonNull<u8>,
    len: usize,
    free: u32,
}

// SAFETY: the heap owns its arena exclusively
unsafe impl Send for Heap {}

impl Heap {
    /// Format `len` bytes at `base` as a single free block.
    ///
    /// # Safety
    /// - The range must be valid for reads and writes and used by nothing
    ///   else for as long as the heap or any of its allocations live.
    /// - `base` must be aligned to [`HEAP_ALIGN`].
    ///
    /// # Panics
    /// Panics if the arena is misaligned, too small for one header and one
    /// granule, or larger than a block size can describe.
    pub unsafe fn new(base: NonNull<u8>, len: usize) -> Self {
        assert!(
            base.as_ptr() as usize % HEAP_ALIGN == 0,
            "heap arena must be {HEAP_ALIGN}-byte aligned"
        );
        let len = len & !(HEAP_ALIGN - 1);
        assert!(len >= HEADER_SIZE + HEAP_ALIGN, "heap arena too small");
        assert!(len - HEADER_SIZE <= SIZE_MASK as usize, "heap arena too large");

        let mut heap = Self {
            base,
            len,
            free: NIL,
        };
        heap.write(0, BlockHeader::new(NIL, (len - HEADER_SIZE) as u32, false));
        heap.free = 0;
        heap
    }

    /// Format a static buffer.
    ///
    /// # Panics
    /// Same conditions as [`Heap::new`].
    pub fn from_static(arena: &'static mut [u8]) -> Self {
        let len = arena.len();
        // SAFETY: a unique 'static borrow is exclusive for the program's life
        unsafe { Self::new(NonNull::from(arena).cast(), len) }
    }

    /// Bytes managed, headers included.
    pub fn capacity(&self) -> usize {
        self.len
    }

    /// Allocate `size` bytes, rounded up to [`HEAP_ALIGN`].
    ///
    /// Returns `None` for a zero size, a size that does not fit in a block
    /// header, or when no free block is large enough.
    pub fn allocate(&mut self, size: usize) -> Option<NonNull<u8>> {
        if size == 0 || size > (u32::MAX >> 1) as usize {
            return None;
        }
        let size = align_up(size);
        if size > SIZE_MASK as usize {
            return None;
        }

        let mut prev = NIL;
        let mut current = self.free;
        let block = loop {
            if current == NIL {
                return None;
            }
            let header = self.read(current);
            if header.size() as usize >= size {
                break header;
            }
            prev = current;
            current = header.next;
        };
        self.set_next(prev, block.next);

        let residual = block.size() as usize - size;
        if residual > SPLIT_THRESHOLD {
            self.write(current, BlockHeader::new(NIL, size as u32, true));

            let tail = current + (HEADER_SIZE + size) as u32;
            let tail_size = (residual - HEADER_SIZE) as u32;
            self.write(tail, BlockHeader::new(NIL, tail_size, false));
            self.insert_free(tail);
        } else {
            // too small to carry its own header; stays with this block
            self.write(current, BlockHeader::new(NIL, block.size(), true));
        }

        Some(self.payload(current))
    }

    /// Return a block to the free list.
    ///
    /// Pointers outside the arena and blocks not marked allocated are
    /// ignored; anything else must have come from this heap.
    pub fn free(&mut self, memory: NonNull<u8>) {
        let Some(block) = self.block_of(memory) else {
            return;
        };
        let header = self.read(block);
        if !header.is_allocated() || header.size() == 0 {
            return;
        }
        self.write(block, BlockHeader::new(NIL, header.size(), false));
        self.insert_free(block);
    }

    /// Recorded size of the block holding `memory`.
    pub fn usable_size(&self, memory: NonNull<u8>) -> usize {
        self.block_of(memory)
            .map(|block| self.read(block).size() as usize)
            .unwrap_or(0)
    }

    /// Allocate `count * size` zeroed bytes.
    pub fn calloc(&mut self, count: usize, size: usize) -> Option<NonNull<u8>> {
        let total = count.checked_mul(size)?;
        let memory = self.allocate(total)?;
        // SAFETY: the block holds at least `total` bytes
        unsafe { ptr::write_bytes(memory.as_ptr(), 0, total) };
        Some(memory)
    }

    /// Move an allocation into a new block of `size` bytes.
    ///
    /// Always allocates fresh memory, copying `min(old usable size, size)`
    /// bytes, then frees the old block. On failure the old block is left
    /// untouched. A `None` input behaves like [`Heap::allocate`].
    pub fn realloc(&mut self, memory: Option<NonNull<u8>>, size: usize) -> Option<NonNull<u8>> {
        let old_size = memory.map(|m| self.usable_size(m)).unwrap_or(0);
        let new_memory = self.allocate(size)?;

        if let Some(old) = memory {
            // SAFETY: distinct live blocks, both at least this long
            unsafe {
                ptr::copy_nonoverlapping(
                    old.as_ptr(),
                    new_memory.as_ptr(),
                    old_size.min(size),
                );
            }
            self.free(old);
        }
        Some(new_memory)
    }

    /// Walk every block in address order.
    pub fn blocks(&self) -> Blocks<'_> {
        Blocks {
            heap: self,
            offset: 0,
        }
    }

    pub fn stats(&self) -> HeapStats {
        let mut stats = HeapStats {
            total: self.len,
            ..HeapStats::default()
        };
        for block in self.blocks() {
            stats.overhead += HEADER_SIZE;
            if block.allocated {
                stats.allocated += block.size;
            } else {
                stats.free += block.size;
                stats.free_blocks += 1;
                stats.largest_free = stats.largest_free.max(block.size);
            }
        }
        stats
    }

    /// Put a free block back in address order, merging with neighbours.
    fn insert_free(&mut self, block: u32) {
        let mut size = self.read(block).size();

        let mut prev = NIL;
        let mut next = self.free;
        while next != NIL && next < block {
            prev = next;
            next = self.read(next).next;
        }

        if next != NIL && self.end_of(block, size) == next {
            let absorbed = self.read(next);
            size += HEADER_SIZE as u32 + absorbed.size();
            next = absorbed.next;
        }

        if prev != NIL {
            let before = self.read(prev);
            if self.end_of(prev, before.size()) == block {
                let merged = before.size() + HEADER_SIZE as u32 + size;
                self.write(prev, BlockHeader::new(next, merged, false));
                return;
            }
        }

        self.write(block, BlockHeader::new(next, size, false));
        self.set_next(prev, block);
    }

    fn end_of(&self, block: u32, size: u32) -> u32 {
        block + HEADER_SIZE as u32 + size
    }

    fn set_next(&mut self, block: u32, next: u32) {
        if block == NIL {
            self.free = next;
        } else {
            let header = self.read(block);
            self.write(block, BlockHeader { next, ..header });
        }
    }

    fn block_of(&self, memory: NonNull<u8>) -> Option<u32> {
        let offset = (memory.as_ptr() as usize).checked_sub(self.base.as_ptr() as usize)?;
        if offset < HEADER_SIZE || offset >= self.len || offset % HEAP_ALIGN != 0 {
            return None;
        }
        Some((offset - HEADER_SIZE) as u32)
    }

    fn payload(&self, block: u32) -> NonNull<u8> {
        // SAFETY: block offsets stay inside the arena
        unsafe { self.base.add(block as usize + HEADER_SIZE) }
    }

    fn read(&self, block: u32) -> BlockHeader {
        debug_assert!(block as usize + HEADER_SIZE <= self.len);
        // SAFETY: in bounds and aligned: the arena base is HEAP_ALIGN
        // aligned and every block offset is a multiple of HEAP_ALIGN
        unsafe { self.base.as_ptr().add(block as usize).cast::<BlockHeader>().read() }
    }

    fn write(&mut self, block: u32, header: BlockHeader) {
        debug_assert!(block as usize + HEADER_SIZE <= self.len);
        // SAFETY: as for `read`
        unsafe {
            self.base
                .as_ptr()
                .add(block as usize)
                .cast::<BlockHeader>()
                .write(header)
        }
    }
}

pub struct Blocks<'a> {
    heap: &'a Heap,
    offset: usize,
}

impl Iterator for Blocks<'_> {
    type Item = BlockInfo;

    fn next(&mut self) -> Option<BlockInfo> {
        if self.offset + HEADER_SIZE > self.heap.len {
            return None;
        }
        let header = self.heap.read(self.offset as u32);
        let info = BlockInfo {
            offset: self.offset + HEADER_SIZE,
            size: header.size() as usize,
            allocated: header.is_allocated(),
        };
        self.offset += HEADER_SIZE + info.size;
        Some(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C, align(8))]
    struct Arena<const N: usize>([u8; N]);

    fn heap<const N: usize>() -> Heap {
        let arena = Box::leak(Box::new(Arena::<N>([0; N])));
        Heap::from_static(&mut arena.0)
    }

    fn offset_of(heap: &Heap, memory: NonNull<u8>) -> usize {
        memory.as_ptr() as usize - heap.base.as_ptr() as usize
    }

    fn free_list(heap: &Heap) -> Vec<BlockInfo> {
        heap.blocks().filter(|b| !b.allocated).collect()
    }

    /// Sizes and headers tile the arena exactly and no two free blocks touch.
    fn assert_consistent(heap: &Heap) {
        let blocks: Vec<_> = heap.blocks().collect();
        let covered: usize = blocks.iter().map(|b| b.size + HEADER_SIZE).sum();
        assert_eq!(covered, heap.capacity());
        for pair in blocks.windows(2) {
            assert!(pair[0].allocated || pair[1].allocated, "adjacent free blocks");
        }

        let mut listed = Vec::new();
        let mut cursor = heap.free;
        while cursor != NIL {
            listed.push(cursor as usize + HEADER_SIZE);
            cursor = heap.read(cursor).next;
        }
        let free: Vec<_> = free_list(heap).iter().map(|b| b.offset).collect();
        assert_eq!(listed, free, "free list must be every free block, ascending");
    }

    #[test]
    fn init_formats_one_free_block() {
        let heap = heap::<256>();
        assert_eq!(
            free_list(&heap),
            [BlockInfo {
                offset: HEADER_SIZE,
                size: 256 - HEADER_SIZE,
                allocated: false
            }]
        );
    }

    #[test]
    fn rejects_zero_oversized_and_exhausting_requests() {
        let mut heap = heap::<128>();
        assert!(heap.allocate(0).is_none());
        assert!(heap.allocate(usize::MAX).is_none());
        assert!(heap.allocate((u32::MAX >> 1) as usize + 1).is_none());
        assert!(heap.allocate(128).is_none());
        assert!(heap.allocate(128 - HEADER_SIZE).is_some());
        assert!(heap.allocate(4).is_none());
    }

    #[test]
    fn sizes_round_up_to_four() {
        let mut heap = heap::<256>();
        let memory = heap.allocate(10).unwrap();
        assert_eq!(heap.usable_size(memory), 12);
        assert_eq!(offset_of(&heap, memory) % HEAP_ALIGN, 0);
    }

    #[test]
    fn round_trip_restores_free_list() {
        for size in [1, 4, 10, 33, 100, 200, 256 - HEADER_SIZE] {
            let mut heap = heap::<256>();
            let before = free_list(&heap);
            let memory = heap.allocate(size).unwrap();
            heap.free(memory);
            assert_eq!(free_list(&heap), before, "size {size}");
        }
    }

    #[test]
    fn sixty_four_byte_arena_serves_two_disjoint_blocks() {
        let mut heap = heap::<64>();
        let first = heap.allocate(10).unwrap();
        let remainder = 64 - HEADER_SIZE - 12;
        assert!(remainder > SPLIT_THRESHOLD);

        let second = heap.allocate(8).unwrap();
        let a = offset_of(&heap, first);
        let b = offset_of(&heap, second);
        assert!(a + heap.usable_size(first) <= b - HEADER_SIZE);
        assert_consistent(&heap);
    }

    #[test]
    fn small_residual_is_not_split() {
        let mut heap = heap::<64>();
        let whole = 64 - HEADER_SIZE;
        let memory = heap.allocate(whole - SPLIT_THRESHOLD).unwrap();
        assert_eq!(heap.usable_size(memory), whole);
        assert!(free_list(&heap).is_empty());
        heap.free(memory);
        assert_eq!(free_list(&heap).len(), 1);
    }

    #[test]
    fn adjacent_frees_coalesce_in_either_order() {
        for reverse in [false, true] {
            let mut heap = heap::<256>();
            let a = heap.allocate(16).unwrap();
            let b = heap.allocate(16).unwrap();
            let guard = heap.allocate(16).unwrap();

            if reverse {
                heap.free(b);
                heap.free(a);
            } else {
                heap.free(a);
                heap.free(b);
            }

            let free = free_list(&heap);
            assert_eq!(free.len(), 2, "merged pair plus the tail");
            assert_eq!(free[0].offset, offset_of(&heap, a));
            assert_eq!(free[0].size, 16 + HEADER_SIZE + 16);
            assert_consistent(&heap);

            heap.free(guard);
            assert_eq!(free_list(&heap).len(), 1);
        }
    }

    #[test]
    fn freeing_middle_block_merges_both_sides() {
        let mut heap = heap::<256>();
        let a = heap.allocate(8).unwrap();
        let b = heap.allocate(8).unwrap();
        let c = heap.allocate(8).unwrap();
        let _d = heap.allocate(8).unwrap();

        heap.free(a);
        heap.free(c);
        assert_eq!(free_list(&heap).len(), 3);
        heap.free(b);
        let free = free_list(&heap);
        assert_eq!(free.len(), 2);
        assert_eq!(free[0].size, 8 * 3 + HEADER_SIZE * 2);
        assert_consistent(&heap);
    }

    #[test]
    fn first_fit_takes_lowest_hole() {
        let mut heap = heap::<256>();
        let a = heap.allocate(32).unwrap();
        let _b = heap.allocate(8).unwrap();
        heap.free(a);

        let c = heap.allocate(16).unwrap();
        assert_eq!(c, a);
    }

    #[test]
    fn double_free_is_ignored() {
        let mut heap = heap::<128>();
        let a = heap.allocate(8).unwrap();
        let _b = heap.allocate(8).unwrap();
        heap.free(a);
        let snapshot = free_list(&heap);
        heap.free(a);
        assert_eq!(free_list(&heap), snapshot);
        assert_consistent(&heap);
    }

    #[test]
    fn foreign_pointer_is_ignored() {
        let mut heap = heap::<64>();
        let mut outside = 0u32;
        heap.free(NonNull::from(&mut outside).cast());
        assert_eq!(heap.usable_size(NonNull::from(&mut outside).cast()), 0);
        assert_consistent(&heap);
    }

    #[test]
    fn calloc_zeroes_and_checks_overflow() {
        let mut heap = heap::<128>();
        let dirty = heap.allocate(16).unwrap();
        unsafe { ptr::write_bytes(dirty.as_ptr(), 0xAA, 16) };
        heap.free(dirty);

        let clean = heap.calloc(4, 4).unwrap();
        let bytes = unsafe { core::slice::from_raw_parts(clean.as_ptr(), 16) };
        assert!(bytes.iter().all(|&b| b == 0));
        assert!(heap.calloc(usize::MAX, 2).is_none());
    }

    #[test]
    fn realloc_copies_min_of_sizes() {
        let mut heap = heap::<256>();
        let old = heap.allocate(8).unwrap();
        unsafe { ptr::copy_nonoverlapping([1u8, 2, 3, 4, 5, 6, 7, 8].as_ptr(), old.as_ptr(), 8) };

        let grown = heap.realloc(Some(old), 32).unwrap();
        assert_ne!(grown, old);
        let bytes = unsafe { core::slice::from_raw_parts(grown.as_ptr(), 8) };
        assert_eq!(bytes, [1, 2, 3, 4, 5, 6, 7, 8]);

        let shrunk = heap.realloc(Some(grown), 4).unwrap();
        assert_ne!(shrunk, grown);
        let bytes = unsafe { core::slice::from_raw_parts(shrunk.as_ptr(), 4) };
        assert_eq!(bytes, [1, 2, 3, 4]);
        assert_eq!(heap.stats().allocated, heap.usable_size(shrunk));
        assert_consistent(&heap);
    }

    #[test]
    fn realloc_failure_keeps_old_block() {
        let mut heap = heap::<64>();
        let old = heap.allocate(8).unwrap();
        assert!(heap.realloc(Some(old), 1024).is_none());
        assert_eq!(heap.usable_size(old), 8);
        assert!(heap.blocks().any(|b| b.allocated && b.offset == offset_of(&heap, old)));
    }

    #[test]
    fn interleaved_traffic_keeps_arena_tiled() {
        let mut heap = heap::<2048>();
        let mut live: Vec<(NonNull<u8>, usize)> = Vec::new();
        let mut seed = 0x2545_F491u32;
        let mut next = || {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            seed
        };

        for _ in 0..2000 {
            let roll = next();
            if roll % 3 != 0 || live.is_empty() {
                let size = (next() % 120 + 1) as usize;
                if let Some(memory) = heap.allocate(size) {
                    live.push((memory, heap.usable_size(memory)));
                }
            } else {
                let index = next() as usize % live.len();
                let (memory, _) = live.swap_remove(index);
                heap.free(memory);
            }

            let mut spans: Vec<_> = live
                .iter()
                .map(|&(m, size)| (offset_of(&heap, m), size))
                .collect();
            spans.sort();
            for pair in spans.windows(2) {
                assert!(pair[0].0 + pair[0].1 <= pair[1].0, "live blocks overlap");
            }

            let stats = heap.stats();
            assert_eq!(stats.free + stats.allocated + stats.overhead, stats.total);
        }
        assert_consistent(&heap);

        for (memory, _) in live.drain(..) {
            heap.free(memory);
        }
        assert_eq!(free_list(&heap).len(), 1);
    }
}
