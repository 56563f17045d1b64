use core::alloc::{GlobalAlloc, Layout};
use core::cell::UnsafeCell;
use core::ptr::{self, NonNull};

use common::arch::PlatformIrq;
use common::sync::IrqSpinLock;
use common::sync::irq::IrqControl;

use super::heap::{HEAP_ALIGN, Heap, HeapStats};
use crate::config::HEAP_SIZE;

/// Heap shared between foreground code and interrupt handlers.
///
/// Each call runs start to finish with interrupts masked. Before `init`
/// every allocation fails and every free is ignored.
pub struct HeapAllocator<I: IrqControl = PlatformIrq> {
    inner: IrqSpinLock<Option<Heap>, I>,
}

impl<I: IrqControl> HeapAllocator<I> {
    pub const fn new() -> Self {
        Self {
            inner: IrqSpinLock::new(None),
        }
    }

    /// Format the arena `[base, base + len)`.
    ///
    /// # Safety
    /// Same contract as [`Heap::new`].
    ///
    /// # Panics
    /// Panics if already initialized.
    pub unsafe fn init(&self, base: NonNull<u8>, len: usize) {
        let mut heap = self.inner.lock();
        if heap.is_some() {
            panic!("HeapAllocator already initialized");
        }
        // SAFETY: forwarded from the caller
        *heap = Some(unsafe { Heap::new(base, len) });
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.lock().is_some()
    }

    pub fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        self.inner.lock().as_mut()?.allocate(size)
    }

    /// No-op for `None`.
    pub fn free(&self, memory: Option<NonNull<u8>>) {
        let Some(memory) = memory else {
            return;
        };
        if let Some(heap) = self.inner.lock().as_mut() {
            heap.free(memory);
        }
    }

    /// 0 for `None`.
    pub fn usable_size(&self, memory: Option<NonNull<u8>>) -> usize {
        match (memory, self.inner.lock().as_ref()) {
            (Some(memory), Some(heap)) => heap.usable_size(memory),
            _ => 0,
        }
    }

    pub fn calloc(&self, count: usize, size: usize) -> Option<NonNull<u8>> {
        self.inner.lock().as_mut()?.calloc(count, size)
    }

    pub fn realloc(&self, memory: Option<NonNull<u8>>, size: usize) -> Option<NonNull<u8>> {
        self.inner.lock().as_mut()?.realloc(memory, size)
    }

    pub fn stats(&self) -> HeapStats {
        self.inner
            .lock()
            .as_ref()
            .map(Heap::stats)
            .unwrap_or_default()
    }
}

impl<I: IrqControl> Default for HeapAllocator<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// Lets a board binary install the arena as `#[global_allocator]`.
///
/// Payloads are only [`HEAP_ALIGN`]-aligned; stricter layouts get null.
unsafe impl<I: IrqControl> GlobalAlloc for HeapAllocator<I> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if layout.align() > HEAP_ALIGN {
            return ptr::null_mut();
        }
        self.allocate(layout.size())
            .map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        self.free(NonNull::new(ptr));
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if layout.align() > HEAP_ALIGN {
            return ptr::null_mut();
        }
        HeapAllocator::realloc(self, NonNull::new(ptr), new_size)
            .map_or(ptr::null_mut(), NonNull::as_ptr)
    }
}

#[repr(C, align(8))]
struct Arena(UnsafeCell<[u8; HEAP_SIZE]>);

// SAFETY: only ever reached through HEAP, which serialises access
unsafe impl Sync for Arena {}

static ARENA: Arena = Arena(UnsafeCell::new([0; HEAP_SIZE]));
static FORMATTED: spin::Once = spin::Once::new();

/// The system heap, backed by a static arena of [`HEAP_SIZE`] bytes.
pub static HEAP: HeapAllocator = HeapAllocator::new();

/// Format the system arena. Later calls do nothing.
pub fn init() {
    FORMATTED.call_once(|| {
        // SAFETY: ARENA is named nowhere else and this runs once
        unsafe {
            let base = NonNull::new_unchecked(ARENA.0.get().cast::<u8>());
            HEAP.init(base, HEAP_SIZE);
        }
        log::debug!("heap: {} byte arena at {:p}", HEAP_SIZE, ARENA.0.get());
    });
}

pub fn allocate(size: usize) -> Option<NonNull<u8>> {
    HEAP.allocate(size)
}

pub fn free(memory: Option<NonNull<u8>>) {
    HEAP.free(memory)
}

pub fn usable_size(memory: Option<NonNull<u8>>) -> usize {
    HEAP.usable_size(memory)
}

pub fn calloc(count: usize, size: usize) -> Option<NonNull<u8>> {
    HEAP.calloc(count, size)
}

pub fn realloc(memory: Option<NonNull<u8>>, size: usize) -> Option<NonNull<u8>> {
    HEAP.realloc(memory, size)
}

pub fn stats() -> HeapStats {
    HEAP.stats()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C, align(8))]
    struct Buffer([u8; 256]);

    fn allocator() -> HeapAllocator {
        let buffer = Box::leak(Box::new(Buffer([0; 256])));
        let allocator = HeapAllocator::new();
        unsafe { allocator.init(NonNull::from(&mut buffer.0).cast(), 256) };
        allocator
    }

    #[test]
    fn uninitialized_heap_refuses_everything() {
        let allocator: HeapAllocator = HeapAllocator::new();
        assert!(allocator.allocate(8).is_none());
        assert_eq!(allocator.usable_size(None), 0);
        allocator.free(None);
        assert_eq!(allocator.stats(), HeapStats::default());
    }

    #[test]
    #[should_panic(expected = "already initialized")]
    fn second_init_panics() {
        let allocator = allocator();
        let mut other = Buffer([0; 256]);
        unsafe { allocator.init(NonNull::from(&mut other.0).cast(), 256) };
    }

    #[test]
    fn null_is_ignored() {
        let allocator = allocator();
        let before = allocator.stats();
        allocator.free(None);
        assert_eq!(allocator.stats(), before);
        assert_eq!(allocator.usable_size(None), 0);
    }

    #[test]
    fn global_alloc_respects_alignment_limit() {
        let allocator = allocator();
        unsafe {
            let wide = Layout::from_size_align(16, 16).unwrap();
            assert!(allocator.alloc(wide).is_null());

            let word = Layout::from_size_align(12, 4).unwrap();
            let ptr = allocator.alloc(word);
            assert!(!ptr.is_null());
            assert_eq!(ptr as usize % 4, 0);

            let grown = GlobalAlloc::realloc(&allocator, ptr, word, 40);
            assert!(!grown.is_null());
            allocator.dealloc(grown, Layout::from_size_align(40, 4).unwrap());
        }
        assert_eq!(allocator.stats().free_blocks, 1);
    }
}
