//! Dynamic memory for targets without a host heap.
//!
//! [`heap::Heap`] is the block allocator; [`heap_allocator`] wraps the
//! system instance in a masked region and exposes it as free functions and
//! as a `GlobalAlloc`.

pub mod heap;
pub mod heap_allocator;

pub use heap::{HEAP_ALIGN, Heap, HeapStats};
pub use heap_allocator::{HEAP, HeapAllocator};
