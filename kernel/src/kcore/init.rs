use crate::config::{HEAP_SIZE, OBJECT_CAPACITY};
use crate::mm::heap_allocator;

/// Bring up the kernel services.
///
/// Board startup calls this once before any driver registers or allocates.
/// The object registry is statically initialized and needs no work here.
/// There is no matching teardown.
pub fn init() {
    heap_allocator::init();
    log::debug!(
        "kernel: heap {} bytes, {} object slots",
        HEAP_SIZE,
        OBJECT_CAPACITY
    );
}
