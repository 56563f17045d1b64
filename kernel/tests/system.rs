//! Startup path against the real system statics.

use kernel::mm::heap_allocator;
use kernel::{OBJECTS, Object, ObjectType};

#[test]
fn init_formats_the_system_heap_once() {
    kernel::init();
    let fresh = heap_allocator::stats();
    assert_eq!(fresh.total, kernel::config::HEAP_SIZE);
    assert_eq!(fresh.free_blocks, 1);

    let memory = heap_allocator::allocate(64).expect("heap is formatted");
    assert_eq!(heap_allocator::usable_size(Some(memory)), 64);

    // a second init must not wipe live blocks
    kernel::init();
    assert_eq!(heap_allocator::usable_size(Some(memory)), 64);

    heap_allocator::free(Some(memory));
    assert_eq!(heap_allocator::stats(), fresh);
}

#[test]
fn system_registry_tracks_components() {
    let mut fsm = Object::new();
    OBJECTS.add(&mut fsm, "blinker", ObjectType::FSM).unwrap();
    assert!(OBJECTS.find("blinker", ObjectType::FSM).is_some());
    assert!(OBJECTS.find("blinker", ObjectType::DEVICE).is_none());

    OBJECTS.remove(&mut fsm).unwrap();
    assert!(OBJECTS.find("blinker", ObjectType::FSM).is_none());
}
