//! Compile-time sizing of the kernel's static tables.

/// Bytes kept from an object name; longer names are truncated.
pub const OBJECT_NAME_SIZE: usize = 15;

/// Objects that can be registered at once, across all containers.
pub const OBJECT_CAPACITY: usize = 32;

// Arena size selection
cfg_if::cfg_if! {
    if #[cfg(feature = "heap-16k")] {
        pub const HEAP_SIZE: usize = 16 * 1024;
    } else if #[cfg(feature = "heap-1k")] {
        pub const HEAP_SIZE: usize = 1024;
    } else {
        pub const HEAP_SIZE: usize = 4 * 1024;
    }
}

#[cfg(any(
    all(feature = "heap-1k", feature = "heap-4k"),
    all(feature = "heap-1k", feature = "heap-16k"),
    all(feature = "heap-4k", feature = "heap-16k"),
))]
compile_error!(
    "Multiple heap sizes selected! Choose one of heap-1k, heap-4k, heap-16k\n\
    (heap-4k is a default feature: use --no-default-features to pick another)"
);
