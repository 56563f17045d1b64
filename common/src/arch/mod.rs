//! Platform interrupt-mask implementations.
//!
//! Exactly one of these backs [`PlatformIrq`], chosen from the target at
//! compile time. Masking is a single global, non-nestable region: code
//! already holding the mask must not enter another masked operation.

cfg_if::cfg_if! {
    if #[cfg(all(target_arch = "arm", target_feature = "mclass"))] {
        pub mod cortex_m;
        pub use cortex_m::PrimaskIrq as PlatformIrq;
    } else if #[cfg(target_arch = "arm")] {
        pub mod arm;
        pub use arm::ArmIrq as PlatformIrq;
    } else {
        pub mod host;
        pub use host::HostIrq;
        pub use host::HostIrq as PlatformIrq;
    }
}
