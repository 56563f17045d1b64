//! Shared primitives for the hardware-abstraction kernel.
//!
//! - [`arch`]: interrupt-mask implementations per target
//! - [`sync`]: IRQ-safe locks and the ownership mutex
//! - [`error`]: the error set returned by every fallible operation

#![cfg_attr(not(test), no_std)]

pub mod arch;
pub mod error;
pub mod sync;

pub use error::{Error, Result};
