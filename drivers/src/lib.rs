//! Device abstraction layer.
//!
//! # Module Organization
//!
//! - [`device`]: the operation trait, ioctl commands and the device table
//! - [`hal`]: device classes (PWM, pin, DAC) built on small driver traits
//!
//! A board registers its drivers once at startup:
//!
//! ```no_run
//! use drivers::device::{OpenFlags, devices};
//! use drivers::hal::pwm::{Pwm, PwmDriver, PwmInfo};
//!
//! struct Timer3;
//! impl PwmDriver for Timer3 {}
//!
//! # fn main() -> common::Result<()> {
//! kernel::init();
//! let pwm = Box::leak(Box::new(Pwm::new(
//!     Timer3,
//!     PwmInfo { min_freq: 1, max_freq: 100_000 },
//! )));
//! let handle = devices().register("pwm3", pwm, OpenFlags::RDWR)?;
//! devices().open(handle, OpenFlags::WRONLY)?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod device;
pub mod hal;

pub use device::{Command, DeviceHandle, DeviceManager, DeviceOps, Direction, OpenFlags, devices};
