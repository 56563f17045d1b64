//! Device classes.
//!
//! Each class turns a small hardware-facing driver trait into a full
//! [`DeviceOps`](crate::device::DeviceOps) implementation that can be
//! registered with the device manager.
//!
//! - [`pwm`]: frequency-configured PWM outputs
//! - [`pin`]: digital pin bank
//! - [`dac`]: multi-channel digital-to-analog converter

pub mod dac;
pub mod pin;
pub mod pwm;
