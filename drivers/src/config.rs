//! Sizing and defaults for the device layer.

/// Devices that can be registered at once.
pub const DEVICE_CAPACITY: usize = 16;

/// Frequency a PWM device starts at when opened without one, in Hz.
pub const PWM_DEFAULT_FREQ: u32 = 1000;

/// Pins whose mode a pin device remembers.
pub const PIN_CAPACITY: usize = 64;

/// Channels a DAC device can address; channel enables are kept in a `u32`.
pub const DAC_CHANNELS: u32 = 32;
