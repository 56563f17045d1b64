//! PWM device class.
//!
//! Wraps a [`PwmDriver`] into a [`DeviceOps`] implementation. The class
//! owns the frequency policy: a zero frequency means "disabled", opening
//! picks [`PWM_DEFAULT_FREQ`] when none was set, and every frequency handed
//! to the driver is first clamped into the range given by [`PwmInfo`].
//!
//! # Samples
//!
//! Reads and writes move native-endian `u32` duty values, one per 4 bytes.
//! The transfer `offset` is the channel.
//!
//! # ioctl
//!
//! | Command | Argument | Effect |
//! |---|---|---|
//! | [`Command::SET_CONFIG`] | [`PwmConfig`] | clamp, configure, cache; the clamped value is written back |
//! | [`Command::GET_CONFIG`] | [`PwmConfig`] | copy out the cached configuration |

use core::any::Any;

use common::{Error, Result};

use crate::config::PWM_DEFAULT_FREQ;
use crate::device::ioctl::arg_mut;
use crate::device::{
    Command, DeviceOps, Direction, OpenFlags, check_samples, missing_op, transfer_samples,
};

const SAMPLE: usize = size_of::<u32>();

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct PwmConfig {
    /// Frequency in Hz, 0 when the output is disabled.
    pub freq: u32,
}

/// Frequency range the hardware can produce.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PwmInfo {
    pub min_freq: u32,
    pub max_freq: u32,
}

impl PwmInfo {
    pub fn clamp(&self, freq: u32) -> u32 {
        freq.clamp(self.min_freq, self.max_freq)
    }
}

/// Hardware side of a PWM device.
///
/// Unimplemented operations fail with `Io`.
pub trait PwmDriver: Send {
    /// Apply `config`. A zero frequency turns the outputs off.
    fn configure(&mut self, config: &PwmConfig) -> Result<()> {
        let _ = config;
        Err(missing_op("pwm configure"))
    }

    fn write(&mut self, channel: u32, duty: u32) -> Result<()> {
        let _ = (channel, duty);
        Err(missing_op("pwm write"))
    }

    fn read(&mut self, channel: u32) -> Result<u32> {
        let _ = channel;
        Err(missing_op("pwm read"))
    }
}

pub struct Pwm<D> {
    driver: D,
    info: PwmInfo,
    config: PwmConfig,
}

impl<D: PwmDriver> Pwm<D> {
    /// # Panics
    /// Panics unless `0 < info.min_freq < info.max_freq`.
    pub fn new(driver: D, info: PwmInfo) -> Self {
        assert!(info.min_freq > 0, "PWM minimum frequency must be non-zero");
        assert!(
            info.max_freq > info.min_freq,
            "PWM maximum frequency must exceed the minimum"
        );
        Self {
            driver,
            info,
            config: PwmConfig::default(),
        }
    }

    /// Last configuration the driver accepted.
    pub fn config(&self) -> PwmConfig {
        self.config
    }

    pub fn info(&self) -> PwmInfo {
        self.info
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }
}

impl<D: PwmDriver> DeviceOps for Pwm<D> {
    fn open(&mut self, _flags: OpenFlags) -> Result<()> {
        if self.config.freq == 0 {
            self.config.freq = PWM_DEFAULT_FREQ;
        }
        self.config.freq = self.info.clamp(self.config.freq);
        self.driver.configure(&self.config)
    }

    fn close(&mut self) -> Result<()> {
        self.config.freq = 0;
        self.driver.configure(&self.config)
    }

    fn ioctl(&mut self, cmd: Command, args: Option<&mut dyn Any>) -> Result<()> {
        if cmd.code() != 0 {
            return Err(Error::Unsupported);
        }
        match cmd.direction() {
            Some(Direction::SetConfig) => {
                let requested = arg_mut::<PwmConfig>(args)?;
                let config = PwmConfig {
                    freq: self.info.clamp(requested.freq),
                };
                self.driver.configure(&config)?;
                self.config = config;
                *requested = config;
                Ok(())
            }
            Some(Direction::GetConfig) => {
                *arg_mut::<PwmConfig>(args)? = self.config;
                Ok(())
            }
            _ => Err(Error::Unsupported),
        }
    }

    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<usize> {
        check_samples(buf.len(), SAMPLE)?;
        transfer_samples(buf.chunks_exact_mut(SAMPLE), SAMPLE, |sample| {
            let duty = self.driver.read(offset)?;
            sample.copy_from_slice(&duty.to_ne_bytes());
            Ok(())
        })
    }

    fn write(&mut self, offset: u32, buf: &[u8]) -> Result<usize> {
        check_samples(buf.len(), SAMPLE)?;
        transfer_samples(buf.chunks_exact(SAMPLE), SAMPLE, |sample| {
            let mut duty = [0; SAMPLE];
            duty.copy_from_slice(sample);
            self.driver.write(offset, u32::from_ne_bytes(duty))
        })
    }
}
