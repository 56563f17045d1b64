//! DAC device class.
//!
//! Channels are selected with [`Command::SET_OFFSET`] and switched on or
//! off with [`Command::SET_CONFIG`]. Writes carry native-endian `u32`
//! samples to the channel given as `offset`, which must be enabled. The
//! class has no read path.

use core::any::Any;

use common::{Error, Result};

use crate::config::DAC_CHANNELS;
use crate::device::ioctl::arg_mut;
use crate::device::{
    Command, DeviceOps, Direction, OpenFlags, check_samples, missing_op, transfer_samples,
};

const SAMPLE: usize = size_of::<u32>();

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct DacConfig {
    pub enabled: bool,
}

pub trait DacDriver: Send {
    /// Power the converter up or down.
    fn configure(&mut self, enable: bool) -> Result<()> {
        let _ = enable;
        Err(missing_op("dac configure"))
    }

    fn channel_configure(&mut self, channel: u32, enable: bool) -> Result<()> {
        let _ = (channel, enable);
        Err(missing_op("dac channel_configure"))
    }

    fn write(&mut self, channel: u32, data: u32) -> Result<()> {
        let _ = (channel, data);
        Err(missing_op("dac write"))
    }
}

pub struct Dac<D> {
    driver: D,
    channel: u32,
    enabled: u32,
}

impl<D: DacDriver> Dac<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            channel: 0,
            enabled: 0,
        }
    }

    pub fn is_enabled(&self, channel: u32) -> bool {
        channel < DAC_CHANNELS && self.enabled & (1 << channel) != 0
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    fn check_channel(channel: u32) -> Result<u32> {
        if channel < DAC_CHANNELS {
            Ok(channel)
        } else {
            Err(Error::Invalid)
        }
    }
}

impl<D: DacDriver> DeviceOps for Dac<D> {
    fn open(&mut self, _flags: OpenFlags) -> Result<()> {
        self.driver.configure(true)
    }

    fn close(&mut self) -> Result<()> {
        for channel in 0..DAC_CHANNELS {
            if self.is_enabled(channel) {
                self.driver.channel_configure(channel, false)?;
                self.enabled &= !(1 << channel);
            }
        }
        self.driver.configure(false)
    }

    fn ioctl(&mut self, cmd: Command, args: Option<&mut dyn Any>) -> Result<()> {
        if cmd.code() != 0 {
            return Err(Error::Unsupported);
        }
        match cmd.direction() {
            Some(Direction::SetOffset) => {
                self.channel = Self::check_channel(*arg_mut::<u32>(args)?)?;
                Ok(())
            }
            Some(Direction::GetOffset) => {
                *arg_mut::<u32>(args)? = self.channel;
                Ok(())
            }
            Some(Direction::SetConfig) => {
                let config = *arg_mut::<DacConfig>(args)?;
                self.driver.channel_configure(self.channel, config.enabled)?;
                if config.enabled {
                    self.enabled |= 1 << self.channel;
                } else {
                    self.enabled &= !(1 << self.channel);
                }
                Ok(())
            }
            Some(Direction::GetConfig) => {
                *arg_mut::<DacConfig>(args)? = DacConfig {
                    enabled: self.is_enabled(self.channel),
                };
                Ok(())
            }
            None => Err(Error::Unsupported),
        }
    }

    fn write(&mut self, offset: u32, buf: &[u8]) -> Result<usize> {
        if !self.is_enabled(offset) {
            return Err(Error::Invalid);
        }
        check_samples(buf.len(), SAMPLE)?;
        transfer_samples(buf.chunks_exact(SAMPLE), SAMPLE, |sample| {
            let mut data = [0; SAMPLE];
            data.copy_from_slice(sample);
            self.driver.write(offset, u32::from_ne_bytes(data))
        })
    }
}
