//! Digital pin device class.
//!
//! One device covers a whole bank of pins. Transfers address a pin by
//! `offset` and move one byte per level sample (0 low, anything else high).
//! Configuration works on the pin selected with [`Command::SET_OFFSET`].

use core::any::Any;

use common::{Error, Result};

use crate::config::PIN_CAPACITY;
use crate::device::ioctl::arg_mut;
use crate::device::{
    Command, DeviceOps, Direction, OpenFlags, check_samples, missing_op, transfer_samples,
};

/// Pin logic level.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PinLevel {
    Low,
    High,
}

impl From<bool> for PinLevel {
    fn from(value: bool) -> Self {
        if value { PinLevel::High } else { PinLevel::Low }
    }
}

impl From<PinLevel> for bool {
    fn from(level: PinLevel) -> bool {
        matches!(level, PinLevel::High)
    }
}

impl From<u8> for PinLevel {
    fn from(sample: u8) -> Self {
        PinLevel::from(sample != 0)
    }
}

impl From<PinLevel> for u8 {
    fn from(level: PinLevel) -> u8 {
        bool::from(level) as u8
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum PinMode {
    /// Unconfigured, pin left to the hardware reset state.
    #[default]
    None = 0,
    Output = 1,
    OutputOpenDrain = 2,
    Input = 3,
    InputPullDown = 4,
    InputPullUp = 5,
    IrqRising = 6,
    IrqFalling = 7,
    IrqEdge = 8,
    IrqLow = 9,
    IrqHigh = 10,
}

/// Hardware side of a pin bank.
pub trait PinDriver: Send {
    fn configure(&mut self, number: u32, mode: PinMode) -> Result<()> {
        let _ = (number, mode);
        Err(missing_op("pin configure"))
    }

    fn write(&mut self, number: u32, level: PinLevel) -> Result<()> {
        let _ = (number, level);
        Err(missing_op("pin write"))
    }

    fn read(&mut self, number: u32) -> Result<PinLevel> {
        let _ = number;
        Err(missing_op("pin read"))
    }
}

pub struct Pin<D> {
    driver: D,
    selected: u32,
    modes: [PinMode; PIN_CAPACITY],
}

impl<D: PinDriver> Pin<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            selected: 0,
            modes: [PinMode::None; PIN_CAPACITY],
        }
    }

    /// Mode last accepted for pin `number`.
    pub fn mode(&self, number: u32) -> Option<PinMode> {
        self.modes.get(number as usize).copied()
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    fn check_number(number: u32) -> Result<u32> {
        if (number as usize) < PIN_CAPACITY {
            Ok(number)
        } else {
            Err(Error::Invalid)
        }
    }
}

impl<D: PinDriver> DeviceOps for Pin<D> {
    fn open(&mut self, _flags: OpenFlags) -> Result<()> {
        Ok(())
    }

    /// Return every configured pin to [`PinMode::None`].
    fn close(&mut self) -> Result<()> {
        for (number, mode) in self.modes.iter_mut().enumerate() {
            if *mode != PinMode::None {
                self.driver.configure(number as u32, PinMode::None)?;
                *mode = PinMode::None;
            }
        }
        Ok(())
    }

    fn ioctl(&mut self, cmd: Command, args: Option<&mut dyn Any>) -> Result<()> {
        if cmd.code() != 0 {
            return Err(Error::Unsupported);
        }
        match cmd.direction() {
            Some(Direction::SetOffset) => {
                self.selected = Self::check_number(*arg_mut::<u32>(args)?)?;
                Ok(())
            }
            Some(Direction::GetOffset) => {
                *arg_mut::<u32>(args)? = self.selected;
                Ok(())
            }
            Some(Direction::SetConfig) => {
                let mode = *arg_mut::<PinMode>(args)?;
                self.driver.configure(self.selected, mode)?;
                self.modes[self.selected as usize] = mode;
                Ok(())
            }
            Some(Direction::GetConfig) => {
                *arg_mut::<PinMode>(args)? = self.modes[self.selected as usize];
                Ok(())
            }
            None => Err(Error::Unsupported),
        }
    }

    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<usize> {
        let number = Self::check_number(offset)?;
        check_samples(buf.len(), 1)?;
        transfer_samples(buf.iter_mut(), 1, |sample| {
            *sample = self.driver.read(number)?.into();
            Ok(())
        })
    }

    fn write(&mut self, offset: u32, buf: &[u8]) -> Result<usize> {
        let number = Self::check_number(offset)?;
        check_samples(buf.len(), 1)?;
        transfer_samples(buf.iter(), 1, |&sample| {
            self.driver.write(number, sample.into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bank {
        levels: [bool; PIN_CAPACITY],
        configured: Vec<(u32, PinMode)>,
    }

    impl Bank {
        fn new() -> Self {
            Self {
                levels: [false; PIN_CAPACITY],
                configured: Vec::new(),
            }
        }
    }

    impl PinDriver for Bank {
        fn configure(&mut self, number: u32, mode: PinMode) -> Result<()> {
            self.configured.push((number, mode));
            Ok(())
        }

        fn write(&mut self, number: u32, level: PinLevel) -> Result<()> {
            self.levels[number as usize] = level.into();
            Ok(())
        }

        fn read(&mut self, number: u32) -> Result<PinLevel> {
            Ok(self.levels[number as usize].into())
        }
    }

    #[test]
    fn configure_selected_pin() {
        let mut pin = Pin::new(Bank::new());
        pin.ioctl(Command::SET_OFFSET, Some(&mut 5u32)).unwrap();
        pin.ioctl(Command::SET_CONFIG, Some(&mut PinMode::Output))
            .unwrap();

        let mut number = 0u32;
        pin.ioctl(Command::GET_OFFSET, Some(&mut number)).unwrap();
        assert_eq!(number, 5);
        let mut mode = PinMode::None;
        pin.ioctl(Command::GET_CONFIG, Some(&mut mode)).unwrap();
        assert_eq!(mode, PinMode::Output);
        assert_eq!(pin.driver().configured, [(5, PinMode::Output)]);
    }

    #[test]
    fn out_of_range_pin_is_invalid() {
        let mut pin = Pin::new(Bank::new());
        let mut number = PIN_CAPACITY as u32;
        assert_eq!(
            pin.ioctl(Command::SET_OFFSET, Some(&mut number)),
            Err(Error::Invalid)
        );
        assert_eq!(pin.write(number, &[1]), Err(Error::Invalid));
    }

    #[test]
    fn levels_round_trip_through_driver() {
        let mut pin = Pin::new(Bank::new());
        assert_eq!(pin.write(3, &[0, 7]), Ok(2));
        let mut level = [0u8; 1];
        assert_eq!(pin.read(3, &mut level), Ok(1));
        assert_eq!(level, [1]);
    }

    #[test]
    fn close_resets_configured_pins() {
        let mut pin = Pin::new(Bank::new());
        pin.ioctl(Command::SET_OFFSET, Some(&mut 2u32)).unwrap();
        pin.ioctl(Command::SET_CONFIG, Some(&mut PinMode::InputPullUp))
            .unwrap();
        pin.close().unwrap();

        assert_eq!(pin.mode(2), Some(PinMode::None));
        assert_eq!(
            pin.driver().configured,
            [(2, PinMode::InputPullUp), (2, PinMode::None)]
        );
    }
}
