//! ioctl command words.
//!
//! The top byte of a command selects the direction, the low 24 bits carry a
//! class-specific sub-code. Get commands have bit 31 set.

use core::any::Any;
use core::fmt;

use common::{Error, Result};

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Command(u32);

/// Which half of a device's state a command addresses.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    /// Write the configuration of the selected sub-resource.
    SetConfig,
    /// Select a sub-resource (channel, pin number).
    SetOffset,
    GetConfig,
    GetOffset,
}

impl Command {
    pub const FLAG_MASK: u32 = 0xff00_0000;
    pub const CODE_MASK: u32 = !Self::FLAG_MASK;

    pub const SET_OFFSET: Self = Self(0x0100_0000);
    pub const SET_CONFIG: Self = Self(0x0200_0000);
    pub const GET_OFFSET: Self = Self(0x8100_0000);
    pub const GET_CONFIG: Self = Self(0x8200_0000);

    pub const fn new(direction: Direction, code: u32) -> Self {
        let flags = match direction {
            Direction::SetOffset => Self::SET_OFFSET.0,
            Direction::SetConfig => Self::SET_CONFIG.0,
            Direction::GetOffset => Self::GET_OFFSET.0,
            Direction::GetConfig => Self::GET_CONFIG.0,
        };
        Self(flags | (code & Self::CODE_MASK))
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// `None` for a flag byte that names no direction.
    pub const fn direction(self) -> Option<Direction> {
        match self.0 & Self::FLAG_MASK {
            0x0100_0000 => Some(Direction::SetOffset),
            0x0200_0000 => Some(Direction::SetConfig),
            0x8100_0000 => Some(Direction::GetOffset),
            0x8200_0000 => Some(Direction::GetConfig),
            _ => None,
        }
    }

    pub const fn code(self) -> u32 {
        self.0 & Self::CODE_MASK
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction() {
            Some(direction) => write!(f, "{:?}({:#x})", direction, self.code()),
            None => write!(f, "Command({:#010x})", self.0),
        }
    }
}

/// Downcast an ioctl argument. A missing or mistyped argument is `Invalid`.
pub fn arg_mut<'a, T: Any>(args: Option<&'a mut dyn Any>) -> Result<&'a mut T> {
    args.and_then(|args| args.downcast_mut::<T>())
        .ok_or(Error::Invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_and_code_split() {
        let cmd = Command::new(Direction::GetConfig, 7);
        assert_eq!(cmd.raw(), 0x8200_0007);
        assert_eq!(cmd.direction(), Some(Direction::GetConfig));
        assert_eq!(cmd.code(), 7);

        assert_eq!(Command::from_raw(0x0300_0000).direction(), None);
        assert_eq!(Command::SET_OFFSET.direction(), Some(Direction::SetOffset));
    }

    #[test]
    fn argument_downcast() {
        let mut value = 5u32;
        assert_eq!(arg_mut::<u32>(Some(&mut value)).copied(), Ok(5));
        assert_eq!(arg_mut::<u8>(Some(&mut value)).err(), Some(Error::Invalid));
        assert_eq!(arg_mut::<u32>(None).err(), Some(Error::Invalid));
    }
}
