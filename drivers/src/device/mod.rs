//! Device abstraction layer.
//!
//! A device is a registry object of type `DEVICE` plus a driver object that
//! implements [`DeviceOps`]. The trait's vtable plays the role of the shared
//! operation table and the implementing value is the driver's private data.
//!
//! Every operation has a protective default: a driver that leaves one out
//! gets an implementation that fails with [`Error::Io`] (and asserts in
//! debug builds with the `strict-ops` feature), so dispatch never has to
//! check for a missing entry.

use core::any::Any;

use bitflags::bitflags;
use common::{Error, Result};

pub mod ioctl;
pub mod manager;

pub use ioctl::{Command, Direction};
pub use manager::{DeviceHandle, DeviceManager, devices};

bitflags! {
    /// Access modes a device supports, or a consumer requests at open.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct OpenFlags: u8 {
        const RDONLY = 1 << 0;
        const WRONLY = 1 << 1;
        const RDWR = Self::RDONLY.bits() | Self::WRONLY.bits();
    }
}

/// Operations a device driver provides.
///
/// `offset` selects a sub-resource (channel, pin number) for transfers.
/// Transfers return the number of bytes moved.
pub trait DeviceOps: Send {
    /// Called on the first open only; later opens just count.
    fn open(&mut self, flags: OpenFlags) -> Result<()> {
        let _ = flags;
        Err(missing_op("open"))
    }

    /// Called when the last user closes.
    fn close(&mut self) -> Result<()> {
        Err(missing_op("close"))
    }

    fn ioctl(&mut self, cmd: Command, args: Option<&mut dyn Any>) -> Result<()> {
        let _ = (cmd, args);
        Err(missing_op("ioctl"))
    }

    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<usize> {
        let _ = (offset, buf);
        Err(missing_op("read"))
    }

    fn write(&mut self, offset: u32, buf: &[u8]) -> Result<usize> {
        let _ = (offset, buf);
        Err(missing_op("write"))
    }
}

/// Result of dispatching to an operation a driver does not implement.
pub fn missing_op(op: &'static str) -> Error {
    #[cfg(feature = "strict-ops")]
    debug_assert!(false, "device operation `{op}` not implemented");
    let _ = op;
    Error::Io
}

/// Check that `len` is a non-zero whole number of `width`-byte samples.
pub fn check_samples(len: usize, width: usize) -> Result<()> {
    if len != 0 && len % width == 0 {
        Ok(())
    } else {
        Err(Error::Invalid)
    }
}

/// Move `samples` one at a time through `f`, counting `width` bytes each.
///
/// A failure on the first sample is the transfer's error. A failure later
/// ends the transfer short and reports the bytes already moved.
pub fn transfer_samples<S>(
    samples: impl Iterator<Item = S>,
    width: usize,
    mut f: impl FnMut(S) -> Result<()>,
) -> Result<usize> {
    let mut moved = 0;
    for sample in samples {
        if let Err(err) = f(sample) {
            return if moved == 0 { Err(err) } else { Ok(moved) };
        }
        moved += width;
    }
    Ok(moved)
}

#[cfg(all(test, not(feature = "strict-ops")))]
mod tests {
    use super::*;

    struct Bare;
    impl DeviceOps for Bare {}

    #[test]
    fn every_missing_operation_fails_with_io() {
        let mut bare = Bare;
        let mut buf = [0u8; 4];
        assert_eq!(bare.open(OpenFlags::RDWR), Err(Error::Io));
        assert_eq!(bare.close(), Err(Error::Io));
        assert_eq!(bare.ioctl(Command::SET_CONFIG, None), Err(Error::Io));
        assert_eq!(bare.read(0, &mut buf), Err(Error::Io));
        assert_eq!(bare.write(0, &buf), Err(Error::Io));
    }

    #[test]
    fn sample_check() {
        assert_eq!(check_samples(8, 4), Ok(()));
        assert_eq!(check_samples(0, 4), Err(Error::Invalid));
        assert_eq!(check_samples(6, 4), Err(Error::Invalid));
    }

    #[test]
    fn transfer_stops_short_after_first_sample() {
        let fail_at = |n: u32| move |i: u32| if i == n { Err(Error::Io) } else { Ok(()) };

        assert_eq!(transfer_samples(0..4u32, 4, fail_at(9)), Ok(16));
        assert_eq!(transfer_samples(0..4u32, 4, fail_at(2)), Ok(8));
        assert_eq!(transfer_samples(0..4u32, 4, fail_at(0)), Err(Error::Io));
    }
}
