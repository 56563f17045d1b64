//! Error set shared by the registry, the allocator front-ends, the mutex
//! and every device class.
//!
//! Errors cross the driver boundary as negative integers (`0` is success),
//! so each variant has a fixed code.

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Failure with no more specific cause.
    #[error("generic error")]
    Generic,

    /// Bad argument: missing ioctl payload, wrong payload type, bad size.
    #[error("invalid argument")]
    Invalid,

    /// Name already taken within its type, or resource already owned.
    #[error("resource busy")]
    Busy,

    /// Object or device is not registered.
    #[error("not found")]
    NotFound,

    /// Type tag, command or open mode the target does not support.
    #[error("operation not supported")]
    Unsupported,

    /// The driver reported a hardware failure, or the operation is missing.
    #[error("I/O error")]
    Io,

    /// A fixed-capacity table is full.
    #[error("out of memory")]
    NoMemory,
}

impl Error {
    /// Negative wire value.
    pub const fn code(self) -> i32 {
        match self {
            Error::Generic => -1,
            Error::Invalid => -2,
            Error::Busy => -3,
            Error::NotFound => -4,
            Error::Unsupported => -5,
            Error::Io => -6,
            Error::NoMemory => -7,
        }
    }

    /// Inverse of [`Error::code`]. Non-negative values are not errors.
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Error::Generic),
            -2 => Some(Error::Invalid),
            -3 => Some(Error::Busy),
            -4 => Some(Error::NotFound),
            -5 => Some(Error::Unsupported),
            -6 => Some(Error::Io),
            -7 => Some(Error::NoMemory),
            _ => None,
        }
    }
}

/// Collapse a status result into its wire value.
pub fn status_code(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => err.code(),
    }
}

/// Collapse a transfer result into its wire value: bytes moved, or a
/// negative error.
pub fn transfer_code(result: Result<usize>) -> isize {
    match result {
        Ok(count) => count as isize,
        Err(err) => err.code() as isize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_negative_and_distinct() {
        let all = [
            Error::Generic,
            Error::Invalid,
            Error::Busy,
            Error::NotFound,
            Error::Unsupported,
            Error::Io,
            Error::NoMemory,
        ];
        for (i, a) in all.iter().enumerate() {
            assert!(a.code() < 0);
            assert_eq!(Error::from_code(a.code()), Some(*a));
            for b in &all[i + 1..] {
                assert_ne!(a.code(), b.code());
            }
        }
        assert_eq!(Error::from_code(0), None);
    }

    #[test]
    fn transfer_code_keeps_sign_convention() {
        assert_eq!(transfer_code(Ok(12)), 12);
        assert_eq!(transfer_code(Err(Error::Io)), -6);
        assert_eq!(status_code(Ok(())), 0);
        assert_eq!(status_code(Err(Error::Busy)), -3);
    }
}
