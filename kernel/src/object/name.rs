use core::fmt;

use crate::config::OBJECT_NAME_SIZE;

/// Fixed-capacity object name.
///
/// Names longer than [`OBJECT_NAME_SIZE`] bytes are cut at the last
/// character boundary that fits, so two names that differ only past the
/// capacity compare equal.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct ObjectName {
    bytes: [u8; OBJECT_NAME_SIZE],
    len: u8,
}

impl ObjectName {
    pub const EMPTY: Self = Self {
        bytes: [0; OBJECT_NAME_SIZE],
        len: 0,
    };

    pub fn new(name: &str) -> Self {
        let mut len = name.len().min(OBJECT_NAME_SIZE);
        while !name.is_char_boundary(len) {
            len -= 1;
        }

        let mut bytes = [0; OBJECT_NAME_SIZE];
        bytes[..len].copy_from_slice(&name.as_bytes()[..len]);
        Self {
            bytes,
            len: len as u8,
        }
    }

    pub fn as_str(&self) -> &str {
        // SAFETY: built from a `&str` cut on a char boundary
        unsafe { core::str::from_utf8_unchecked(&self.bytes[..self.len as usize]) }
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `name` would be stored as this name.
    pub fn matches(&self, name: &str) -> bool {
        *self == Self::new(name)
    }
}

impl From<&str> for ObjectName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Debug for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names_are_kept() {
        let name = ObjectName::new("pwm1");
        assert_eq!(name.as_str(), "pwm1");
        assert_eq!(name.len(), 4);
    }

    #[test]
    fn long_names_are_truncated() {
        let long = "a-very-long-device-name";
        let name = ObjectName::new(long);
        assert_eq!(name.len(), OBJECT_NAME_SIZE);
        assert_eq!(name.as_str(), &long[..OBJECT_NAME_SIZE]);
        assert!(name.matches("a-very-long-device-name-with-another-tail"));
        assert!(!name.matches("a-very"));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // 14 ASCII bytes followed by a 2-byte character straddling the cut
        let name = ObjectName::new("abcdefghijklmné");
        assert!(name.len() <= OBJECT_NAME_SIZE);
        assert_eq!(name.as_str(), "abcdefghijklmn");
    }
}
