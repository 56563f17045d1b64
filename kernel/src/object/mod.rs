//! Object registry.
//!
//! Every stateful component (device, state machine, event queue, soft
//! timer, module) embeds an [`Object`] and is registered under a name in
//! the container for its [`ObjectType`]. Names are unique per type.

use core::fmt;

pub mod name;
pub mod registry;
pub mod table;

pub use name::ObjectName;
pub use registry::{Container, OBJECTS, Object, ObjectRegistry};
pub use table::{ObjectEntry, ObjectId};

/// Type tag selecting an object's container.
///
/// Stored as a raw byte so that tags coming from outside the kernel can be
/// represented; tags at or past [`ObjectType::COUNT`] have no container.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct ObjectType(u8);

impl ObjectType {
    pub const NONE: Self = Self(0);
    pub const DEVICE: Self = Self(1);
    pub const FSM: Self = Self(2);
    pub const EVENT: Self = Self(3);
    pub const SOFT_TIMER: Self = Self(4);
    pub const MODULE: Self = Self(5);

    /// Number of containers.
    pub const COUNT: usize = 6;

    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Container index, or `None` if this tag has no container.
    pub const fn index(self) -> Option<usize> {
        if (self.0 as usize) < Self::COUNT {
            Some(self.0 as usize)
        } else {
            None
        }
    }
}

impl fmt::Debug for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NONE => f.write_str("None"),
            Self::DEVICE => f.write_str("Device"),
            Self::FSM => f.write_str("Fsm"),
            Self::EVENT => f.write_str("Event"),
            Self::SOFT_TIMER => f.write_str("SoftTimer"),
            Self::MODULE => f.write_str("Module"),
            Self(raw) => write!(f, "Unknown({raw})"),
        }
    }
}
