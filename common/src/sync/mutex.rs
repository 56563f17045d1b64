//! Ownership mutex.
//!
//! There is no scheduler to park a waiter on, so `take` never waits: it
//! either records the caller as owner or fails with [`Error::Busy`]. Every
//! state change happens with interrupts masked.

use core::num::NonZeroUsize;

use super::irq::IrqControl;
use super::irq_spinlock::IrqSpinLock;
use crate::arch::PlatformIrq;
use crate::error::{Error, Result};

/// Opaque identity of a mutex holder, usually the holder's address.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Owner(NonZeroUsize);

impl Owner {
    /// Identity derived from where `holder` lives.
    ///
    /// # Panics
    /// Panics if `holder` is zero-sized: distinct zero-sized values may
    /// share an address and would compare as the same owner.
    pub fn of<T: ?Sized>(holder: &T) -> Self {
        assert!(
            size_of_val(holder) != 0,
            "zero-sized values have no distinct address"
        );
        let addr = holder as *const T as *const () as usize;
        // references are never null
        Self(NonZeroUsize::new(addr).unwrap_or(NonZeroUsize::MIN))
    }

    /// Identity from a raw token; `None` for zero.
    pub const fn from_raw(token: usize) -> Option<Self> {
        match NonZeroUsize::new(token) {
            Some(token) => Some(Self(token)),
            None => None,
        }
    }

    pub const fn as_raw(self) -> usize {
        self.0.get()
    }
}

#[derive(Debug)]
struct MutexState {
    hold: u32,
    owner: Option<Owner>,
}

/// Exclusive-ownership flag shared by cooperating components.
///
/// Invariant: `owner` is set exactly when `hold > 0`.
pub struct Mutex<I: IrqControl = PlatformIrq> {
    state: IrqSpinLock<MutexState, I>,
}

impl<I: IrqControl> Mutex<I> {
    /// An unowned mutex.
    pub const fn new() -> Self {
        Self {
            state: IrqSpinLock::new(MutexState {
                hold: 0,
                owner: None,
            }),
        }
    }

    /// Force the mutex back to the unowned state.
    pub fn init(&self) {
        let mut state = self.state.lock();
        state.hold = 0;
        state.owner = None;
    }

    /// Claim the mutex for `acquirer`.
    ///
    /// Fails with `Busy` whenever an owner is recorded, including when the
    /// owner is `acquirer` itself: acquisition is not reentrant.
    pub fn take(&self, acquirer: Owner) -> Result<()> {
        let mut state = self.state.lock();
        if state.owner.is_some() {
            return Err(Error::Busy);
        }
        state.hold += 1;
        state.owner = Some(acquirer);
        Ok(())
    }

    /// Give the mutex back. Only the recorded owner may do this; anyone
    /// else gets `Generic` and the state is left untouched.
    pub fn release(&self, owner: Owner) -> Result<()> {
        let mut state = self.state.lock();
        if state.owner != Some(owner) {
            return Err(Error::Generic);
        }
        state.hold -= 1;
        if state.hold == 0 {
            state.owner = None;
        }
        Ok(())
    }

    /// Current owner, if any.
    pub fn owner(&self) -> Option<Owner> {
        self.state.lock().owner
    }

    pub fn is_locked(&self) -> bool {
        self.owner().is_some()
    }
}

impl<I: IrqControl> Default for Mutex<I> {
    fn default() -> Self {
        Self::new()
    }
}
