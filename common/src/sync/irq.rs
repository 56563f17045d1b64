//! Interrupt-mask contract every target provides.

/// Mask state found when a masked region was entered.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MaskState {
    /// Interrupts were live; leaving the region unmasks them again.
    Unmasked,
    /// Something already held the mask; leaving the region keeps it.
    Masked,
}

impl MaskState {
    pub const fn from_enabled(enabled: bool) -> Self {
        if enabled { Self::Unmasked } else { Self::Masked }
    }

    pub const fn was_enabled(self) -> bool {
        matches!(self, Self::Unmasked)
    }
}

/// The single global interrupt mask of the target.
///
/// Registry, heap and mutex state changes all run between `disable` and
/// `restore`, so an interrupt handler never sees them half done. There is
/// exactly one such region at a time: code already inside it must not call
/// another operation that masks. Implementations still hand back a
/// [`MaskState`] so a stray nested pair does not unmask early.
pub trait IrqControl {
    /// Mask interrupts and report what was in force before.
    fn disable() -> MaskState;

    /// Leave the region entered by the `disable` that returned `state`.
    fn restore(state: MaskState);
}
