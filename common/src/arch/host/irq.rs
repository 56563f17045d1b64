use core::sync::atomic::{AtomicUsize, Ordering};

use crate::sync::irq::{IrqControl, MaskState};

/// Masked regions currently open, across all host threads.
static DEPTH: AtomicUsize = AtomicUsize::new(0);

/// Stand-in interrupt mask for hosted builds (unit tests, simulators).
///
/// There are no interrupts to mask, so this only counts open regions.
/// Test threads run in parallel, so the count is global rather than per
/// region; exclusion between threads comes from the lock wrapped around
/// every masked region, not from this count.
pub struct HostIrq;

impl HostIrq {
    /// Whether any masked region is open.
    pub fn is_masked() -> bool {
        DEPTH.load(Ordering::Acquire) > 0
    }
}

impl IrqControl for HostIrq {
    fn disable() -> MaskState {
        MaskState::from_enabled(DEPTH.fetch_add(1, Ordering::AcqRel) == 0)
    }

    fn restore(_state: MaskState) {
        DEPTH.fetch_sub(1, Ordering::AcqRel);
    }
}
