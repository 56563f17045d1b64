use crate::sync::irq::{IrqControl, MaskState};

/// PM bit of PRIMASK: set while configurable interrupts are masked.
const PRIMASK_PM: u32 = 1;

/// Global mask for Cortex-M microcontrollers.
///
/// M-profile cores have no CPSR; the mask lives in PRIMASK.
pub struct PrimaskIrq;

impl IrqControl for PrimaskIrq {
    #[inline(always)]
    fn disable() -> MaskState {
        let primask: u32;
        // SAFETY: reads PRIMASK then sets it; no memory is touched
        unsafe {
            core::arch::asm!(
                "mrs {0}, primask",
                "cpsid i",
                out(reg) primask,
                options(nomem, nostack, preserves_flags)
            );
        }
        MaskState::from_enabled(primask & PRIMASK_PM == 0)
    }

    #[inline(always)]
    fn restore(state: MaskState) {
        if state.was_enabled() {
            // SAFETY: clears PRIMASK set by the matching `disable`
            unsafe { core::arch::asm!("cpsie i", options(nomem, nostack, preserves_flags)) };
        }
    }
}
