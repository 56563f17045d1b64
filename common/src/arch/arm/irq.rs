use crate::sync::irq::{IrqControl, MaskState};

/// I bit of the CPSR: set while IRQs are masked.
const CPSR_I: u32 = 1 << 7;

/// Global mask for A/R-profile cores (the CPSR I bit).
pub struct ArmIrq;

impl ArmIrq {
    #[inline(always)]
    fn read_and_mask() -> u32 {
        let cpsr: u32;
        // SAFETY: reads CPSR then sets the I bit; no memory is touched
        unsafe {
            core::arch::asm!(
                "mrs {0}, cpsr",
                "cpsid i",
                out(reg) cpsr,
                options(nomem, nostack)
            );
        }
        cpsr
    }
}

impl IrqControl for ArmIrq {
    #[inline(always)]
    fn disable() -> MaskState {
        MaskState::from_enabled(Self::read_and_mask() & CPSR_I == 0)
    }

    #[inline(always)]
    fn restore(state: MaskState) {
        if state.was_enabled() {
            // SAFETY: clears the I bit set by the matching `disable`
            unsafe { core::arch::asm!("cpsie i", options(nomem, nostack)) };
        }
    }
}
