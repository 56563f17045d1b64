pub mod irq;
pub mod irq_spinlock;
pub mod mutex;

pub use irq::{IrqControl, MaskState};
pub use irq_spinlock::IrqSpinLock;
pub use mutex::{Mutex, Owner};
