//! Device table and dispatch.
//!
//! The table is only touched inside short masked regions. A driver call
//! runs outside them: the driver is checked out of its slot, called with
//! interrupts live, then checked back in. While it is out, any other call
//! on the same device (say from an interrupt handler that preempted it)
//! fails with `Busy` instead of spinning. Registry calls also run with the
//! table unlocked, so masked regions never nest.

use core::any::Any;

use common::arch::PlatformIrq;
use common::sync::IrqSpinLock;
use common::{Error, Result};
use kernel::{OBJECTS, Object, ObjectName, ObjectRegistry, ObjectType};

use super::{Command, DeviceOps, OpenFlags};
use crate::config::DEVICE_CAPACITY;

/// Handle to a registered device. Goes stale once the device is removed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DeviceHandle {
    slot: u16,
    generation: u16,
}

type Driver = &'static mut dyn DeviceOps;

struct DeviceSlot {
    object: Object,
    /// `None` while checked out, or while the slot is being registered or
    /// removed.
    ops: Option<Driver>,
    support: OpenFlags,
    open_flags: OpenFlags,
    ref_count: u32,
}

impl DeviceSlot {
    fn checkout(&mut self) -> Result<Driver> {
        self.ops.take().ok_or(Error::Busy)
    }
}

struct Table<const N: usize> {
    slots: [Option<DeviceSlot>; N],
    generations: [u16; N],
}

impl<const N: usize> Table<N> {
    fn handle(&self, slot: usize) -> DeviceHandle {
        DeviceHandle {
            slot: slot as u16,
            generation: self.generations[slot],
        }
    }

    fn slot(&self, handle: DeviceHandle) -> Result<&DeviceSlot> {
        let slot = handle.slot as usize;
        if self.generations.get(slot) != Some(&handle.generation) {
            return Err(Error::NotFound);
        }
        self.slots[slot].as_ref().ok_or(Error::NotFound)
    }

    fn slot_mut(&mut self, handle: DeviceHandle) -> Result<&mut DeviceSlot> {
        let slot = handle.slot as usize;
        if self.generations.get(slot) != Some(&handle.generation) {
            return Err(Error::NotFound);
        }
        self.slots[slot].as_mut().ok_or(Error::NotFound)
    }
}

/// Registered devices, named through an [`ObjectRegistry`].
///
/// Each device's registry object carries its slot index as cookie, so a
/// name lookup lands straight on the slot.
pub struct DeviceManager<'r, const N: usize = DEVICE_CAPACITY> {
    registry: &'r ObjectRegistry,
    table: IrqSpinLock<Table<N>, PlatformIrq>,
}

impl<'r, const N: usize> DeviceManager<'r, N> {
    pub const fn new(registry: &'r ObjectRegistry) -> Self {
        Self {
            registry,
            table: IrqSpinLock::new(Table {
                slots: [const { None }; N],
                generations: [0; N],
            }),
        }
    }

    /// Register `ops` as a device named `name` supporting `support` modes.
    ///
    /// Fails with whatever the registry's `add` fails with, or `NoMemory`
    /// when the device table is full.
    pub fn register(&self, name: &str, ops: Driver, support: OpenFlags) -> Result<DeviceHandle> {
        let slot = {
            let mut table = self.table.lock();
            let slot = table
                .slots
                .iter()
                .position(Option::is_none)
                .ok_or(Error::NoMemory)?;
            table.slots[slot] = Some(DeviceSlot {
                object: Object::new(),
                ops: None,
                support,
                open_flags: OpenFlags::empty(),
                ref_count: 0,
            });
            slot
        };

        let mut object = Object::new();
        let added = self
            .registry
            .add_tagged(&mut object, name, ObjectType::DEVICE, slot);

        let mut table = self.table.lock();
        if let Err(err) = added {
            table.slots[slot] = None;
            return Err(err);
        }
        if let Some(device) = table.slots[slot].as_mut() {
            device.object = object;
            device.ops = Some(ops);
        }
        let handle = table.handle(slot);
        drop(table);

        log::debug!("device {} registered, support {:?}", name, support);
        Ok(handle)
    }

    /// Handle of the device registered as `name`.
    pub fn find(&self, name: &str) -> Option<DeviceHandle> {
        let entry = self.registry.find(name, ObjectType::DEVICE)?;
        let slot = entry.cookie;
        let table = self.table.lock();
        let device = table.slots.get(slot)?.as_ref()?;
        (device.object.id() == Some(entry.id)).then(|| table.handle(slot))
    }

    /// Open for `flags`. The driver's open runs only for the first user.
    pub fn open(&self, handle: DeviceHandle, flags: OpenFlags) -> Result<()> {
        let ops = {
            let mut table = self.table.lock();
            let device = table.slot_mut(handle)?;
            if flags.is_empty() || !device.support.contains(flags) {
                return Err(Error::Unsupported);
            }
            if device.ref_count > 0 {
                device.ref_count += 1;
                device.open_flags |= flags;
                return Ok(());
            }
            device.checkout()?
        };

        let (ops, result) = call(ops, |ops| ops.open(flags));
        let mut table = self.table.lock();
        let device = table.slot_mut(handle)?;
        device.ops = Some(ops);
        if result.is_ok() {
            device.ref_count += 1;
            device.open_flags |= flags;
        }
        result
    }

    /// Drop one user. The last one runs the driver's close; the device is
    /// closed afterwards even if that fails.
    pub fn close(&self, handle: DeviceHandle) -> Result<()> {
        let ops = {
            let mut table = self.table.lock();
            let device = table.slot_mut(handle)?;
            if device.ref_count == 0 {
                return Ok(());
            }
            if device.ref_count > 1 {
                device.ref_count -= 1;
                return Ok(());
            }
            let ops = device.checkout()?;
            device.ref_count = 0;
            device.open_flags = OpenFlags::empty();
            ops
        };

        let (ops, result) = call(ops, |ops| ops.close());
        self.checkin(handle, ops);
        result
    }

    pub fn ioctl(
        &self,
        handle: DeviceHandle,
        cmd: Command,
        args: Option<&mut dyn Any>,
    ) -> Result<()> {
        let ops = self.table.lock().slot_mut(handle)?.checkout()?;
        let (ops, result) = call(ops, |ops| ops.ioctl(cmd, args));
        self.checkin(handle, ops);
        result
    }

    /// Read into `buf` from sub-resource `offset`. Needs an open for reading.
    pub fn read(&self, handle: DeviceHandle, offset: u32, buf: &mut [u8]) -> Result<usize> {
        let ops = self.checkout_for(handle, OpenFlags::RDONLY)?;
        let (ops, result) = call(ops, |ops| ops.read(offset, buf));
        self.checkin(handle, ops);
        result
    }

    /// Write `buf` to sub-resource `offset`. Needs an open for writing.
    pub fn write(&self, handle: DeviceHandle, offset: u32, buf: &[u8]) -> Result<usize> {
        let ops = self.checkout_for(handle, OpenFlags::WRONLY)?;
        let (ops, result) = call(ops, |ops| ops.write(offset, buf));
        self.checkin(handle, ops);
        result
    }

    /// Unregister a closed device and hand its driver back.
    ///
    /// `Busy` while the device is open or one of its calls is in flight.
    pub fn remove(&self, handle: DeviceHandle) -> Result<Driver> {
        let (ops, mut object) = {
            let mut table = self.table.lock();
            let device = table.slot_mut(handle)?;
            if device.ref_count > 0 {
                return Err(Error::Busy);
            }
            let ops = device.checkout()?;
            (ops, core::mem::take(&mut device.object))
        };

        let removed = self.registry.remove(&mut object);

        let mut table = self.table.lock();
        if let Err(err) = removed {
            if let Ok(device) = table.slot_mut(handle) {
                device.object = object;
                device.ops = Some(ops);
            }
            return Err(err);
        }
        let slot = handle.slot as usize;
        table.slots[slot] = None;
        table.generations[slot] = table.generations[slot].wrapping_add(1);
        drop(table);

        log::debug!("device slot {} removed", slot);
        Ok(ops)
    }

    pub fn name(&self, handle: DeviceHandle) -> Option<ObjectName> {
        let id = self.table.lock().slot(handle).ok()?.object.id()?;
        self.registry.get(id).map(|entry| entry.name)
    }

    pub fn is_open(&self, handle: DeviceHandle) -> bool {
        self.open_count(handle) > 0
    }

    /// Number of users currently holding the device open.
    pub fn open_count(&self, handle: DeviceHandle) -> u32 {
        self.table
            .lock()
            .slot(handle)
            .map_or(0, |device| device.ref_count)
    }

    fn checkout_for(&self, handle: DeviceHandle, mode: OpenFlags) -> Result<Driver> {
        let mut table = self.table.lock();
        let device = table.slot_mut(handle)?;
        if !device.open_flags.contains(mode) {
            return Err(Error::Unsupported);
        }
        device.checkout()
    }

    /// A checked-out slot cannot be removed, so the handle still resolves.
    fn checkin(&self, handle: DeviceHandle, ops: Driver) {
        if let Ok(device) = self.table.lock().slot_mut(handle) {
            device.ops = Some(ops);
        }
    }
}

/// Run `f` on a checked-out driver, interrupts live, and hand it back.
fn call<R>(ops: Driver, f: impl FnOnce(&mut (dyn DeviceOps + 'static)) -> R) -> (Driver, R) {
    let result = f(&mut *ops);
    (ops, result)
}

static DEVICES: DeviceManager<'static> = DeviceManager::new(&OBJECTS);

/// The system device table, named through [`OBJECTS`].
///
/// Safe to use from interrupt handlers: a handler that reaches a device
/// whose driver call it preempted gets `Busy`.
pub fn devices() -> &'static DeviceManager<'static> {
    &DEVICES
}
