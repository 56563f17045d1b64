use common::arch::PlatformIrq;
use common::sync::IrqSpinLock;
use common::sync::irq::IrqControl;
use common::{Error, Result};

use super::ObjectType;
use super::name::ObjectName;
use super::table::{ObjectEntry, ObjectId, ObjectTable};
use crate::config::OBJECT_CAPACITY;

/// Registry record embedded in a component.
///
/// Holds the component's handle while it is registered. The component
/// itself stays owned by whoever created it; removing the object only
/// unlinks it.
#[derive(Debug, Default)]
pub struct Object {
    id: Option<ObjectId>,
}

impl Object {
    pub const fn new() -> Self {
        Self { id: None }
    }

    pub fn id(&self) -> Option<ObjectId> {
        self.id
    }

    pub fn is_registered(&self) -> bool {
        self.id.is_some()
    }
}

/// The container for one type tag.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Container {
    kind: ObjectType,
}

impl Container {
    pub fn kind(&self) -> ObjectType {
        self.kind
    }
}

/// Name and type registry for every component.
///
/// All list access runs with interrupts masked. Closures handed to
/// [`ObjectRegistry::for_each`] run inside that region and must not call
/// back into the registry.
pub struct ObjectRegistry<I: IrqControl = PlatformIrq, const CAP: usize = OBJECT_CAPACITY> {
    table: IrqSpinLock<ObjectTable<CAP>, I>,
}

/// The system registry.
pub static OBJECTS: ObjectRegistry = ObjectRegistry::new();

impl<I: IrqControl, const CAP: usize> ObjectRegistry<I, CAP> {
    pub const fn new() -> Self {
        Self {
            table: IrqSpinLock::new(ObjectTable::new()),
        }
    }

    /// Container for `kind`, or `None` if the tag is out of range.
    pub fn find_container(&self, kind: ObjectType) -> Option<Container> {
        kind.index().map(|_| Container { kind })
    }

    /// Object of type `kind` whose (truncated) name equals `name`.
    pub fn find(&self, name: &str, kind: ObjectType) -> Option<ObjectEntry> {
        let container = self.find_container(kind)?;
        let name = ObjectName::new(name);
        self.table.lock().find(container.kind, &name)
    }

    /// Register `object` under `name` in `kind`'s container.
    pub fn add(&self, object: &mut Object, name: &str, kind: ObjectType) -> Result<()> {
        self.add_tagged(object, name, kind, 0)
    }

    /// [`add`](Self::add), recording `cookie` alongside the object.
    ///
    /// Fails with `Unsupported` for a tag without a container, `Busy` if the
    /// name is taken in that container or `object` is already registered,
    /// and `NoMemory` if every slot is in use.
    pub fn add_tagged(
        &self,
        object: &mut Object,
        name: &str,
        kind: ObjectType,
        cookie: usize,
    ) -> Result<()> {
        let container = self.find_container(kind).ok_or(Error::Unsupported)?;
        let name = ObjectName::new(name);

        let mut table = self.table.lock();
        if object.id.is_some_and(|id| table.get(id).is_some()) {
            return Err(Error::Busy);
        }
        if table.find(container.kind, &name).is_some() {
            return Err(Error::Busy);
        }
        let id = table.insert(container.kind, name, cookie)?;
        drop(table);

        object.id = Some(id);
        log::trace!("object {} added as {:?}", name, kind);
        Ok(())
    }

    /// Unlink `object` from its container.
    pub fn remove(&self, object: &mut Object) -> Result<()> {
        let id = object.id.ok_or(Error::NotFound)?;
        let entry = self.table.lock().remove(id)?;
        object.id = None;
        log::trace!("object {} removed from {:?}", entry.name, entry.kind);
        Ok(())
    }

    /// Move `object` to `kind`'s container, keeping its identity and name.
    ///
    /// The presence check and the move are separate masked regions, so an
    /// interrupt can remove the object in between; the move then reports
    /// `NotFound`. No uniqueness check is made against the new container.
    pub fn change_type(&self, object: &Object, kind: ObjectType) -> Result<()> {
        let container = self.find_container(kind).ok_or(Error::Unsupported)?;
        let id = object.id.ok_or(Error::NotFound)?;
        if self.table.lock().get(id).is_none() {
            return Err(Error::NotFound);
        }

        self.table.lock().retag(id, container.kind)?;
        log::trace!("object {:?} moved to {:?}", id, kind);
        Ok(())
    }

    /// Replace `object`'s name. Uniqueness is not rechecked; keeping names
    /// distinct is up to the caller. `NotFound` if `object` is not
    /// registered.
    pub fn rename(&self, object: &Object, name: &str) -> Result<()> {
        let id = object.id.ok_or(Error::NotFound)?;
        self.table.lock().rename(id, ObjectName::new(name))
    }

    /// Current name, type and cookie of `object`.
    pub fn lookup(&self, object: &Object) -> Option<ObjectEntry> {
        self.get(object.id?)
    }

    /// Current name, type and cookie of the object with handle `id`.
    pub fn get(&self, id: ObjectId) -> Option<ObjectEntry> {
        self.table.lock().get(id)
    }

    /// Number of objects in `kind`'s container.
    pub fn count(&self, kind: ObjectType) -> usize {
        match self.find_container(kind) {
            Some(container) => self.table.lock().iter(container.kind).count(),
            None => 0,
        }
    }

    /// Visit `kind`'s objects in registration order, interrupts masked.
    pub fn for_each(&self, kind: ObjectType, mut f: impl FnMut(&ObjectEntry)) {
        let Some(container) = self.find_container(kind) else {
            return;
        };
        let table = self.table.lock();
        for entry in table.iter(container.kind) {
            f(&entry);
        }
    }
}

impl<I: IrqControl, const CAP: usize> Default for ObjectRegistry<I, CAP> {
    fn default() -> Self {
        Self::new()
    }
}
