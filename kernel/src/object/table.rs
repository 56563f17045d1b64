//! Index-linked storage behind the registry.
//!
//! One array holds every object slot. Each container is a circular doubly
//! linked list threaded through the slots by index and closed by a sentinel
//! head, so insert and unlink are O(1) and a name lookup walks one list.
//! Index space: `0..ObjectType::COUNT` are the sentinel heads, the slots
//! follow. Unused slots form a singly linked free list through `next`.

use common::{Error, Result};

use super::ObjectType;
use super::name::ObjectName;

const NIL: u16 = u16::MAX;
const HEADS: usize = ObjectType::COUNT;

/// Stable handle to a registered object.
///
/// The generation changes every time a slot is released, so a handle kept
/// past `remove` no longer resolves.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ObjectId {
    slot: u16,
    generation: u16,
}

/// Snapshot of one registered object.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub id: ObjectId,
    pub name: ObjectName,
    pub kind: ObjectType,
    /// Value chosen by the embedding component at registration, used to get
    /// from a registry hit back to the component.
    pub cookie: usize,
}

#[derive(Copy, Clone)]
struct Link {
    prev: u16,
    next: u16,
}

#[derive(Copy, Clone)]
struct Slot {
    link: Link,
    generation: u16,
    live: bool,
    kind: ObjectType,
    name: ObjectName,
    cookie: usize,
}

impl Slot {
    const VACANT: Self = Self {
        link: Link { prev: NIL, next: NIL },
        generation: 0,
        live: false,
        kind: ObjectType::NONE,
        name: ObjectName::EMPTY,
        cookie: 0,
    };

    fn entry(&self, index: u16) -> ObjectEntry {
        ObjectEntry {
            id: ObjectId {
                slot: index,
                generation: self.generation,
            },
            name: self.name,
            kind: self.kind,
            cookie: self.cookie,
        }
    }
}

pub struct ObjectTable<const CAP: usize> {
    heads: [Link; HEADS],
    slots: [Slot; CAP],
    free: u16,
}

impl<const CAP: usize> ObjectTable<CAP> {
    pub const fn new() -> Self {
        assert!(HEADS + CAP < NIL as usize, "object table too large");

        let mut heads = [Link { prev: 0, next: 0 }; HEADS];
        let mut i = 0;
        while i < HEADS {
            heads[i] = Link {
                prev: i as u16,
                next: i as u16,
            };
            i += 1;
        }

        let mut slots = [Slot::VACANT; CAP];
        let mut i = 0;
        while i < CAP {
            slots[i].link.next = if i + 1 < CAP {
                (HEADS + i + 1) as u16
            } else {
                NIL
            };
            i += 1;
        }

        Self {
            heads,
            slots,
            free: if CAP > 0 { HEADS as u16 } else { NIL },
        }
    }

    /// Add a live object at the tail of `kind`'s container.
    ///
    /// `kind` must have a container.
    pub fn insert(&mut self, kind: ObjectType, name: ObjectName, cookie: usize) -> Result<ObjectId> {
        let head = Self::head_of(kind);
        let index = self.free;
        if index == NIL {
            return Err(Error::NoMemory);
        }

        let slot = self.slot_mut(index);
        let next_free = slot.link.next;
        slot.live = true;
        slot.kind = kind;
        slot.name = name;
        slot.cookie = cookie;
        let generation = slot.generation;
        self.free = next_free;

        self.push_tail(head, index);
        Ok(ObjectId {
            slot: index,
            generation,
        })
    }

    /// Unlink a live object and give its slot back.
    pub fn remove(&mut self, id: ObjectId) -> Result<ObjectEntry> {
        let index = self.resolve(id).ok_or(Error::NotFound)?;
        let entry = self.slot(index).entry(index);
        self.unlink(index);

        let free = self.free;
        let slot = self.slot_mut(index);
        *slot = Slot {
            generation: slot.generation.wrapping_add(1),
            ..Slot::VACANT
        };
        slot.link.next = free;
        self.free = index;
        Ok(entry)
    }

    /// Move a live object to the tail of another container.
    pub fn retag(&mut self, id: ObjectId, kind: ObjectType) -> Result<()> {
        let index = self.resolve(id).ok_or(Error::NotFound)?;
        self.unlink(index);
        self.slot_mut(index).kind = kind;
        self.push_tail(Self::head_of(kind), index);
        Ok(())
    }

    pub fn rename(&mut self, id: ObjectId, name: ObjectName) -> Result<()> {
        let index = self.resolve(id).ok_or(Error::NotFound)?;
        self.slot_mut(index).name = name;
        Ok(())
    }

    pub fn get(&self, id: ObjectId) -> Option<ObjectEntry> {
        self.resolve(id).map(|index| self.slot(index).entry(index))
    }

    /// First object in `kind`'s container named `name`.
    pub fn find(&self, kind: ObjectType, name: &ObjectName) -> Option<ObjectEntry> {
        self.iter(kind).find(|entry| entry.name == *name)
    }

    /// Walk `kind`'s container in insertion order.
    pub fn iter(&self, kind: ObjectType) -> Iter<'_, CAP> {
        let head = Self::head_of(kind);
        Iter {
            table: self,
            head,
            cursor: self.heads[head as usize].next,
        }
    }

    fn head_of(kind: ObjectType) -> u16 {
        match kind.index() {
            Some(index) => index as u16,
            None => panic!("object type {:?} has no container", kind),
        }
    }

    fn resolve(&self, id: ObjectId) -> Option<u16> {
        let offset = (id.slot as usize).checked_sub(HEADS)?;
        let slot = self.slots.get(offset)?;
        (slot.live && slot.generation == id.generation).then_some(id.slot)
    }

    fn slot(&self, index: u16) -> &Slot {
        &self.slots[index as usize - HEADS]
    }

    fn slot_mut(&mut self, index: u16) -> &mut Slot {
        &mut self.slots[index as usize - HEADS]
    }

    fn link(&self, index: u16) -> Link {
        match (index as usize).checked_sub(HEADS) {
            None => self.heads[index as usize],
            Some(offset) => self.slots[offset].link,
        }
    }

    fn link_mut(&mut self, index: u16) -> &mut Link {
        match (index as usize).checked_sub(HEADS) {
            None => &mut self.heads[index as usize],
            Some(offset) => &mut self.slots[offset].link,
        }
    }

    fn push_tail(&mut self, head: u16, index: u16) {
        let tail = self.link(head).prev;
        *self.link_mut(index) = Link {
            prev: tail,
            next: head,
        };
        self.link_mut(tail).next = index;
        self.link_mut(head).prev = index;
    }

    fn unlink(&mut self, index: u16) {
        let Link { prev, next } = self.link(index);
        self.link_mut(prev).next = next;
        self.link_mut(next).prev = prev;
        *self.link_mut(index) = Link {
            prev: index,
            next: index,
        };
    }
}

pub struct Iter<'a, const CAP: usize> {
    table: &'a ObjectTable<CAP>,
    head: u16,
    cursor: u16,
}

impl<const CAP: usize> Iterator for Iter<'_, CAP> {
    type Item = ObjectEntry;

    fn next(&mut self) -> Option<ObjectEntry> {
        if self.cursor == self.head {
            return None;
        }
        let index = self.cursor;
        let slot = self.table.slot(index);
        self.cursor = slot.link.next;
        Some(slot.entry(index))
    }
}
