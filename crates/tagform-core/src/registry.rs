//! Magic → handler entry table with deferred teardown.
//!
//! Each registration creates a [`RegistryEntry`] owning the handler's
//! [`ScopedAllocator`] and a count of live objects. Unregistering an entry
//! with live objects only hides it from lookups; the entry is torn down when
//! its last object is released.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::alloc::ScopedAllocator;
use crate::config::EngineConfig;
use crate::error::{AllocError, EngineError, Result};
use crate::handler::HandlerDescriptor;
use crate::magic::Magic;

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

/// Generational reference from an object to its registry entry.
///
/// A key is stale once its entry is torn down, once the registry that issued
/// it is shut down, or when presented to a different registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryKey {
    registry: u64,
    index: usize,
    generation: u64,
}

/// Snapshot of registry occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Entries reachable by magic.
    pub resolvable: usize,
    /// Unregistered entries kept alive by live objects.
    pub pending_teardown: usize,
    /// Live allocations across every entry's allocator.
    pub tracked_allocations: usize,
    /// Entry slots, free or used.
    pub capacity: usize,
}

pub(crate) struct RegistryEntry {
    pub(crate) magic: Magic,
    pub(crate) allocator: ScopedAllocator,
    pub(crate) descriptor: HandlerDescriptor,
    refcount: usize,
    unregistered: bool,
}

impl RegistryEntry {
    pub(crate) fn refcount(&self) -> usize {
        self.refcount
    }

    fn is_resolvable(&self, magic: Magic) -> bool {
        !self.unregistered && self.magic == magic
    }
}

#[derive(Default)]
struct Slot {
    generation: u64,
    entry: Option<RegistryEntry>,
}

pub(crate) struct Registry {
    id: u64,
    slots: Vec<Slot>,
    step: usize,
    allocator_capacity: usize,
    allocator_step: usize,
}

impl Registry {
    pub(crate) fn new(config: &EngineConfig) -> Result<Self> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(config.initial_capacity)
            .map_err(|source| AllocError::Exhausted {
                size: config.initial_capacity,
                source,
            })?;
        slots.resize_with(config.initial_capacity, Slot::default);

        Ok(Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            slots,
            step: config.registry_step.max(1),
            allocator_capacity: config.allocator_capacity,
            allocator_step: config.allocator_step,
        })
    }

    pub(crate) fn register(
        &mut self,
        magic: Magic,
        descriptor: HandlerDescriptor,
    ) -> Result<EntryKey> {
        if self.find(magic).is_some() {
            return Err(EngineError::AlreadyRegistered(magic));
        }

        let allocator =
            ScopedAllocator::try_with_capacity(self.allocator_capacity, self.allocator_step)?;

        let index = match self.slots.iter().position(|slot| slot.entry.is_none()) {
            Some(index) => index,
            None => {
                let index = self.slots.len();
                self.grow()?;
                index
            }
        };

        let static_fields_size = descriptor.static_fields_size();
        let slot = &mut self.slots[index];
        slot.generation = slot.generation.wrapping_add(1);
        slot.entry = Some(RegistryEntry {
            magic,
            allocator,
            descriptor,
            refcount: 0,
            unregistered: false,
        });

        debug!(%magic, index, static_fields_size, "handler registered");

        Ok(EntryKey {
            registry: self.id,
            index,
            generation: slot.generation,
        })
    }

    pub(crate) fn unregister(&mut self, magic: Magic) -> Result<()> {
        let key = self.find(magic).ok_or(EngineError::UnknownMagic(magic))?;
        let Some(entry) = self.entry_mut(key) else {
            return Err(EngineError::UnknownMagic(magic));
        };

        if entry.refcount == 0 {
            self.teardown(key.index);
        } else {
            entry.unregistered = true;
            debug!(%magic, refcount = entry.refcount, "handler unregistered, teardown deferred");
        }
        Ok(())
    }

    pub(crate) fn find(&self, magic: Magic) -> Option<EntryKey> {
        self.slots.iter().enumerate().find_map(|(index, slot)| {
            slot.entry
                .as_ref()
                .filter(|entry| entry.is_resolvable(magic))
                .map(|_| EntryKey {
                    registry: self.id,
                    index,
                    generation: slot.generation,
                })
        })
    }

    pub(crate) fn entry(&self, key: EntryKey) -> Option<&RegistryEntry> {
        if key.registry != self.id {
            return None;
        }
        self.slots
            .get(key.index)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    pub(crate) fn entry_mut(&mut self, key: EntryKey) -> Option<&mut RegistryEntry> {
        if key.registry != self.id {
            return None;
        }
        self.slots
            .get_mut(key.index)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    /// Count one more live object against the entry.
    pub(crate) fn acquire(&mut self, key: EntryKey) -> bool {
        match self.entry_mut(key) {
            Some(entry) => {
                entry.refcount += 1;
                true
            }
            None => false,
        }
    }

    /// Drop one live object; returns whether the entry was torn down.
    pub(crate) fn release(&mut self, key: EntryKey) -> bool {
        let Some(entry) = self.entry_mut(key) else {
            return false;
        };
        entry.refcount = entry.refcount.saturating_sub(1);

        if entry.refcount == 0 && entry.unregistered {
            self.teardown(key.index);
            true
        } else {
            false
        }
    }

    /// Tear down every entry regardless of live objects.
    pub(crate) fn shutdown(mut self) {
        let mut abandoned = 0;
        for index in 0..self.slots.len() {
            if let Some(entry) = &self.slots[index].entry {
                abandoned += entry.refcount;
                self.teardown(index);
            }
        }
        debug!(registry = self.id, abandoned, "registry shut down");
    }

    pub(crate) fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats {
            capacity: self.slots.len(),
            ..RegistryStats::default()
        };
        for entry in self.slots.iter().filter_map(|slot| slot.entry.as_ref()) {
            if entry.unregistered {
                stats.pending_teardown += 1;
            } else {
                stats.resolvable += 1;
            }
            stats.tracked_allocations += entry.allocator.usage();
        }
        stats
    }

    /// Magics of resolvable entries in slot order.
    pub(crate) fn magics(&self) -> Vec<Magic> {
        self.slots
            .iter()
            .filter_map(|slot| slot.entry.as_ref())
            .filter(|entry| !entry.unregistered)
            .map(|entry| entry.magic)
            .collect()
    }

    fn teardown(&mut self, index: usize) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        let Some(mut entry) = slot.entry.take() else {
            return;
        };

        let released = entry.allocator.sweep_all();
        if released > 0 {
            warn!(magic = %entry.magic, released, "swept allocations left behind by handler");
        }
        debug!(magic = %entry.magic, released, "registry entry torn down");
    }

    fn grow(&mut self) -> Result<()> {
        self.slots
            .try_reserve_exact(self.step)
            .map_err(|source| AllocError::Exhausted {
                size: self.step,
                source,
            })?;
        let len = self.slots.len() + self.step;
        self.slots.resize_with(len, Slot::default);
        debug!(capacity = len, "registry grown");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SampleHandler;

    fn registry(initial_capacity: usize) -> Registry {
        Registry::new(&EngineConfig {
            initial_capacity,
            registry_step: 2,
            ..EngineConfig::default()
        })
        .unwrap()
    }

    fn magic(s: &str) -> Magic {
        Magic::new(s).unwrap()
    }

    fn sample() -> HandlerDescriptor {
        HandlerDescriptor::new(SampleHandler::default())
    }

    #[test]
    fn register_then_find() {
        let mut reg = registry(4);
        let key = reg.register(magic("abc1"), sample()).unwrap();

        assert_eq!(reg.find(magic("abc1")), Some(key));
        assert_eq!(reg.find(magic("abc2")), None);
        assert_eq!(reg.entry(key).unwrap().magic, magic("abc1"));
    }

    #[test]
    fn duplicate_magic_is_rejected() {
        let mut reg = registry(4);
        reg.register(magic("abc1"), sample()).unwrap();

        assert!(matches!(
            reg.register(magic("abc1"), sample()),
            Err(EngineError::AlreadyRegistered(m)) if m == magic("abc1")
        ));
        assert_eq!(reg.stats().resolvable, 1);
    }

    #[test]
    fn grows_past_initial_capacity() {
        let mut reg = registry(1);
        for i in 0..5 {
            reg.register(magic(&format!("mg{i:02}")), sample()).unwrap();
        }

        assert_eq!(reg.stats().resolvable, 5);
        assert_eq!(reg.stats().capacity, 5);
        assert!(reg.find(magic("mg04")).is_some());
    }

    #[test]
    fn unregister_without_objects_tears_down() {
        let mut reg = registry(2);
        let key = reg.register(magic("abc1"), sample()).unwrap();
        reg.entry_mut(key).unwrap().allocator.alloc(8).unwrap();

        reg.unregister(magic("abc1")).unwrap();

        assert!(reg.entry(key).is_none());
        assert_eq!(
            reg.stats(),
            RegistryStats {
                capacity: 2,
                ..Default::default()
            }
        );
        assert!(matches!(
            reg.unregister(magic("abc1")),
            Err(EngineError::UnknownMagic(_))
        ));
    }

    #[test]
    fn unregister_with_objects_defers_teardown() {
        let mut reg = registry(2);
        let key = reg.register(magic("abc1"), sample()).unwrap();
        assert!(reg.acquire(key));
        assert!(reg.acquire(key));

        reg.unregister(magic("abc1")).unwrap();
        assert_eq!(reg.find(magic("abc1")), None);
        assert_eq!(reg.entry(key).unwrap().refcount(), 2);
        assert_eq!(reg.stats().pending_teardown, 1);

        // The magic is free again while the old entry lingers.
        let fresh = reg.register(magic("abc1"), sample()).unwrap();
        assert_ne!(fresh, key);

        assert!(!reg.release(key));
        assert!(reg.release(key));
        assert!(reg.entry(key).is_none());
        assert_eq!(reg.find(magic("abc1")), Some(fresh));
        assert_eq!(reg.stats().pending_teardown, 0);
    }

    #[test]
    fn stale_keys_never_resolve() {
        let mut reg = registry(1);
        let old = reg.register(magic("abc1"), sample()).unwrap();
        reg.unregister(magic("abc1")).unwrap();
        let new = reg.register(magic("abc2"), sample()).unwrap();

        assert_eq!(old.index, new.index);
        assert!(reg.entry(old).is_none());
        assert!(!reg.acquire(old));
        assert!(!reg.release(old));
        assert_eq!(reg.entry(new).unwrap().refcount(), 0);

        let other = registry(1);
        assert!(other.entry(new).is_none());
    }

    #[test]
    fn magics_lists_resolvable_entries() {
        let mut reg = registry(4);
        let key = reg.register(magic("aaaa"), sample()).unwrap();
        reg.register(magic("bbbb"), sample()).unwrap();
        reg.acquire(key);
        reg.unregister(magic("aaaa")).unwrap();

        assert_eq!(reg.magics(), vec![magic("bbbb")]);
    }
}
