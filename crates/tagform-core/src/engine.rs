//! Engine context: registry lifecycle and object operations.

use std::fmt;

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::error::{AllocError, EngineError, Operation, Result};
use crate::fields::StaticFields;
use crate::handler::HandlerDescriptor;
use crate::magic::Magic;
use crate::object::Object;
use crate::registry::{EntryKey, Registry, RegistryEntry, RegistryStats};
use crate::wire::{encode_header, peek_header, HEADER_SIZE};

/// Owner of the handler registry.
///
/// An engine starts uninitialized; [`init`](Engine::init) creates the
/// registry and [`shutdown`](Engine::shutdown) tears it down along with every
/// handler allocation. Objects outliving a shutdown can only be destroyed.
///
/// ```
/// use tagform_core::Engine;
///
/// let mut engine = Engine::new();
/// engine.init().unwrap();
/// assert!(engine.registered().is_empty());
/// engine.shutdown();
/// ```
pub struct Engine {
    config: EngineConfig,
    registry: Option<Registry>,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            registry: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Create the registry. Calling `init` on an initialized engine is a
    /// no-op.
    pub fn init(&mut self) -> Result<()> {
        if self.registry.is_some() {
            return Ok(());
        }
        self.registry = Some(Registry::new(&self.config)?);
        debug!(
            initial_capacity = self.config.initial_capacity,
            "engine initialized"
        );
        Ok(())
    }

    /// [`init`](Engine::init) with `initial_capacity` registry slots.
    ///
    /// The capacity is ignored when the engine is already initialized; it
    /// applies again after a [`shutdown`](Engine::shutdown).
    pub fn init_with_capacity(&mut self, initial_capacity: usize) -> Result<()> {
        if self.registry.is_none() {
            self.config.initial_capacity = initial_capacity;
        }
        self.init()
    }

    pub fn is_initialized(&self) -> bool {
        self.registry.is_some()
    }

    /// Tear down every registry entry, live objects or not.
    ///
    /// Idempotent. Objects still alive afterwards must only be passed to
    /// [`destroy`](Engine::destroy).
    pub fn shutdown(&mut self) {
        if let Some(registry) = self.registry.take() {
            registry.shutdown();
            debug!("engine shut down");
        }
    }

    /// Register `descriptor` under `magic`.
    pub fn register(
        &mut self,
        magic: impl AsRef<[u8]>,
        descriptor: HandlerDescriptor,
    ) -> Result<()> {
        let registry = self.registry_mut()?;
        let magic = Magic::from_bytes(magic.as_ref())?;
        registry.register(magic, descriptor)?;
        Ok(())
    }

    /// Remove the handler registered under `magic`.
    ///
    /// The magic can be registered again immediately. If objects built by the
    /// handler are still alive, its entry and allocations stay valid until
    /// the last of them is destroyed.
    pub fn unregister(&mut self, magic: impl AsRef<[u8]>) -> Result<()> {
        let registry = self.registry_mut()?;
        let magic = Magic::from_bytes(magic.as_ref())?;
        registry.unregister(magic)
    }

    pub fn is_registered(&self, magic: impl AsRef<[u8]>) -> bool {
        let Ok(magic) = Magic::from_bytes(magic.as_ref()) else {
            return false;
        };
        self.registry
            .as_ref()
            .is_some_and(|registry| registry.find(magic).is_some())
    }

    /// Magics currently resolvable, in registration slot order.
    pub fn registered(&self) -> Vec<Magic> {
        self.registry
            .as_ref()
            .map(Registry::magics)
            .unwrap_or_default()
    }

    /// Occupancy of the registry; all zero when uninitialized.
    pub fn stats(&self) -> RegistryStats {
        self.registry
            .as_ref()
            .map(Registry::stats)
            .unwrap_or_default()
    }

    /// Live objects counted against the entry `object` belongs to.
    pub fn live_objects(&self, object: &Object) -> usize {
        self.entry(object).map_or(0, RegistryEntry::refcount)
    }

    /// Build an empty object of the type registered under `magic`.
    pub fn create(&mut self, magic: impl AsRef<[u8]>, size_hint: usize) -> Result<Object> {
        let registry = self.registry_mut()?;
        let magic = Magic::from_bytes(magic.as_ref())?;
        let key = registry
            .find(magic)
            .ok_or(EngineError::UnknownMagic(magic))?;
        create_in(registry, magic, key, size_hint)
    }

    /// Build an object from the handler's raw representation.
    pub fn pack(&mut self, magic: impl AsRef<[u8]>, raw: &[u8]) -> Result<Object> {
        let mut object = self.create(magic, raw.len())?;

        let result = self.entry_mut(object.key, object.magic).and_then(|entry| {
            entry
                .descriptor
                .handler()
                .pack(
                    &mut entry.allocator,
                    &mut object.instance,
                    &mut object.fields,
                    raw,
                )
                .map_err(|source| EngineError::handler(object.magic, Operation::Pack, source))
        });

        match result {
            Ok(()) => Ok(object),
            Err(err) => {
                self.destroy(object);
                Err(err)
            }
        }
    }

    /// Length of the raw representation [`unpack`](Engine::unpack) writes.
    pub fn unpack_size(&self, object: &Object) -> Result<usize> {
        let entry = self.entry(object)?;
        entry
            .descriptor
            .handler()
            .unpack_size(&entry.allocator, &object.instance, &object.fields)
            .map_err(|source| EngineError::handler(object.magic, Operation::UnpackSize, source))
    }

    /// Write the raw representation into the front of `dest`; returns the
    /// number of bytes written.
    pub fn unpack(&self, object: &Object, dest: &mut [u8]) -> Result<usize> {
        let size = self.unpack_size(object)?;
        if dest.len() < size {
            return Err(EngineError::BufferTooSmall {
                len: dest.len(),
                required: size,
            });
        }

        let entry = self.entry(object)?;
        entry
            .descriptor
            .handler()
            .unpack(
                &entry.allocator,
                &object.instance,
                &object.fields,
                &mut dest[..size],
            )
            .map_err(|source| EngineError::handler(object.magic, Operation::Unpack, source))?;
        Ok(size)
    }

    /// Raw representation as a freshly allocated vector.
    pub fn unpack_to_vec(&self, object: &Object) -> Result<Vec<u8>> {
        let size = self.unpack_size(object)?;
        let mut raw = Vec::new();
        raw.try_reserve_exact(size)
            .map_err(|source| AllocError::Exhausted { size, source })?;
        raw.resize(size, 0);
        self.unpack(object, &mut raw)?;
        Ok(raw)
    }

    /// Exact length of the serialized form.
    pub fn serialize_size(&self, object: &Object) -> Result<usize> {
        let entry = self.entry(object)?;
        let payload = entry
            .descriptor
            .handler()
            .serialize_size(&entry.allocator, &object.instance, &object.fields)
            .map_err(|source| {
                EngineError::handler(object.magic, Operation::SerializeSize, source)
            })?;

        HEADER_SIZE
            .checked_add(object.fields.len())
            .and_then(|size| size.checked_add(payload))
            .ok_or(EngineError::SizeOverflow(object.magic))
    }

    /// Serialize into the front of `dest`; returns the number of bytes
    /// written.
    pub fn serialize_into(&self, object: &Object, dest: &mut [u8]) -> Result<usize> {
        let total = self.serialize_size(object)?;
        if dest.len() < total {
            return Err(EngineError::BufferTooSmall {
                len: dest.len(),
                required: total,
            });
        }

        let written = encode_header(dest, object.magic, object.fields.as_bytes())?;
        let entry = self.entry(object)?;
        entry
            .descriptor
            .handler()
            .serialize(
                &entry.allocator,
                &object.instance,
                &object.fields,
                &mut dest[written..total],
            )
            .map_err(|source| EngineError::handler(object.magic, Operation::Serialize, source))?;

        trace!(magic = %object.magic, size = total, "object serialized");
        Ok(total)
    }

    /// Serialize into a buffer of exactly [`serialize_size`](Engine::serialize_size) bytes.
    pub fn serialize(&self, object: &Object) -> Result<Bytes> {
        let total = self.serialize_size(object)?;
        let mut buf = BytesMut::zeroed(total);
        self.serialize_into(object, &mut buf)?;
        Ok(buf.freeze())
    }

    /// Rebuild an object from its serialized form.
    ///
    /// Rejects a buffer shorter than the header, a static-fields size running
    /// past the end, an unknown magic, or a static-fields size that differs
    /// from the handler's, before anything is allocated.
    pub fn unserialize(&mut self, bytes: &[u8]) -> Result<Object> {
        let registry = self.registry_mut()?;
        let view = peek_header(bytes)?;
        let magic = view.magic()?;
        let key = registry
            .find(magic)
            .ok_or(EngineError::UnknownMagic(magic))?;

        let expected = registry
            .entry(key)
            .map(|entry| entry.descriptor.static_fields_size())
            .ok_or(EngineError::UnknownMagic(magic))?;
        if view.static_fields().len() != expected {
            return Err(EngineError::StaticFieldsMismatch {
                magic,
                wire: view.static_fields().len() as u64,
                expected,
            });
        }

        let mut object = create_in(registry, magic, key, view.payload().len())?;
        object
            .fields
            .as_bytes_mut()
            .copy_from_slice(view.static_fields());

        let result = self.entry_mut(key, magic).and_then(|entry| {
            entry
                .descriptor
                .handler()
                .unserialize(
                    &mut entry.allocator,
                    &mut object.instance,
                    &mut object.fields,
                    view.payload(),
                )
                .map_err(|source| EngineError::handler(magic, Operation::Unserialize, source))
        });

        match result {
            Ok(()) => Ok(object),
            Err(err) => {
                self.destroy(object);
                Err(err)
            }
        }
    }

    /// Release an object and everything its handler holds for it.
    ///
    /// If its handler was unregistered and this was the last live object,
    /// the handler's entry is torn down. Objects whose entry no longer
    /// exists are simply dropped.
    pub fn destroy(&mut self, object: Object) {
        let Object {
            magic,
            key,
            mut fields,
            instance,
        } = object;

        let Some(registry) = self.registry.as_mut() else {
            trace!(%magic, "object dropped after shutdown");
            return;
        };
        let Some(entry) = registry.entry_mut(key) else {
            trace!(%magic, "object dropped, entry already gone");
            return;
        };

        entry
            .descriptor
            .handler()
            .destroy(&mut entry.allocator, instance, &mut fields);

        let torn_down = registry.release(key);
        trace!(%magic, torn_down, "object destroyed");
    }

    fn registry_mut(&mut self) -> Result<&mut Registry> {
        self.registry.as_mut().ok_or(EngineError::NotInitialized)
    }

    fn entry(&self, object: &Object) -> Result<&RegistryEntry> {
        self.registry
            .as_ref()
            .ok_or(EngineError::NotInitialized)?
            .entry(object.key)
            .ok_or(EngineError::StaleObject(object.magic))
    }

    fn entry_mut(&mut self, key: EntryKey, magic: Magic) -> Result<&mut RegistryEntry> {
        self.registry_mut()?
            .entry_mut(key)
            .ok_or(EngineError::StaleObject(magic))
    }
}

fn create_in(
    registry: &mut Registry,
    magic: Magic,
    key: EntryKey,
    size_hint: usize,
) -> Result<Object> {
    let entry = registry
        .entry_mut(key)
        .ok_or(EngineError::UnknownMagic(magic))?;

    let mut fields = StaticFields::zeroed(entry.descriptor.static_fields_size())?;
    let instance = entry
        .descriptor
        .handler()
        .create(&mut entry.allocator, size_hint, &mut fields)
        .map_err(|source| EngineError::handler(magic, Operation::Create, source))?;

    registry.acquire(key);
    trace!(%magic, size_hint, "object created");

    Ok(Object {
        magic,
        key,
        fields,
        instance,
    })
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("initialized", &self.is_initialized())
            .field("stats", &self.stats())
            .finish()
    }
}
