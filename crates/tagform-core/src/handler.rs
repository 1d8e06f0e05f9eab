//! Handler capability contract.
//!
//! A [`Handler`] knows how to build, convert and tear down one kind of
//! object. The engine never sees the concrete type: handlers are registered
//! as a [`HandlerDescriptor`], which wraps them behind an object-safe adapter
//! and boxes their instances.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::alloc::ScopedAllocator;
use crate::error::HandlerError;
use crate::fields::StaticFields;

/// Operations implemented by an object type.
///
/// Every operation receives the scoped allocator of the registry entry the
/// object belongs to. Buffers allocated there and never released are swept
/// when the entry is torn down.
pub trait Handler: Send + Sync + 'static {
    /// Per-object state owned by the handler.
    type Instance: Send + 'static;

    /// Size of the static-fields buffer every object of this type carries.
    fn static_fields_size(&self) -> usize;

    /// Build a fresh instance. `size_hint` is the raw or payload length the
    /// object is being created for, or 0.
    fn create(
        &self,
        alloc: &mut ScopedAllocator,
        size_hint: usize,
        fields: &mut StaticFields,
    ) -> Result<Self::Instance, HandlerError>;

    fn destroy(
        &self,
        alloc: &mut ScopedAllocator,
        instance: Self::Instance,
        fields: &mut StaticFields,
    );

    /// Exact payload length `serialize` will write.
    fn serialize_size(
        &self,
        alloc: &ScopedAllocator,
        instance: &Self::Instance,
        fields: &StaticFields,
    ) -> usize;

    fn serialize(
        &self,
        alloc: &ScopedAllocator,
        instance: &Self::Instance,
        fields: &StaticFields,
        dest: &mut [u8],
    ) -> Result<(), HandlerError>;

    fn unserialize(
        &self,
        alloc: &mut ScopedAllocator,
        instance: &mut Self::Instance,
        fields: &mut StaticFields,
        payload: &[u8],
    ) -> Result<(), HandlerError>;

    fn pack(
        &self,
        alloc: &mut ScopedAllocator,
        instance: &mut Self::Instance,
        fields: &mut StaticFields,
        raw: &[u8],
    ) -> Result<(), HandlerError>;

    /// Exact raw length `unpack` will write.
    fn unpack_size(
        &self,
        alloc: &ScopedAllocator,
        instance: &Self::Instance,
        fields: &StaticFields,
    ) -> usize;

    fn unpack(
        &self,
        alloc: &ScopedAllocator,
        instance: &Self::Instance,
        fields: &StaticFields,
        dest: &mut [u8],
    ) -> Result<(), HandlerError>;
}

pub(crate) type Instance = Box<dyn Any + Send>;

/// Object-safe form of [`Handler`].
pub(crate) trait ErasedHandler: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn create(
        &self,
        alloc: &mut ScopedAllocator,
        size_hint: usize,
        fields: &mut StaticFields,
    ) -> Result<Instance, HandlerError>;

    fn destroy(&self, alloc: &mut ScopedAllocator, instance: Instance, fields: &mut StaticFields);

    fn serialize_size(
        &self,
        alloc: &ScopedAllocator,
        instance: &Instance,
        fields: &StaticFields,
    ) -> Result<usize, HandlerError>;

    fn serialize(
        &self,
        alloc: &ScopedAllocator,
        instance: &Instance,
        fields: &StaticFields,
        dest: &mut [u8],
    ) -> Result<(), HandlerError>;

    fn unserialize(
        &self,
        alloc: &mut ScopedAllocator,
        instance: &mut Instance,
        fields: &mut StaticFields,
        payload: &[u8],
    ) -> Result<(), HandlerError>;

    fn pack(
        &self,
        alloc: &mut ScopedAllocator,
        instance: &mut Instance,
        fields: &mut StaticFields,
        raw: &[u8],
    ) -> Result<(), HandlerError>;

    fn unpack_size(
        &self,
        alloc: &ScopedAllocator,
        instance: &Instance,
        fields: &StaticFields,
    ) -> Result<usize, HandlerError>;

    fn unpack(
        &self,
        alloc: &ScopedAllocator,
        instance: &Instance,
        fields: &StaticFields,
        dest: &mut [u8],
    ) -> Result<(), HandlerError>;
}

fn mismatch<H>() -> HandlerError {
    HandlerError::new(format!("instance is not a {}", std::any::type_name::<H>()))
}

fn downcast<H: Handler>(instance: &Instance) -> Result<&H::Instance, HandlerError> {
    instance
        .downcast_ref::<H::Instance>()
        .ok_or_else(mismatch::<H::Instance>)
}

fn downcast_mut<H: Handler>(instance: &mut Instance) -> Result<&mut H::Instance, HandlerError> {
    instance
        .downcast_mut::<H::Instance>()
        .ok_or_else(mismatch::<H::Instance>)
}

impl<H: Handler> ErasedHandler for H {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<H>()
    }

    fn create(
        &self,
        alloc: &mut ScopedAllocator,
        size_hint: usize,
        fields: &mut StaticFields,
    ) -> Result<Instance, HandlerError> {
        let instance = Handler::create(self, alloc, size_hint, fields)?;
        Ok(Box::new(instance))
    }

    fn destroy(&self, alloc: &mut ScopedAllocator, instance: Instance, fields: &mut StaticFields) {
        // Foreign instances are left to the allocator sweep.
        if let Ok(instance) = instance.downcast::<H::Instance>() {
            Handler::destroy(self, alloc, *instance, fields);
        }
    }

    fn serialize_size(
        &self,
        alloc: &ScopedAllocator,
        instance: &Instance,
        fields: &StaticFields,
    ) -> Result<usize, HandlerError> {
        Ok(Handler::serialize_size(self, alloc, downcast::<H>(instance)?, fields))
    }

    fn serialize(
        &self,
        alloc: &ScopedAllocator,
        instance: &Instance,
        fields: &StaticFields,
        dest: &mut [u8],
    ) -> Result<(), HandlerError> {
        Handler::serialize(self, alloc, downcast::<H>(instance)?, fields, dest)
    }

    fn unserialize(
        &self,
        alloc: &mut ScopedAllocator,
        instance: &mut Instance,
        fields: &mut StaticFields,
        payload: &[u8],
    ) -> Result<(), HandlerError> {
        let instance = downcast_mut::<H>(instance)?;
        Handler::unserialize(self, alloc, instance, fields, payload)
    }

    fn pack(
        &self,
        alloc: &mut ScopedAllocator,
        instance: &mut Instance,
        fields: &mut StaticFields,
        raw: &[u8],
    ) -> Result<(), HandlerError> {
        Handler::pack(self, alloc, downcast_mut::<H>(instance)?, fields, raw)
    }

    fn unpack_size(
        &self,
        alloc: &ScopedAllocator,
        instance: &Instance,
        fields: &StaticFields,
    ) -> Result<usize, HandlerError> {
        Ok(Handler::unpack_size(self, alloc, downcast::<H>(instance)?, fields))
    }

    fn unpack(
        &self,
        alloc: &ScopedAllocator,
        instance: &Instance,
        fields: &StaticFields,
        dest: &mut [u8],
    ) -> Result<(), HandlerError> {
        Handler::unpack(self, alloc, downcast::<H>(instance)?, fields, dest)
    }
}

/// Registered form of a handler.
///
/// Cloning is cheap; the same descriptor may be registered under several
/// magics, each registration getting its own entry and allocator.
#[derive(Clone)]
pub struct HandlerDescriptor {
    static_fields_size: usize,
    handler: Arc<dyn ErasedHandler>,
}

impl HandlerDescriptor {
    pub fn new<H: Handler>(handler: H) -> Self {
        Self::from_arc(Arc::new(handler))
    }

    /// Share an existing handler.
    pub fn from_arc<H: Handler>(handler: Arc<H>) -> Self {
        Self {
            static_fields_size: handler.static_fields_size(),
            handler,
        }
    }

    /// Static-fields size captured at construction.
    pub fn static_fields_size(&self) -> usize {
        self.static_fields_size
    }

    pub(crate) fn handler(&self) -> &dyn ErasedHandler {
        self.handler.as_ref()
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("handler", &self.handler.type_name())
            .field("static_fields_size", &self.static_fields_size)
            .finish()
    }
}
