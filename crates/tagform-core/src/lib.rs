//! Registry, allocation and wire protocol for tagged binary objects.
//!
//! Handlers are registered under a 4-character [`Magic`]. The [`Engine`]
//! resolves a magic to its handler and drives the object lifecycle:
//! - `pack` / `unpack` convert between an [`Object`] and the handler's raw
//!   external bytes
//! - `serialize` / `unserialize` convert between an [`Object`] and the
//!   self-describing wire format
//!
//! Wire format (all integers little-endian):
//! ```text
//! ┌─────────────┬──────────────────┬───────────────┬─────────────────┐
//! │ Magic (4B)  │ Static size (8B) │ Static fields │ Handler payload │
//! └─────────────┴──────────────────┴───────────────┴─────────────────┘
//! ```
//!
//! Every handler allocates through its entry's [`ScopedAllocator`], so a
//! handler can be unregistered while objects built from it are still alive:
//! the entry stays up until the last of those objects is destroyed.

pub mod alloc;
pub mod config;
pub mod engine;
pub mod error;
pub mod fields;
pub mod handler;
pub mod magic;
pub mod object;
pub mod registry;
pub mod version;
pub mod wire;

#[cfg(test)]
mod testing;

pub use alloc::{Allocation, ScopedAllocator};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{AllocError, EngineError, ErrorKind, FieldError, HandlerError, Operation, Result};
pub use fields::{Field, LayoutBuilder, Scalar, StaticFields, MAX_SCALAR_WIDTH};
pub use handler::{Handler, HandlerDescriptor};
pub use magic::{Magic, MAGIC_LEN};
pub use object::Object;
pub use registry::{EntryKey, RegistryStats};
pub use version::{build_target, buildtime, version_id, VERSION};
pub use wire::{peek_header, WireView, HEADER_SIZE};
