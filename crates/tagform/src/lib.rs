//! Tagged, extensible binary objects.
//!
//! Register a [`Handler`] under a 4-character magic, then move objects
//! between three forms:
//! - the handler's raw bytes (`pack` / `unpack`)
//! - a live [`Object`] with little-endian static fields
//! - the self-describing wire format (`serialize` / `unserialize`)
//!
//! ```
//! use tagform::{Engine, handlers};
//!
//! let mut engine = Engine::new();
//! engine.init()?;
//! handlers::register_builtin(&mut engine)?;
//!
//! let object = engine.pack(handlers::BLOB_MAGIC, b"hello")?;
//! let wire = engine.serialize(&object)?;
//! engine.destroy(object);
//!
//! let restored = engine.unserialize(&wire)?;
//! assert_eq!(engine.unpack_to_vec(&restored)?, b"hello");
//! engine.destroy(restored);
//! # Ok::<(), tagform::EngineError>(())
//! ```
//!
//! # Crate Structure
//!
//! - [`endian`]: byte-order copy, move and compare
//! - [`handlers`]: built-in handlers (behind the `handlers` feature)
//! - everything else is re-exported from `tagform-core`

pub use tagform_core::*;

/// Re-export byte-order types.
pub mod endian {
    pub use tagform_endian::*;
}

/// Re-export built-in handlers (requires `handlers` feature).
#[cfg(feature = "handlers")]
pub mod handlers {
    pub use tagform_handlers::*;
}
