use std::collections::TryReserveError;
use std::fmt;

use tagform_endian::EndianError;

use crate::magic::Magic;

/// Failure category of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad magic, size mismatch or truncated buffer.
    Validation,
    /// The underlying allocator could not satisfy a request.
    Allocation,
    /// A handler operation reported failure.
    Handler,
    /// The operation was applied to an object or engine in the wrong state.
    Logic,
}

/// Handler operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Destroy,
    SerializeSize,
    Serialize,
    Unserialize,
    Pack,
    UnpackSize,
    Unpack,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Destroy => "destroy",
            Operation::SerializeSize => "serialize_size",
            Operation::Serialize => "serialize",
            Operation::Unserialize => "unserialize",
            Operation::Pack => "pack",
            Operation::UnpackSize => "unpack_size",
            Operation::Unpack => "unpack",
        };
        f.write_str(name)
    }
}

/// Errors from a [`ScopedAllocator`](crate::ScopedAllocator).
#[derive(Debug, thiserror::Error)]
pub enum AllocError {
    /// Zero-byte allocations are not tracked.
    #[error("zero-sized allocation")]
    ZeroSize,

    /// `count * size` does not fit in `usize`.
    #[error("allocation size overflow ({count} x {size})")]
    Overflow { count: usize, size: usize },

    /// The platform allocator refused the request.
    #[error("failed to allocate {size} bytes: {source}")]
    Exhausted {
        size: usize,
        source: TryReserveError,
    },
}

/// A static field access fell outside the static-fields buffer.
#[derive(Debug, thiserror::Error)]
#[error("static field at offset {offset} ({width} bytes) exceeds {len}-byte buffer")]
pub struct FieldError {
    pub offset: usize,
    pub width: usize,
    pub len: usize,
}

/// Failure reported by a handler operation.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<AllocError> for HandlerError {
    fn from(err: AllocError) -> Self {
        Self::new(err.to_string())
    }
}

impl From<FieldError> for HandlerError {
    fn from(err: FieldError) -> Self {
        Self::new(err.to_string())
    }
}

impl From<EndianError> for HandlerError {
    fn from(err: EndianError) -> Self {
        Self::new(err.to_string())
    }
}

/// Errors that can occur in engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine has not been initialized, or was shut down.
    #[error("engine is not initialized")]
    NotInitialized,

    /// A magic is not exactly 4 characters from `[A-Za-z0-9]`.
    #[error("invalid magic {0:?}")]
    InvalidMagic(String),

    /// The magic already names a registered handler.
    #[error("magic {0} is already registered")]
    AlreadyRegistered(Magic),

    /// No registered handler answers to the magic.
    #[error("no handler registered for magic {0}")]
    UnknownMagic(Magic),

    /// The wire buffer is shorter than the fixed header.
    #[error("buffer truncated ({len} bytes, need at least {min})")]
    Truncated { len: usize, min: usize },

    /// The declared static-fields size runs past the end of the buffer.
    #[error("static fields ({declared} bytes) exceed remaining buffer ({remaining} bytes)")]
    StaticFieldsOverrun { declared: u64, remaining: usize },

    /// The declared static-fields size disagrees with the resolved handler.
    #[error("static fields size mismatch for {magic} (wire {wire}, handler {expected})")]
    StaticFieldsMismatch {
        magic: Magic,
        wire: u64,
        expected: usize,
    },

    /// A caller-supplied destination is shorter than required.
    #[error("destination buffer too small ({len} bytes, need {required})")]
    BufferTooSmall { len: usize, required: usize },

    /// The serialized size does not fit in `usize`.
    #[error("serialized size of {0} overflows")]
    SizeOverflow(Magic),

    /// Allocation for an object or registry entry failed.
    #[error("allocation failed: {0}")]
    Alloc(#[from] AllocError),

    /// A handler operation failed.
    #[error("handler {magic} failed in {operation}: {source}")]
    Handler {
        magic: Magic,
        operation: Operation,
        #[source]
        source: HandlerError,
    },

    /// The object's registry entry no longer exists.
    #[error("object {0} is bound to a handler entry that no longer exists")]
    StaleObject(Magic),
}

impl EngineError {
    /// Taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidMagic(_)
            | EngineError::AlreadyRegistered(_)
            | EngineError::UnknownMagic(_)
            | EngineError::Truncated { .. }
            | EngineError::StaticFieldsOverrun { .. }
            | EngineError::StaticFieldsMismatch { .. }
            | EngineError::BufferTooSmall { .. }
            | EngineError::SizeOverflow(_) => ErrorKind::Validation,
            EngineError::Alloc(_) => ErrorKind::Allocation,
            EngineError::Handler { .. } => ErrorKind::Handler,
            EngineError::NotInitialized | EngineError::StaleObject(_) => ErrorKind::Logic,
        }
    }

    pub(crate) fn handler(magic: Magic, operation: Operation, source: HandlerError) -> Self {
        EngineError::Handler {
            magic,
            operation,
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        let magic = Magic::new("abc1").unwrap();
        assert_eq!(
            EngineError::Truncated { len: 3, min: 12 }.kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            EngineError::Alloc(AllocError::ZeroSize).kind(),
            ErrorKind::Allocation
        );
        assert_eq!(
            EngineError::handler(magic, Operation::Pack, HandlerError::new("boom")).kind(),
            ErrorKind::Handler
        );
        assert_eq!(EngineError::StaleObject(magic).kind(), ErrorKind::Logic);
        assert_eq!(EngineError::NotInitialized.kind(), ErrorKind::Logic);
    }

    #[test]
    fn handler_error_display_includes_operation() {
        let magic = Magic::new("spl1").unwrap();
        let err = EngineError::handler(magic, Operation::Unserialize, HandlerError::new("short"));
        assert_eq!(err.to_string(), "handler spl1 failed in unserialize: short");
    }
}
