use std::collections::TryReserveError;

/// Errors that can occur during byte-order conversion.
#[derive(Debug, thiserror::Error)]
pub enum EndianError {
    /// Source and destination buffers have different lengths.
    #[error("length mismatch (destination {dest} bytes, source {src} bytes)")]
    LengthMismatch { dest: usize, src: usize },

    /// A move range does not fit inside the buffer.
    #[error("range {start}..{end} out of bounds for buffer of {len} bytes")]
    RangeOutOfBounds {
        start: usize,
        end: usize,
        len: usize,
    },

    /// The temporary buffer for an overlapping swap could not be allocated.
    #[error("failed to allocate conversion buffer: {0}")]
    Alloc(#[from] TryReserveError),
}

pub type Result<T> = std::result::Result<T, EndianError>;
