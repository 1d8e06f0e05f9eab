//! Byte-order normalization for portable binary layouts.
//!
//! Every multi-byte value that leaves a tagform object goes through this
//! crate. A buffer is viewed as an array of fixed-width elements (1, 2, 4 or
//! 8 bytes) and converted between host order and little- or big-endian:
//! - copy between disjoint buffers
//! - move within one buffer (ranges may overlap)
//! - compare two buffers as if both were first normalized to host order
//!
//! When the requested order already matches the host, every operation is a
//! plain byte copy. Otherwise elements are byte-swapped, through a vectorized
//! path when the `simd` feature is enabled.

pub mod bswap;
pub mod error;
pub mod ops;
pub mod order;

pub use bswap::{bswap16, bswap32, bswap64, vectorized_path};
pub use error::{EndianError, Result};
pub use ops::{
    compare, compare_be_to_native, compare_le_to_native, compare_native_to_be,
    compare_native_to_le, copy, copy_be_to_native, copy_le_to_native, copy_native_to_be,
    copy_native_to_le, element_width, move_be_to_native, move_le_to_native, move_native_to_be,
    move_native_to_le, move_within, scalar_width,
};
pub use order::{ByteOrder, Direction};
