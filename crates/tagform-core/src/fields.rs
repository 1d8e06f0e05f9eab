//! Static-field layout and typed access.
//!
//! The static-fields buffer of an object is always little-endian, whatever
//! the host. Handlers describe their layout once with a [`LayoutBuilder`] and
//! read or write individual scalars through [`Field`] tokens.

use std::fmt;
use std::marker::PhantomData;

use tagform_endian::{copy_le_to_native, copy_native_to_le, scalar_width};

use crate::error::{AllocError, FieldError};

/// Widest scalar a static field can hold.
pub const MAX_SCALAR_WIDTH: usize = 8;

mod sealed {
    pub trait Sealed {}
}

/// Fixed-width number storable in static fields.
///
/// Implemented for the 1, 2, 4 and 8 byte integers and floats. The trait is
/// sealed:
///
/// ```compile_fail
/// use tagform_core::Scalar;
///
/// #[derive(Clone, Copy)]
/// struct Wide(u128);
///
/// impl Scalar for Wide {
///     const WIDTH: usize = 16;
///
///     fn write_native(self, out: &mut [u8]) {
///         out.copy_from_slice(&self.0.to_ne_bytes());
///     }
///
///     fn read_native(bytes: &[u8]) -> Self {
///         let mut raw = [0u8; 16];
///         raw.copy_from_slice(bytes);
///         Wide(u128::from_ne_bytes(raw))
///     }
/// }
/// ```
pub trait Scalar: sealed::Sealed + Copy + Send + Sync + 'static {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Write the host-order representation into `out` (`WIDTH` bytes).
    fn write_native(self, out: &mut [u8]);

    /// Read a value from its host-order representation (`WIDTH` bytes).
    fn read_native(bytes: &[u8]) -> Self;
}

macro_rules! impl_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $t {}

            impl Scalar for $t {
                const WIDTH: usize = std::mem::size_of::<$t>();

                fn write_native(self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_ne_bytes());
                }

                fn read_native(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$t>()];
                    raw.copy_from_slice(bytes);
                    <$t>::from_ne_bytes(raw)
                }
            }
        )*
    };
}

impl_scalar!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

/// Typed position of a scalar inside a static-fields buffer.
pub struct Field<T> {
    offset: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Scalar> Field<T> {
    /// Field at an explicit byte offset.
    pub const fn at(offset: usize) -> Self {
        Self {
            offset,
            _marker: PhantomData,
        }
    }

    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// One past the last byte of the field, saturating at `usize::MAX`.
    pub const fn end(&self) -> usize {
        self.offset.saturating_add(T::WIDTH)
    }
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Field<T> {}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("offset", &self.offset)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

/// Packs fields back to back, without implicit padding.
///
/// ```
/// use tagform_core::LayoutBuilder;
///
/// let mut layout = LayoutBuilder::new();
/// let size = layout.field::<u32>();
/// let tag = layout.field::<u32>();
/// assert_eq!((size.offset(), tag.offset()), (0, 4));
/// assert_eq!(layout.finish(), 8);
/// ```
#[derive(Debug, Default, Clone)]
pub struct LayoutBuilder {
    size: usize,
}

impl LayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field of type `T`.
    pub fn field<T: Scalar>(&mut self) -> Field<T> {
        let field = Field::at(self.size);
        self.size += T::WIDTH;
        field
    }

    /// Skip `bytes` reserved bytes.
    pub fn pad(&mut self, bytes: usize) -> &mut Self {
        self.size += bytes;
        self
    }

    /// Bytes laid out so far.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total static-fields size to declare in the handler.
    pub fn finish(self) -> usize {
        self.size
    }
}

/// Zero-initialized, little-endian static-fields buffer of an object.
#[derive(Clone, PartialEq, Eq)]
pub struct StaticFields {
    bytes: Box<[u8]>,
}

impl StaticFields {
    pub(crate) fn zeroed(size: usize) -> Result<Self, AllocError> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(size)
            .map_err(|source| AllocError::Exhausted { size, source })?;
        bytes.resize(size, 0);
        Ok(Self {
            bytes: bytes.into_boxed_slice(),
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Raw little-endian contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Read a field, converting from little-endian to host order.
    pub fn get<T: Scalar>(&self, field: Field<T>) -> Result<T, FieldError> {
        let range = self.range(&field)?;
        let mut native = [0u8; MAX_SCALAR_WIDTH];
        let native = &mut native[..T::WIDTH];
        copy_le_to_native(native, &self.bytes[range], scalar_width(T::WIDTH))
            .map_err(|_| self.out_of_bounds(&field))?;
        Ok(T::read_native(native))
    }

    /// Write a field, converting from host order to little-endian.
    pub fn set<T: Scalar>(&mut self, field: Field<T>, value: T) -> Result<(), FieldError> {
        let range = self.range(&field)?;
        let mut native = [0u8; MAX_SCALAR_WIDTH];
        let native = &mut native[..T::WIDTH];
        value.write_native(native);
        copy_native_to_le(&mut self.bytes[range], native, scalar_width(T::WIDTH))
            .map_err(|_| self.out_of_bounds(&field))
    }

    fn range<T: Scalar>(&self, field: &Field<T>) -> Result<std::ops::Range<usize>, FieldError> {
        match field.offset.checked_add(T::WIDTH) {
            Some(end) if end <= self.bytes.len() => Ok(field.offset..end),
            _ => Err(self.out_of_bounds(field)),
        }
    }

    fn out_of_bounds<T: Scalar>(&self, field: &Field<T>) -> FieldError {
        FieldError {
            offset: field.offset,
            width: T::WIDTH,
            len: self.bytes.len(),
        }
    }
}

impl fmt::Debug for StaticFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StaticFields({} bytes)", self.bytes.len())
    }
}
