//! Array of `u32` words.
//!
//! The raw representation is host-order words, so `pack` accepts exactly
//! the bytes of a `&[u32]` on the current machine. Words are stored and
//! serialized little-endian; a payload written on a big-endian host
//! unserializes to the same values on a little-endian one.

use tagform_core::{
    Allocation, Engine, Field, FieldError, Handler, HandlerError, Object, Result, ScopedAllocator,
    StaticFields,
};
use tagform_endian::{copy_le_to_native, copy_native_to_le};
use tracing::trace;

/// Default magic of [`WordsHandler`].
pub const WORDS_MAGIC: &str = "wd32";

/// Number of words.
pub const COUNT: Field<u32> = Field::at(0);

const WORD: usize = 4;

#[derive(Debug, Default, Clone, Copy)]
pub struct WordsHandler;

impl WordsHandler {
    pub fn count(object: &Object) -> std::result::Result<u32, FieldError> {
        object.static_fields().get(COUNT)
    }

    /// Pack a word slice under [`WORDS_MAGIC`].
    pub fn pack_words(engine: &mut Engine, words: &[u32]) -> Result<Object> {
        let raw: Vec<u8> = words.iter().flat_map(|w| w.to_ne_bytes()).collect();
        engine.pack(WORDS_MAGIC, &raw)
    }

    /// Unpack an object built by this handler back into words.
    pub fn unpack_words(engine: &Engine, object: &Object) -> Result<Vec<u32>> {
        let raw = engine.unpack_to_vec(object)?;
        Ok(raw
            .chunks_exact(WORD)
            .map(|chunk| u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect())
    }
}

#[derive(Debug)]
pub struct Words {
    data: Option<Allocation>,
}

fn words_to_bytes(count: usize) -> Option<usize> {
    count.checked_mul(WORD)
}

/// Byte length of the stored words. Counts read off the wire can exceed the
/// address space on narrow targets.
fn byte_len(fields: &StaticFields) -> std::result::Result<usize, HandlerError> {
    let count = fields.get(COUNT)?;
    usize::try_from(count)
        .ok()
        .and_then(words_to_bytes)
        .ok_or_else(|| HandlerError::new(format!("{count} words exceed the address space")))
}

impl Handler for WordsHandler {
    type Instance = Words;

    fn static_fields_size(&self) -> usize {
        COUNT.end()
    }

    fn create(
        &self,
        alloc: &mut ScopedAllocator,
        size_hint: usize,
        fields: &mut StaticFields,
    ) -> std::result::Result<Words, HandlerError> {
        let count = u32::try_from(size_hint / WORD)
            .map_err(|_| HandlerError::new("word count exceeds u32::MAX"))?;
        let data = match count {
            0 => None,
            n => Some(alloc.calloc(n as usize, WORD)?),
        };
        fields.set(COUNT, count)?;
        Ok(Words { data })
    }

    fn destroy(&self, alloc: &mut ScopedAllocator, instance: Words, _fields: &mut StaticFields) {
        if let Some(data) = instance.data {
            alloc.release(data);
        }
    }

    fn serialize_size(
        &self,
        _alloc: &ScopedAllocator,
        _instance: &Words,
        fields: &StaticFields,
    ) -> usize {
        byte_len(fields).unwrap_or(0)
    }

    fn serialize(
        &self,
        alloc: &ScopedAllocator,
        instance: &Words,
        fields: &StaticFields,
        dest: &mut [u8],
    ) -> std::result::Result<(), HandlerError> {
        let len = byte_len(fields)?;
        if len == 0 {
            return Ok(());
        }
        let stored = stored(alloc, instance, len)?;
        dest[..len].copy_from_slice(stored);
        Ok(())
    }

    fn unserialize(
        &self,
        alloc: &mut ScopedAllocator,
        instance: &mut Words,
        fields: &mut StaticFields,
        payload: &[u8],
    ) -> std::result::Result<(), HandlerError> {
        let len = byte_len(fields)?;
        if payload.len() != len {
            return Err(HandlerError::new(format!(
                "word payload is {} bytes, expected {len}",
                payload.len()
            )));
        }
        if len == 0 {
            return Ok(());
        }
        stored_mut(alloc, instance, len)?.copy_from_slice(payload);
        Ok(())
    }

    fn pack(
        &self,
        alloc: &mut ScopedAllocator,
        instance: &mut Words,
        fields: &mut StaticFields,
        raw: &[u8],
    ) -> std::result::Result<(), HandlerError> {
        let len = byte_len(fields)?;
        if raw.len() != len {
            return Err(HandlerError::new(format!(
                "raw input of {} bytes is not a whole number of words",
                raw.len()
            )));
        }
        if len == 0 {
            return Ok(());
        }
        copy_native_to_le(stored_mut(alloc, instance, len)?, raw, WORD)?;
        trace!(words = len / WORD, "words packed");
        Ok(())
    }

    fn unpack_size(
        &self,
        _alloc: &ScopedAllocator,
        _instance: &Words,
        fields: &StaticFields,
    ) -> usize {
        byte_len(fields).unwrap_or(0)
    }

    fn unpack(
        &self,
        alloc: &ScopedAllocator,
        instance: &Words,
        fields: &StaticFields,
        dest: &mut [u8],
    ) -> std::result::Result<(), HandlerError> {
        let len = byte_len(fields)?;
        if len == 0 {
            return Ok(());
        }
        copy_le_to_native(&mut dest[..len], stored(alloc, instance, len)?, WORD)?;
        Ok(())
    }
}

fn stored<'a>(
    alloc: &'a ScopedAllocator,
    instance: &Words,
    len: usize,
) -> std::result::Result<&'a [u8], HandlerError> {
    instance
        .data
        .and_then(|data| alloc.get(data))
        .filter(|data| data.len() == len)
        .ok_or_else(|| HandlerError::new("word storage does not match count"))
}

fn stored_mut<'a>(
    alloc: &'a mut ScopedAllocator,
    instance: &Words,
    len: usize,
) -> std::result::Result<&'a mut [u8], HandlerError> {
    instance
        .data
        .and_then(|data| alloc.get_mut(data))
        .filter(|data| data.len() == len)
        .ok_or_else(|| HandlerError::new("word storage does not match count"))
}
