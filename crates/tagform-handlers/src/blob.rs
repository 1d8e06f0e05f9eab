use tagform_core::{
    Allocation, Field, FieldError, Handler, HandlerError, Object, ScopedAllocator, StaticFields,
};
use tracing::trace;

/// Default magic of [`BlobHandler`].
pub const BLOB_MAGIC: &str = "blob";

/// Byte length of the blob.
pub const LEN: Field<u32> = Field::at(0);
/// Caller-defined tag, carried through serialization untouched.
pub const TAG: Field<u32> = Field::at(4);

/// Opaque byte blob of up to `u32::MAX` bytes.
///
/// The raw and serialized payloads are the same bytes. The blob is stored in
/// a single allocation from the entry's scoped allocator; an empty blob
/// allocates nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlobHandler;

impl BlobHandler {
    pub fn tag(object: &Object) -> Result<u32, FieldError> {
        object.static_fields().get(TAG)
    }

    pub fn set_tag(object: &mut Object, tag: u32) -> Result<(), FieldError> {
        object.static_fields_mut().set(TAG, tag)
    }

    pub fn len(object: &Object) -> Result<u32, FieldError> {
        object.static_fields().get(LEN)
    }
}

#[derive(Debug)]
pub struct Blob {
    data: Option<Allocation>,
}

fn declared_len(fields: &StaticFields) -> usize {
    fields.get(LEN).map_or(0, |len| len as usize)
}

impl Handler for BlobHandler {
    type Instance = Blob;

    fn static_fields_size(&self) -> usize {
        TAG.end()
    }

    fn create(
        &self,
        alloc: &mut ScopedAllocator,
        size_hint: usize,
        fields: &mut StaticFields,
    ) -> Result<Blob, HandlerError> {
        let len = u32::try_from(size_hint)
            .map_err(|_| HandlerError::new(format!("blob of {size_hint} bytes exceeds u32::MAX")))?;
        let data = match size_hint {
            0 => None,
            n => Some(alloc.calloc(1, n)?),
        };
        fields.set(LEN, len)?;
        Ok(Blob { data })
    }

    fn destroy(&self, alloc: &mut ScopedAllocator, instance: Blob, _fields: &mut StaticFields) {
        if let Some(data) = instance.data {
            alloc.release(data);
        }
    }

    fn serialize_size(
        &self,
        _alloc: &ScopedAllocator,
        _instance: &Blob,
        fields: &StaticFields,
    ) -> usize {
        declared_len(fields)
    }

    fn serialize(
        &self,
        alloc: &ScopedAllocator,
        instance: &Blob,
        fields: &StaticFields,
        dest: &mut [u8],
    ) -> Result<(), HandlerError> {
        read_into(alloc, instance, declared_len(fields), dest)
    }

    fn unserialize(
        &self,
        alloc: &mut ScopedAllocator,
        instance: &mut Blob,
        fields: &mut StaticFields,
        payload: &[u8],
    ) -> Result<(), HandlerError> {
        let len = declared_len(fields);
        if payload.len() != len {
            return Err(HandlerError::new(format!(
                "blob payload is {} bytes, header declares {len}",
                payload.len()
            )));
        }
        write_from(alloc, instance, payload)
    }

    fn pack(
        &self,
        alloc: &mut ScopedAllocator,
        instance: &mut Blob,
        _fields: &mut StaticFields,
        raw: &[u8],
    ) -> Result<(), HandlerError> {
        write_from(alloc, instance, raw)?;
        trace!(len = raw.len(), "blob packed");
        Ok(())
    }

    fn unpack_size(
        &self,
        _alloc: &ScopedAllocator,
        _instance: &Blob,
        fields: &StaticFields,
    ) -> usize {
        declared_len(fields)
    }

    fn unpack(
        &self,
        alloc: &ScopedAllocator,
        instance: &Blob,
        fields: &StaticFields,
        dest: &mut [u8],
    ) -> Result<(), HandlerError> {
        read_into(alloc, instance, declared_len(fields), dest)
    }
}

fn write_from(
    alloc: &mut ScopedAllocator,
    instance: &Blob,
    src: &[u8],
) -> Result<(), HandlerError> {
    if src.is_empty() {
        return Ok(());
    }
    let data = instance
        .data
        .and_then(|data| alloc.get_mut(data))
        .filter(|data| data.len() == src.len())
        .ok_or_else(|| HandlerError::new("blob buffer does not match input length"))?;
    data.copy_from_slice(src);
    Ok(())
}

fn read_into(
    alloc: &ScopedAllocator,
    instance: &Blob,
    len: usize,
    dest: &mut [u8],
) -> Result<(), HandlerError> {
    if len == 0 {
        return Ok(());
    }
    let data = instance
        .data
        .and_then(|data| alloc.get(data))
        .filter(|data| data.len() >= len && dest.len() >= len)
        .ok_or_else(|| HandlerError::new("blob buffer shorter than declared length"))?;
    dest[..len].copy_from_slice(&data[..len]);
    Ok(())
}
