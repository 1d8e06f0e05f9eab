//! Handlers used by the unit tests.

use crate::alloc::{Allocation, ScopedAllocator};
use crate::error::{HandlerError, Operation};
use crate::fields::{Field, LayoutBuilder, StaticFields};
use crate::handler::Handler;

pub(crate) const SIZE: Field<u32> = Field::at(0);
pub(crate) const TAG: Field<u32> = Field::at(4);

/// Byte blob with its length in static fields, plus a free-form tag.
#[derive(Debug, Default)]
pub(crate) struct SampleHandler {
    /// Skip releasing the data buffer on destroy.
    pub(crate) leak: bool,
    /// Operation that always fails.
    pub(crate) fail: Option<Operation>,
}

impl SampleHandler {
    pub(crate) fn leaky() -> Self {
        Self {
            leak: true,
            fail: None,
        }
    }

    pub(crate) fn failing(operation: Operation) -> Self {
        Self {
            leak: false,
            fail: Some(operation),
        }
    }

    fn check(&self, operation: Operation) -> Result<(), HandlerError> {
        if self.fail == Some(operation) {
            return Err(HandlerError::new(format!("injected {operation} failure")));
        }
        Ok(())
    }

    fn size(fields: &StaticFields) -> usize {
        fields.get(SIZE).map_or(0, |size| size as usize)
    }
}

#[derive(Debug)]
pub(crate) struct SampleData {
    pub(crate) data: Option<Allocation>,
}

impl Handler for SampleHandler {
    type Instance = SampleData;

    fn static_fields_size(&self) -> usize {
        let mut layout = LayoutBuilder::new();
        layout.field::<u32>();
        layout.field::<u32>();
        layout.finish()
    }

    fn create(
        &self,
        alloc: &mut ScopedAllocator,
        size_hint: usize,
        fields: &mut StaticFields,
    ) -> Result<SampleData, HandlerError> {
        self.check(Operation::Create)?;
        let size = u32::try_from(size_hint)
            .map_err(|_| HandlerError::new("sample data larger than u32::MAX"))?;
        let data = match size_hint {
            0 => None,
            n => Some(alloc.calloc(1, n)?),
        };
        fields.set(SIZE, size)?;
        Ok(SampleData { data })
    }

    fn destroy(
        &self,
        alloc: &mut ScopedAllocator,
        instance: SampleData,
        _fields: &mut StaticFields,
    ) {
        if let (Some(data), false) = (instance.data, self.leak) {
            alloc.release(data);
        }
    }

    fn serialize_size(&self, _: &ScopedAllocator, _: &SampleData, fields: &StaticFields) -> usize {
        Self::size(fields)
    }

    fn serialize(
        &self,
        alloc: &ScopedAllocator,
        instance: &SampleData,
        fields: &StaticFields,
        dest: &mut [u8],
    ) -> Result<(), HandlerError> {
        self.check(Operation::Serialize)?;
        copy_out(alloc, instance, Self::size(fields), dest)
    }

    fn unserialize(
        &self,
        alloc: &mut ScopedAllocator,
        instance: &mut SampleData,
        fields: &mut StaticFields,
        payload: &[u8],
    ) -> Result<(), HandlerError> {
        self.check(Operation::Unserialize)?;
        copy_in(alloc, instance, Self::size(fields), payload)
    }

    fn pack(
        &self,
        alloc: &mut ScopedAllocator,
        instance: &mut SampleData,
        fields: &mut StaticFields,
        raw: &[u8],
    ) -> Result<(), HandlerError> {
        self.check(Operation::Pack)?;
        copy_in(alloc, instance, Self::size(fields), raw)
    }

    fn unpack_size(&self, _: &ScopedAllocator, _: &SampleData, fields: &StaticFields) -> usize {
        Self::size(fields)
    }

    fn unpack(
        &self,
        alloc: &ScopedAllocator,
        instance: &SampleData,
        fields: &StaticFields,
        dest: &mut [u8],
    ) -> Result<(), HandlerError> {
        self.check(Operation::Unpack)?;
        copy_out(alloc, instance, Self::size(fields), dest)
    }
}

fn copy_in(
    alloc: &mut ScopedAllocator,
    instance: &SampleData,
    size: usize,
    src: &[u8],
) -> Result<(), HandlerError> {
    if size == 0 {
        return Ok(());
    }
    let data = instance
        .data
        .and_then(|data| alloc.get_mut(data))
        .ok_or_else(|| HandlerError::new("sample data missing"))?;
    if src.len() < size || data.len() < size {
        return Err(HandlerError::new("sample input too short"));
    }
    data[..size].copy_from_slice(&src[..size]);
    Ok(())
}

fn copy_out(
    alloc: &ScopedAllocator,
    instance: &SampleData,
    size: usize,
    dest: &mut [u8],
) -> Result<(), HandlerError> {
    if size == 0 {
        return Ok(());
    }
    let data = instance
        .data
        .and_then(|data| alloc.get(data))
        .ok_or_else(|| HandlerError::new("sample data missing"))?;
    dest[..size].copy_from_slice(&data[..size]);
    Ok(())
}

pub(crate) fn random_bytes(len: usize) -> Vec<u8> {
    std::iter::repeat_with(|| fastrand::u8(..))
        .take(len)
        .collect()
}
