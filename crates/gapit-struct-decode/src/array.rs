use tracing::debug;

use crate::arch::Architecture;
use crate::decode::{decode, DecodedRecord};
use crate::error::{DecodeError, Result};
use crate::schema::Schema;
use crate::source::ByteSource;

/// `count` same-shaped records laid out back to back from `base`.
///
/// The stride is the schema's span on the given architecture, so a `size_t` member makes the
/// array 4 bytes per record tighter on 32-bit captures.
#[derive(Clone, Debug)]
pub struct RecordArray {
    schema: Schema,
    arch: Option<Architecture>,
    base: u64,
    count: u64,
    stride: u64,
}

impl RecordArray {
    pub fn new(schema: Schema, arch: Option<&Architecture>, base: u64, count: u64) -> Result<Self> {
        let stride = schema.stride(arch)?;
        Ok(Self {
            schema,
            arch: arch.copied(),
            base,
            count,
            stride,
        })
    }

    /// Builds the array described by a decoded header: `count_field` holds the element count and
    /// `pointer_field` the address of the first element.
    pub fn from_header(
        header: &DecodedRecord,
        count_field: &str,
        pointer_field: &str,
        schema: Schema,
        arch: Option<&Architecture>,
    ) -> Result<Self> {
        let count = header.require_uint(count_field)?;
        let base = header.require_uint(pointer_field)?;
        debug!(
            header = header.schema().name(),
            element = schema.name(),
            count,
            base = format_args!("0x{base:x}"),
            "following header array"
        );
        Self::new(schema, arch, base, count)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn len(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Start offset of record `index`: `base + index * stride`.
    pub fn element_offset(&self, index: u64) -> Result<u64> {
        if index >= self.count {
            return Err(DecodeError::IndexOutOfRange {
                index,
                count: self.count,
            });
        }
        index
            .checked_mul(self.stride)
            .and_then(|rel| self.base.checked_add(rel))
            .ok_or_else(|| DecodeError::OffsetOverflow {
                field: format!("{}[{index}]", self.schema.name()),
                base: self.base,
            })
    }

    pub fn decode<S>(&self, index: u64, source: &S) -> Result<DecodedRecord>
    where
        S: ByteSource + ?Sized,
    {
        let offset = self.element_offset(index)?;
        decode(self.arch.as_ref(), &self.schema, offset, source)
    }

    /// Decodes every record, failing on the first record that cannot be read.
    pub fn decode_all<S>(&self, source: &S) -> Result<Vec<DecodedRecord>>
    where
        S: ByteSource + ?Sized,
    {
        (0..self.count).map(|i| self.decode(i, source)).collect()
    }
}
