use std::ops::Index;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::{debug, trace};

use crate::arch::Architecture;
use crate::error::{DecodeError, Result};
use crate::schema::{FieldId, Schema};
use crate::source::ByteSource;
use crate::types::{Value, MAX_FIELD_WIDTH};

/// One decoded field: where it was read from and what it held.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecodedField {
    /// Absolute offset in the byte source.
    pub offset: u64,
    pub width: usize,
    pub value: Value,
}

/// A fully decoded record. Every field of the schema is present; there are no partial records.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedRecord {
    schema: Schema,
    base_offset: u64,
    fields: Vec<DecodedField>,
}

impl DecodedRecord {
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn base_offset(&self) -> u64 {
        self.base_offset
    }

    /// Number of bytes the record occupies in the source.
    pub fn span(&self) -> u64 {
        self.fields.iter().map(|f| f.width as u64).sum()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&DecodedField> {
        let id = self.schema.field_id(name)?;
        Some(&self.fields[id.0])
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.field(name).map(|f| f.value)
    }

    pub fn uint(&self, name: &str) -> Option<u64> {
        self.get(name)?.as_uint()
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        self.get(name)?.as_float()
    }

    /// Like [`DecodedRecord::uint`], but reports a missing or non-integer field as an error.
    pub fn require_uint(&self, name: &str) -> Result<u64> {
        self.uint(name).ok_or_else(|| DecodeError::MissingField {
            field: name.to_string(),
        })
    }

    pub fn offset_of(&self, name: &str) -> Option<u64> {
        self.field(name).map(|f| f.offset)
    }

    pub fn width_of(&self, name: &str) -> Option<usize> {
        self.field(name).map(|f| f.width)
    }

    pub fn fields(&self) -> &[DecodedField] {
        &self.fields
    }

    /// `(name, field)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DecodedField)> + '_ {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name.as_str())
            .zip(self.fields.iter())
    }
}

impl Index<FieldId> for DecodedRecord {
    type Output = Value;

    fn index(&self, id: FieldId) -> &Value {
        &self.fields[id.0].value
    }
}

impl Serialize for DecodedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, field) in self.iter() {
            map.serialize_entry(name, &field.value)?;
        }
        map.end()
    }
}

/// Decodes one record laid out per `schema` starting at `base_offset`.
///
/// The whole layout is resolved before the first read, so a missing architecture never causes a
/// read. Any read failure aborts the decode.
pub fn decode<S>(
    arch: Option<&Architecture>,
    schema: &Schema,
    base_offset: u64,
    source: &S,
) -> Result<DecodedRecord>
where
    S: ByteSource + ?Sized,
{
    let layout = schema.layout(arch)?;
    debug!(
        schema = schema.name(),
        base = format_args!("0x{base_offset:x}"),
        span = layout.span,
        "decoding record"
    );

    let mut fields = Vec::with_capacity(layout.fields.len());
    let mut buf = [0u8; MAX_FIELD_WIDTH];
    for (field, slot) in schema.fields().iter().zip(layout.fields.iter()) {
        let offset =
            base_offset
                .checked_add(slot.offset)
                .ok_or_else(|| DecodeError::OffsetOverflow {
                    field: field.name.clone(),
                    base: base_offset,
                })?;

        let bytes = &mut buf[..slot.width];
        source
            .read_into(offset, bytes)
            .map_err(|source| DecodeError::ReadFailure {
                field: field.name.clone(),
                offset,
                width: slot.width,
                source,
            })?;

        let value = field.tag.convert(bytes);
        trace!(field = %field.name, tag = %field.tag, offset, %value, "decoded field");
        fields.push(DecodedField {
            offset,
            width: slot.width,
            value,
        });
    }

    Ok(DecodedRecord {
        schema: schema.clone(),
        base_offset,
        fields,
    })
}
