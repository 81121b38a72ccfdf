use thiserror::Error;

use crate::types::TypeTag;

pub type Result<T> = std::result::Result<T, DecodeError>;

/// A schema definition is malformed. Raised while building a [`crate::Schema`], so it always
/// surfaces before any byte is read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("schema `{schema}` has no fields")]
    Empty { schema: String },

    #[error("schema `{schema}` declares field `{field}` more than once")]
    DuplicateField { schema: String, field: String },

    #[error("schema `{schema}` field `{field}` has unknown type tag `{tag}`")]
    UnknownTypeTag {
        schema: String,
        field: String,
        tag: String,
    },
}

/// Errors reported by a [`crate::ByteSource`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    /// No observation covers the byte at `offset`.
    #[error("unmapped memory: {len} bytes at 0x{offset:x}")]
    Unmapped { offset: u64, len: usize },

    /// The request runs past the end of a bounded source.
    #[error("read out of range: offset=0x{offset:x} len={len} size=0x{size:x}")]
    OutOfRange { offset: u64, len: usize, size: u64 },

    /// More bytes than fit an unsigned integer were requested.
    #[error("cannot read {width} bytes at 0x{offset:x} as an integer (at most 8)")]
    WidthTooLarge { offset: u64, width: usize },

    #[error("address overflow: offset=0x{offset:x} len={len}")]
    Overflow { offset: u64, len: usize },

    /// A reader returned a different number of bytes than requested.
    #[error("short read at 0x{offset:x}: expected {expected} bytes, got {found}")]
    ShortRead {
        offset: u64,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("field `{field}` ({tag}) needs an architecture descriptor to resolve its width")]
    UnresolvedWidth { field: String, tag: TypeTag },

    #[error("field `{field}` ({tag}) resolves to {width} bytes, wider than the 8 bytes a value holds")]
    UnsupportedWidth {
        field: String,
        tag: TypeTag,
        width: usize,
    },

    #[error("failed to read field `{field}` ({width} bytes at 0x{offset:x}): {source}")]
    ReadFailure {
        field: String,
        offset: u64,
        width: usize,
        #[source]
        source: ReadError,
    },

    #[error("field `{field}` offset overflows the address space (base 0x{base:x})")]
    OffsetOverflow { field: String, base: u64 },

    #[error("record index {index} out of range (array holds {count} records)")]
    IndexOutOfRange { index: u64, count: u64 },

    #[error("record has no unsigned integer field `{field}`")]
    MissingField { field: String },
}
