//! Decoding of packed, architecture-dependent binary records out of captured memory.
//!
//! A [`Schema`] lists a record's fields in layout order. [`decode`] resolves every field's offset
//! from the field widths (pointer, `size_t` and handle widths come from an [`Architecture`]),
//! reads the bytes through a [`ByteSource`] and converts them to little-endian [`Value`]s.
//! [`RecordArray`] covers the "N records after a header" pattern.
//!
//! ```
//! use gapit_struct_decode::{decode, Architecture, Schema, TypeTag};
//!
//! let schema = Schema::new("Pair", [("a", TypeTag::Uint32), ("b", TypeTag::Handle)]).unwrap();
//! let bytes: Vec<u8> = vec![1, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0];
//! let record = decode(Some(&Architecture::X86_64), &schema, 0, &bytes).unwrap();
//! assert_eq!(record.uint("a"), Some(1));
//! assert_eq!(record.uint("b"), Some(2));
//! ```

#![forbid(unsafe_code)]

mod arch;
mod array;
mod capture;
pub mod catalog;
mod decode;
mod error;
mod schema;
mod source;
mod types;

pub use arch::{Architecture, InvalidArchitecture, UnknownArchitecture};
pub use array::RecordArray;
pub use capture::CaptureMemory;
pub use decode::{decode, DecodedField, DecodedRecord};
pub use error::{DecodeError, ReadError, Result, SchemaError};
pub use schema::{Field, FieldDef, FieldId, FieldLayout, Layout, Schema, SchemaDef};
pub use source::{ByteSource, ReadFn};
pub use types::{le_bytes_to_u64, TypeTag, Value, MAX_FIELD_WIDTH};
