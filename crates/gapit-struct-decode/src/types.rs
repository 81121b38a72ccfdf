use std::fmt;

use serde::{Serialize, Serializer};

use crate::arch::Architecture;

/// Widest field the decoder converts; every primitive fits a `u64`.
pub const MAX_FIELD_WIDTH: usize = 8;

/// Primitive field types understood by the decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// `uint32_t`.
    Uint32,
    /// Non-dispatchable handle; a 64-bit logical value stored with the architecture's handle width.
    Handle,
    /// Pointer-sized unsigned integer.
    Pointer,
    /// `size_t`.
    SizeT,
    /// IEEE-754 binary32.
    Float,
    /// `VkDeviceSize`, always 8 bytes.
    DeviceSize,
    /// Alignment padding between a 32-bit field and a pointer-aligned one (`pointer_size - 4`).
    PointerPad,
}

impl TypeTag {
    pub const ALL: [TypeTag; 7] = [
        TypeTag::Uint32,
        TypeTag::Handle,
        TypeTag::Pointer,
        TypeTag::SizeT,
        TypeTag::Float,
        TypeTag::DeviceSize,
        TypeTag::PointerPad,
    ];

    /// Width that does not depend on the architecture, if any.
    pub fn fixed_width(self) -> Option<usize> {
        self.width(None)
    }

    /// Resolves the byte width of this type. Returns `None` if the width depends on an
    /// architecture and none was supplied.
    pub fn width(self, arch: Option<&Architecture>) -> Option<usize> {
        let width = match self {
            TypeTag::Uint32 | TypeTag::Float => 4,
            TypeTag::DeviceSize => 8,
            TypeTag::Handle => usize::from(arch?.handle_size),
            TypeTag::Pointer => usize::from(arch?.pointer_size),
            TypeTag::SizeT => usize::from(arch?.size_size),
            TypeTag::PointerPad => usize::from(arch?.pointer_size).saturating_sub(4),
        };
        Some(width)
    }

    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Uint32 => "uint32_t",
            TypeTag::Handle => "handle",
            TypeTag::Pointer => "pointer",
            TypeTag::SizeT => "size_t",
            TypeTag::Float => "float",
            TypeTag::DeviceSize => "device_size",
            TypeTag::PointerPad => "pointer_pad",
        }
    }

    /// Parses a type name as written in schema files. Accepts the canonical names plus a few
    /// common spellings.
    pub fn from_name(name: &str) -> Option<TypeTag> {
        let tag = match name.trim() {
            "uint32_t" | "u32" | "uint32" | "UINT32_T" => TypeTag::Uint32,
            "handle" | "HANDLE" => TypeTag::Handle,
            "pointer" | "ptr" | "POINTER" => TypeTag::Pointer,
            "size_t" | "usize" | "SIZE_T" => TypeTag::SizeT,
            "float" | "f32" | "FLOAT" => TypeTag::Float,
            "device_size" | "VkDeviceSize" | "DEVICE_SIZE" => TypeTag::DeviceSize,
            "pointer_pad" | "POINTER_PAD" => TypeTag::PointerPad,
            _ => return None,
        };
        Some(tag)
    }

    /// Converts `bytes` (exactly this type's resolved width) into a value.
    pub(crate) fn convert(self, bytes: &[u8]) -> Value {
        match self {
            TypeTag::Float => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(&bytes[..4]);
                Value::Float(f32::from_le_bytes(buf))
            }
            _ => Value::Uint(le_bytes_to_u64(bytes)),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for TypeTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// A decoded scalar.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Uint(u64),
    Float(f32),
}

impl Value {
    pub fn as_uint(self) -> Option<u64> {
        match self {
            Value::Uint(v) => Some(v),
            Value::Float(_) => None,
        }
    }

    pub fn as_float(self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(v),
            Value::Uint(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Uint(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
        }
    }
}

/// Little-endian unsigned integer of up to 8 bytes. An empty slice decodes as 0.
pub fn le_bytes_to_u64(bytes: &[u8]) -> u64 {
    debug_assert!(bytes.len() <= 8);
    bytes
        .iter()
        .rev()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}
