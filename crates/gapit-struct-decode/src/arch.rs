use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Memory layout parameters of the captured process.
///
/// The decoder only consumes this; it is built by whoever knows the capture's ABI (a trace
/// header, a command line flag, a test fixture). Descriptors read from JSON are checked with
/// [`Architecture::new`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ArchitectureDesc")]
pub struct Architecture {
    /// Width of a pointer, in bytes.
    pub pointer_size: u8,
    /// Width of `size_t`, in bytes.
    pub size_size: u8,
    /// Width a non-dispatchable handle is stored with, in bytes.
    pub handle_size: u8,
}

/// JSON shape of an [`Architecture`], before its widths are checked.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArchitectureDesc {
    pointer_size: u8,
    size_size: u8,
    #[serde(default = "default_handle_size")]
    handle_size: u8,
}

fn default_handle_size() -> u8 {
    8
}

impl TryFrom<ArchitectureDesc> for Architecture {
    type Error = InvalidArchitecture;

    fn try_from(desc: ArchitectureDesc) -> Result<Self, Self::Error> {
        Architecture::new(desc.pointer_size, desc.size_size, desc.handle_size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown architecture `{0}` (expected one of: x86, x86_64, armv7a, arm64)")]
pub struct UnknownArchitecture(pub String);

/// An architecture width outside what the decoder supports (4 or 8 bytes).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported {kind} width {width} (expected 4 or 8 bytes)")]
pub struct InvalidArchitecture {
    pub kind: &'static str,
    pub width: u8,
}

impl Architecture {
    pub const X86: Architecture = Architecture {
        pointer_size: 4,
        size_size: 4,
        handle_size: 8,
    };

    pub const X86_64: Architecture = Architecture {
        pointer_size: 8,
        size_size: 8,
        handle_size: 8,
    };

    pub const ARMV7A: Architecture = Architecture {
        pointer_size: 4,
        size_size: 4,
        handle_size: 8,
    };

    pub const ARM64: Architecture = Architecture {
        pointer_size: 8,
        size_size: 8,
        handle_size: 8,
    };

    pub fn new(
        pointer_size: u8,
        size_size: u8,
        handle_size: u8,
    ) -> Result<Self, InvalidArchitecture> {
        for (kind, width) in [
            ("pointer", pointer_size),
            ("size_t", size_size),
            ("handle", handle_size),
        ] {
            if width != 4 && width != 8 {
                return Err(InvalidArchitecture { kind, width });
            }
        }
        Ok(Self {
            pointer_size,
            size_size,
            handle_size,
        })
    }

    pub fn is_64_bit(&self) -> bool {
        self.pointer_size == 8
    }
}

impl FromStr for Architecture {
    type Err = UnknownArchitecture;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x86" | "i386" | "i686" => Ok(Self::X86),
            "x86_64" | "x86-64" | "amd64" => Ok(Self::X86_64),
            "armv7a" | "armeabi-v7a" | "arm" => Ok(Self::ARMV7A),
            "arm64" | "aarch64" | "arm64-v8a" => Ok(Self::ARM64),
            _ => Err(UnknownArchitecture(s.to_string())),
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ptr={} size_t={} handle={}",
            self.pointer_size, self.size_size, self.handle_size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_preset_names() {
        assert_eq!("x86_64".parse::<Architecture>().unwrap(), Architecture::X86_64);
        assert_eq!("AArch64".parse::<Architecture>().unwrap(), Architecture::ARM64);
        assert_eq!("i686".parse::<Architecture>().unwrap(), Architecture::X86);

        let err = "mips".parse::<Architecture>().unwrap_err();
        assert_eq!(err, UnknownArchitecture("mips".to_string()));
        assert!(err.to_string().contains("x86_64"));
    }

    #[test]
    fn deserializes_with_default_handle_size() {
        let arch: Architecture =
            serde_json::from_str(r#"{"pointerSize": 4, "sizeSize": 4}"#).unwrap();
        assert_eq!(arch, Architecture::X86);
        assert!(!arch.is_64_bit());
    }

    #[test]
    fn rejects_widths_other_than_4_or_8() {
        assert_eq!(Architecture::new(4, 4, 8), Ok(Architecture::X86));
        assert_eq!(
            Architecture::new(8, 2, 8),
            Err(InvalidArchitecture {
                kind: "size_t",
                width: 2
            })
        );

        let err = serde_json::from_str::<Architecture>(r#"{"pointerSize": 16, "sizeSize": 8}"#)
            .unwrap_err();
        assert!(err.to_string().contains("unsupported pointer width 16"), "{err}");
        assert!(serde_json::from_str::<Architecture>(
            r#"{"pointerSize": 8, "sizeSize": 8, "handleSize": 0}"#
        )
        .is_err());
    }

    #[test]
    fn serializes_every_width() {
        let json = serde_json::to_value(Architecture::X86).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"pointerSize": 4, "sizeSize": 4, "handleSize": 8})
        );
    }
}
