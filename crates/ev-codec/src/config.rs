//! Codec configuration. Both sides of the boundary must use the same one.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::CodecError;

/// Byte order of multi-byte payloads. The tag byte is unaffected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    /// Most significant byte first. Matches the runtime's reference buffer
    /// `04 00 00 00 01` for the integer 1.
    #[default]
    Big,
    Little,
}

impl ByteOrder {
    pub(crate) fn i32_bytes(self, value: i32) -> [u8; 4] {
        match self {
            Self::Big => value.to_be_bytes(),
            Self::Little => value.to_le_bytes(),
        }
    }

    pub(crate) fn read_i32(self, bytes: [u8; 4]) -> i32 {
        match self {
            Self::Big => i32::from_be_bytes(bytes),
            Self::Little => i32::from_le_bytes(bytes),
        }
    }

    pub(crate) fn u32_bytes(self, value: u32) -> [u8; 4] {
        match self {
            Self::Big => value.to_be_bytes(),
            Self::Little => value.to_le_bytes(),
        }
    }

    pub(crate) fn read_u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            Self::Big => u32::from_be_bytes(bytes),
            Self::Little => u32::from_le_bytes(bytes),
        }
    }

    pub(crate) fn f64_bytes(self, value: f64) -> [u8; 8] {
        match self {
            Self::Big => value.to_be_bytes(),
            Self::Little => value.to_le_bytes(),
        }
    }

    pub(crate) fn read_f64(self, bytes: [u8; 8]) -> f64 {
        match self {
            Self::Big => f64::from_be_bytes(bytes),
            Self::Little => f64::from_le_bytes(bytes),
        }
    }
}

impl FromStr for ByteOrder {
    type Err = CodecError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "big" | "be" => Ok(Self::Big),
            "little" | "le" => Ok(Self::Little),
            other => Err(CodecError::InvalidConfig {
                message: format!("unknown byte order `{other}` (expected big or little)"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecConfig {
    pub byte_order: ByteOrder,
}

impl CodecConfig {
    #[must_use]
    pub fn with_byte_order(byte_order: ByteOrder) -> Self {
        Self { byte_order }
    }

    pub fn from_json(raw: &str) -> Result<Self, CodecError> {
        serde_json::from_str(raw).map_err(|err| CodecError::InvalidConfig {
            message: err.to_string(),
        })
    }

    pub fn to_json(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(|err| CodecError::InvalidConfig {
            message: err.to_string(),
        })
    }
}
