#![forbid(unsafe_code)]

//! # ev-core
//!
//! The value model that crosses the native runtime boundary: a closed set of
//! kinds ([`Tag`]) and the discriminated value itself ([`EValue`]).
//!
//! Tag numbers are protocol constants shared with the runtime's decoder.
//! They are defined once, in [`Tag::as_byte`] and [`Tag::from_byte`], and
//! must never be renumbered.

pub mod tensor;

use serde::{Deserialize, Serialize};

pub use tensor::{DType, Shape, TensorValue};

/// Kind marker of an [`EValue`]. Its byte form leads every encoded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    None,
    Tensor,
    String,
    Double,
    Int,
    Bool,
}

impl Tag {
    pub const ALL: [Tag; 6] = [
        Tag::None,
        Tag::Tensor,
        Tag::String,
        Tag::Double,
        Tag::Int,
        Tag::Bool,
    ];

    #[must_use]
    pub fn as_byte(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Tensor => 1,
            Self::String => 2,
            Self::Double => 3,
            Self::Int => 4,
            Self::Bool => 5,
        }
    }

    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::None),
            1 => Some(Self::Tensor),
            2 => Some(Self::String),
            3 => Some(Self::Double),
            4 => Some(Self::Int),
            5 => Some(Self::Bool),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Tensor => "tensor",
            Self::String => "string",
            Self::Double => "double",
            Self::Int => "int",
            Self::Bool => "bool",
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name(), self.as_byte())
    }
}

/// A tagged value. The variant is the kind, so kind and payload cannot
/// disagree.
///
/// `Double` compares by bit pattern: `NaN == NaN` when the bits match, and
/// `0.0 != -0.0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EValue {
    None,
    Int(i64),
    Double(f64),
    Bool(bool),
    String(String),
    Tensor(TensorValue),
}

impl EValue {
    #[must_use]
    pub fn none() -> Self {
        Self::None
    }

    #[must_use]
    pub fn from_int(value: i64) -> Self {
        Self::Int(value)
    }

    #[must_use]
    pub fn from_double(value: f64) -> Self {
        Self::Double(value)
    }

    #[must_use]
    pub fn from_bool(value: bool) -> Self {
        Self::Bool(value)
    }

    #[must_use]
    pub fn from_string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    #[must_use]
    pub fn from_tensor(value: TensorValue) -> Self {
        Self::Tensor(value)
    }

    #[must_use]
    pub fn tag(&self) -> Tag {
        match self {
            Self::None => Tag::None,
            Self::Int(_) => Tag::Int,
            Self::Double(_) => Tag::Double,
            Self::Bool(_) => Tag::Bool,
            Self::String(_) => Tag::String,
            Self::Tensor(_) => Tag::Tensor,
        }
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_tensor(&self) -> Option<&TensorValue> {
        match self {
            Self::Tensor(value) => Some(value),
            _ => None,
        }
    }
}

impl PartialEq for EValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Tensor(a), Self::Tensor(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for EValue {}

impl From<i64> for EValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for EValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for EValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<bool> for EValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for EValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for EValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<TensorValue> for EValue {
    fn from(value: TensorValue) -> Self {
        Self::Tensor(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    NegativeDim {
        index: usize,
        dim: i64,
    },
    ShapeOverflow {
        dims: Vec<i64>,
    },
    DataLengthMismatch {
        dtype: DType,
        dims: Vec<i64>,
        expected_bytes: usize,
        actual_bytes: usize,
    },
}

impl std::fmt::Display for ValueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeDim { index, dim } => {
                write!(f, "tensor dim {index} is negative: {dim}")
            }
            Self::ShapeOverflow { dims } => {
                write!(f, "tensor element count overflowed for shape {dims:?}")
            }
            Self::DataLengthMismatch {
                dtype,
                dims,
                expected_bytes,
                actual_bytes,
            } => {
                write!(
                    f,
                    "tensor data length mismatch for {dtype:?} {dims:?}: expected {expected_bytes} bytes, got {actual_bytes}"
                )
            }
        }
    }
}

impl std::error::Error for ValueError {}
