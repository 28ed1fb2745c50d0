//! Tensor payloads as carried by [`crate::EValue::Tensor`].
//!
//! Only the in-memory model lives here. There is no wire layout for tensors
//! yet, so the codec rejects them.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::ValueError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    UInt8,
    Int32,
    Int64,
    Float32,
    Float64,
    Bool,
}

impl DType {
    #[must_use]
    pub fn size_bytes(self) -> usize {
        match self {
            Self::UInt8 | Self::Bool => 1,
            Self::Int32 | Self::Float32 => 4,
            Self::Int64 | Self::Float64 => 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    pub dims: SmallVec<[i64; 4]>,
}

impl Shape {
    #[must_use]
    pub fn scalar() -> Self {
        Self {
            dims: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn from_dims(dims: &[i64]) -> Self {
        Self {
            dims: SmallVec::from_slice(dims),
        }
    }

    #[must_use]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Product of the dims. `None` on a negative dim or on overflow.
    #[must_use]
    pub fn element_count(&self) -> Option<u64> {
        self.dims.iter().try_fold(1_u64, |acc, &dim| {
            u64::try_from(dim).ok().and_then(|dim| acc.checked_mul(dim))
        })
    }
}

/// A dense tensor: dtype, shape and the raw element bytes in native order.
///
/// Deserialization goes through [`TensorValue::new`], so a decoded tensor
/// satisfies the same shape and length checks as a constructed one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTensorValue")]
pub struct TensorValue {
    dtype: DType,
    shape: Shape,
    data: Vec<u8>,
}

#[derive(Deserialize)]
struct RawTensorValue {
    dtype: DType,
    shape: Shape,
    data: Vec<u8>,
}

impl TryFrom<RawTensorValue> for TensorValue {
    type Error = ValueError;

    fn try_from(raw: RawTensorValue) -> Result<Self, Self::Error> {
        Self::new(raw.dtype, raw.shape, raw.data)
    }
}

impl TensorValue {
    pub fn new(dtype: DType, shape: Shape, data: Vec<u8>) -> Result<Self, ValueError> {
        if let Some((index, &dim)) = shape.dims.iter().enumerate().find(|(_, dim)| **dim < 0) {
            return Err(ValueError::NegativeDim { index, dim });
        }

        let numel = shape
            .element_count()
            .ok_or_else(|| ValueError::ShapeOverflow {
                dims: shape.dims.to_vec(),
            })?;
        let expected_bytes = usize::try_from(numel)
            .ok()
            .and_then(|n| n.checked_mul(dtype.size_bytes()))
            .ok_or_else(|| ValueError::ShapeOverflow {
                dims: shape.dims.to_vec(),
            })?;

        if data.len() != expected_bytes {
            return Err(ValueError::DataLengthMismatch {
                dtype,
                dims: shape.dims.to_vec(),
                expected_bytes,
                actual_bytes: data.len(),
            });
        }

        Ok(Self { dtype, shape, data })
    }

    pub fn from_f32s(values: &[f32], dims: &[i64]) -> Result<Self, ValueError> {
        let data = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        Self::new(DType::Float32, Shape::from_dims(dims), data)
    }

    pub fn from_f64s(values: &[f64], dims: &[i64]) -> Result<Self, ValueError> {
        let data = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        Self::new(DType::Float64, Shape::from_dims(dims), data)
    }

    pub fn from_i32s(values: &[i32], dims: &[i64]) -> Result<Self, ValueError> {
        let data = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        Self::new(DType::Int32, Shape::from_dims(dims), data)
    }

    pub fn from_i64s(values: &[i64], dims: &[i64]) -> Result<Self, ValueError> {
        let data = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        Self::new(DType::Int64, Shape::from_dims(dims), data)
    }

    #[must_use]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn numel(&self) -> usize {
        self.data.len() / self.dtype.size_bytes()
    }

    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}
