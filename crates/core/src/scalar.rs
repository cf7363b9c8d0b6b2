//! Zero-dimensional typed values: single numbers carrying their dtype.

use crate::dtype::{DType, TimeUnit};

/// The payload of a typed scalar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarValue {
    /// Boolean payload.
    Bool(bool),
    /// Signed integer payload; also carries temporal epoch ticks.
    Int(i64),
    /// Unsigned integer payload.
    UInt(u64),
    /// Floating point payload.
    Float(f64),
}

/// A single typed value, the zero-dimensional counterpart of a dense array.
///
/// Temporal scalars hold their epoch tick count as an `Int` payload; the
/// dtype alone recovers the resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scalar {
    dtype: DType,
    value: ScalarValue,
}

impl Scalar {
    /// A scalar from an explicit dtype and payload.
    pub fn new(dtype: DType, value: ScalarValue) -> Scalar {
        Scalar { dtype, value }
    }

    /// A 64-bit signed integer scalar.
    pub fn int64(value: i64) -> Scalar {
        Scalar::new(DType::Int64, ScalarValue::Int(value))
    }

    /// A 64-bit unsigned integer scalar.
    pub fn uint64(value: u64) -> Scalar {
        Scalar::new(DType::UInt64, ScalarValue::UInt(value))
    }

    /// A double-precision scalar.
    pub fn float64(value: f64) -> Scalar {
        Scalar::new(DType::Float64, ScalarValue::Float(value))
    }

    /// A boolean scalar.
    pub fn bool(value: bool) -> Scalar {
        Scalar::new(DType::Bool, ScalarValue::Bool(value))
    }

    /// A datetime scalar from epoch ticks at the given resolution.
    pub fn datetime(unit: TimeUnit, ticks: i64) -> Scalar {
        Scalar::new(DType::Datetime64(unit), ScalarValue::Int(ticks))
    }

    /// A timedelta scalar from ticks at the given resolution.
    pub fn timedelta(unit: TimeUnit, ticks: i64) -> Scalar {
        Scalar::new(DType::Timedelta64(unit), ScalarValue::Int(ticks))
    }

    /// The scalar's element type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// The scalar's payload.
    pub fn value(&self) -> ScalarValue {
        self.value
    }
}
