//! Aggregation bin-grid axis definitions.
//!
//! A [`Binner`] maps one expression onto bin indices along one axis: ordinal
//! binners cover a run of fixed integer categories, scalar binners cover a
//! continuous range. The constructors are the `(kind, dtype)` factory: they
//! reject element types that cannot be binned, so an unrecognized identity
//! fails structurally instead of producing a half-built axis. A [`Grid`] is
//! an ordered sequence of binners; the sequence order is the axis order.

use crate::dtype::{ByteOrder, DType};
use thiserror::Error;

/// Failure to build a binner axis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BinnerError {
    /// The element type has no binnable dense representation.
    #[error("dtype {dtype} cannot back a binner axis")]
    UnsupportedDType {
        /// The offending element type.
        dtype: DType,
    },
}

/// The two binner families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinnerKind {
    /// Fixed integer categories.
    Ordinal,
    /// Continuous range split into equal bins.
    Scalar,
}

impl BinnerKind {
    /// The wire string for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinnerKind::Ordinal => "ordinal",
            BinnerKind::Scalar => "scalar",
        }
    }
}

/// One axis of an aggregation bin grid.
#[derive(Debug, Clone, PartialEq)]
pub enum Binner {
    /// Fixed integer categories `minimum .. minimum + count`.
    Ordinal {
        /// Expression producing the binned values.
        expression: String,
        /// Element type of the binned values.
        dtype: DType,
        /// Byte order of the identity this axis was built against.
        order: ByteOrder,
        /// Number of categories.
        count: i64,
        /// First category value.
        minimum: i64,
    },
    /// Continuous range `[minimum, maximum)` split into `count` bins.
    Scalar {
        /// Expression producing the binned values.
        expression: String,
        /// Element type of the binned values.
        dtype: DType,
        /// Byte order of the identity this axis was built against.
        order: ByteOrder,
        /// Number of bins.
        count: i64,
        /// Lower edge of the range.
        minimum: f64,
        /// Upper edge of the range.
        maximum: f64,
    },
}

fn check_binnable(dtype: DType) -> Result<(), BinnerError> {
    match dtype.size() {
        Some(_) => Ok(()),
        None => Err(BinnerError::UnsupportedDType { dtype }),
    }
}

impl Binner {
    /// An ordinal axis over fixed integer categories.
    pub fn ordinal(
        expression: impl Into<String>,
        dtype: DType,
        order: ByteOrder,
        count: i64,
        minimum: i64,
    ) -> Result<Binner, BinnerError> {
        check_binnable(dtype)?;
        Ok(Binner::Ordinal {
            expression: expression.into(),
            dtype,
            order,
            count,
            minimum,
        })
    }

    /// A scalar axis over a continuous range.
    pub fn scalar(
        expression: impl Into<String>,
        dtype: DType,
        order: ByteOrder,
        count: i64,
        minimum: f64,
        maximum: f64,
    ) -> Result<Binner, BinnerError> {
        check_binnable(dtype)?;
        Ok(Binner::Scalar {
            expression: expression.into(),
            dtype,
            order,
            count,
            minimum,
            maximum,
        })
    }

    /// This axis's family.
    pub fn kind(&self) -> BinnerKind {
        match self {
            Binner::Ordinal { .. } => BinnerKind::Ordinal,
            Binner::Scalar { .. } => BinnerKind::Scalar,
        }
    }

    /// Expression producing the binned values.
    pub fn expression(&self) -> &str {
        match self {
            Binner::Ordinal { expression, .. } | Binner::Scalar { expression, .. } => expression,
        }
    }

    /// Element type of the binned values.
    pub fn dtype(&self) -> DType {
        match self {
            Binner::Ordinal { dtype, .. } | Binner::Scalar { dtype, .. } => *dtype,
        }
    }

    /// Byte order of the identity this axis was built against.
    pub fn order(&self) -> ByteOrder {
        match self {
            Binner::Ordinal { order, .. } | Binner::Scalar { order, .. } => *order,
        }
    }

    /// Number of bins or categories along this axis.
    pub fn count(&self) -> i64 {
        match self {
            Binner::Ordinal { count, .. } | Binner::Scalar { count, .. } => *count,
        }
    }
}

/// An ordered sequence of binners; order defines axis order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grid {
    binners: Vec<Binner>,
}

impl Grid {
    /// A grid over the given axes, in axis order.
    pub fn new(binners: Vec<Binner>) -> Grid {
        Grid { binners }
    }

    /// The axes, in order.
    pub fn binners(&self) -> &[Binner] {
        &self.binners
    }

    /// Number of axes.
    pub fn len(&self) -> usize {
        self.binners.len()
    }

    /// True for a zero-axis grid.
    pub fn is_empty(&self) -> bool {
        self.binners.is_empty()
    }

    /// Bin count per axis, in axis order.
    pub fn shape(&self) -> Vec<i64> {
        self.binners.iter().map(Binner::count).collect()
    }
}
