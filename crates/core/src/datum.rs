//! The closed union of values that cross the wire boundary.
//!
//! Every codec dispatches on `Datum` with an exhaustive match: a codec that
//! does not support a variant rejects it explicitly, and adding a variant
//! forces every codec to say what it does with it at compile time. There is
//! no open-ended runtime type dispatch anywhere in the transport layer.

use crate::agg::{Binner, Grid};
use crate::array::NdArray;
use crate::dtype::DType;
use crate::function::Function;
use crate::ordered_set::OrderedSet;
use crate::scalar::Scalar;
use crate::selection::Selection;
use crate::value::Value;
use arrow_array::ArrayRef;

/// A value travelling through encode or decode.
#[derive(Debug, Clone)]
pub enum Datum {
    /// Plain JSON-safe payload, passed through untouched.
    Json(Value),
    /// Dense N-dimensional buffer.
    Nd(NdArray),
    /// Columnar Arrow array.
    Column(ArrayRef),
    /// Typed scalar.
    Scalar(Scalar),
    /// Element-type tag.
    DType(DType),
    /// Row-filter predicate; `None` is the empty selection.
    Selection(Option<Selection>),
    /// Serialized user function; `None` is the unset binding.
    Function(Option<Function>),
    /// Categorical dictionary.
    OrderedSet(OrderedSet),
    /// One bin-grid axis.
    Binner(Binner),
    /// Ordered bin-grid axes.
    Grid(Grid),
    /// Raw byte binding.
    Bytes(Vec<u8>),
    /// Ordered sequence of results (batched outputs).
    List(Vec<Datum>),
}

impl Datum {
    /// Variant name, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Datum::Json(_) => "json",
            Datum::Nd(_) => "ndarray",
            Datum::Column(_) => "column",
            Datum::Scalar(_) => "scalar",
            Datum::DType(_) => "dtype",
            Datum::Selection(_) => "selection",
            Datum::Function(_) => "function",
            Datum::OrderedSet(_) => "ordered-set",
            Datum::Binner(_) => "binner",
            Datum::Grid(_) => "grid",
            Datum::Bytes(_) => "bytes",
            Datum::List(_) => "list",
        }
    }

    /// Borrow as a dense array.
    pub fn as_nd(&self) -> Option<&NdArray> {
        match self {
            Datum::Nd(array) => Some(array),
            _ => None,
        }
    }

    /// Borrow as a columnar array.
    pub fn as_column(&self) -> Option<&ArrayRef> {
        match self {
            Datum::Column(array) => Some(array),
            _ => None,
        }
    }

    /// Borrow as a plain JSON payload.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Datum::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Borrow as a typed scalar.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Datum::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Borrow as a result sequence.
    pub fn as_list(&self) -> Option<&[Datum]> {
        match self {
            Datum::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<NdArray> for Datum {
    fn from(array: NdArray) -> Self {
        Datum::Nd(array)
    }
}

impl From<ArrayRef> for Datum {
    fn from(array: ArrayRef) -> Self {
        Datum::Column(array)
    }
}

impl From<Scalar> for Datum {
    fn from(scalar: Scalar) -> Self {
        Datum::Scalar(scalar)
    }
}

impl From<Value> for Datum {
    fn from(value: Value) -> Self {
        Datum::Json(value)
    }
}

impl From<Grid> for Datum {
    fn from(grid: Grid) -> Self {
        Datum::Grid(grid)
    }
}

impl From<Binner> for Datum {
    fn from(binner: Binner) -> Self {
        Datum::Binner(binner)
    }
}

impl From<OrderedSet> for Datum {
    fn from(set: OrderedSet) -> Self {
        Datum::OrderedSet(set)
    }
}
