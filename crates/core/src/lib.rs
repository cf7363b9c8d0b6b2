//! Core value model for Trellis result transport.
//!
//! This crate defines every type that crosses the encode/decode boundary of
//! the Trellis wire layer: the JSON-shaped [`Value`] tree codecs emit, the
//! dense [`NdArray`] buffer, typed [`Scalar`]s, [`Selection`] predicates,
//! serialized [`Function`]s and their [`Trust`] boundary, categorical
//! [`OrderedSet`]s, aggregation [`Binner`]/[`Grid`] axes, and the closed
//! [`Datum`] union the codecs dispatch on.
//!
//! The wire layer itself (registry, session, codecs, envelopes) lives in
//! `trellis-wire`; this crate carries no encoding logic beyond each type's
//! own canonical dictionary form.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod agg;
pub mod array;
pub mod datum;
pub mod dtype;
pub mod function;
pub mod ordered_set;
pub mod scalar;
pub mod selection;
pub mod value;

pub use agg::{Binner, BinnerError, BinnerKind, Grid};
pub use array::{ArrayData, ArrayError, Element, NdArray};
pub use datum::Datum;
pub use dtype::{ByteOrder, DType, DTypeParseError, TimeUnit};
pub use function::{Function, FunctionError, FunctionSource, Trust};
pub use ordered_set::{OrderedSet, SetError, TypedSet};
pub use scalar::{Scalar, ScalarValue};
pub use selection::{Selection, SelectionError, SelectionMode};
pub use value::Value;
