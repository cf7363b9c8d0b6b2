//! Common imports for working with Trellis result transport.

pub use trellis_core::{
    Binner, ByteOrder, DType, Datum, Function, Grid, NdArray, OrderedSet, Scalar, Selection,
    SelectionMode, TimeUnit, Trust, TypedSet, Value,
};
pub use trellis_wire::{deserialize, serialize, DecodeOptions, Registry, Session};
