//! Built-in value codecs, one module per family.
//!
//! - `array`: dense buffers, typed scalars, and dtype tags
//! - `arrow`: columnar arrays through the Arrow IPC stream format
//! - `objects`: selections, functions, variables, and ordered sets
//! - `agg`: binners and bin grids
//! - `results`: result aliases, passthrough payloads, and dataframe state

pub mod agg;
pub mod array;
pub mod arrow;
pub mod objects;
pub mod results;

use crate::error::{Error, Result};
use crate::registry::Registry;
use std::collections::BTreeMap;
use trellis_core::Value;

/// Register every built-in codec on `registry`.
///
/// Called once by [`Registry::with_defaults`]; callers extending the tag set
/// do so after this, before the first session is created.
pub fn register_defaults(registry: &mut Registry) {
    registry.register("json", Box::new(results::JsonCodec));
    registry.register("array", Box::new(array::ArrayCodec));
    registry.register("native-array", Box::new(array::NativeArrayCodec));
    registry.register("arrow-array", Box::new(arrow::ArrowArrayCodec));
    registry.register("numeric-scalar", Box::new(array::NumericScalarCodec));
    registry.register("dtype", Box::new(array::DTypeCodec));
    registry.register("selection", Box::new(objects::SelectionCodec));
    registry.register("function", Box::new(objects::FunctionCodec));
    registry.register("variable", Box::new(objects::VariableCodec));
    registry.register("binner", Box::new(agg::BinnerCodec));
    registry.register("grid", Box::new(agg::GridCodec));
    registry.register("ordered-set", Box::new(objects::OrderedSetCodec));
    registry.register("dataframe-state", Box::new(results::DataFrameStateCodec));
    registry.register("task-result", Box::new(results::TaskResultCodec));
    registry.register("rmi-result", Box::new(results::RmiResultCodec));
    registry.register("evaluate-result", Box::new(results::EvaluateResultCodec));
}

/// `{type: <branch>, data: <payload>}` discriminant wrapper used by the
/// array and variable codecs.
pub(crate) fn type_wrapper(branch: &str, data: Value) -> Value {
    let mut obj = BTreeMap::new();
    obj.insert("type".to_string(), Value::from(branch));
    obj.insert("data".to_string(), data);
    Value::Object(obj)
}

pub(crate) fn require_object<'a>(
    spec: &'a Value,
    what: &str,
) -> Result<&'a BTreeMap<String, Value>> {
    spec.as_object()
        .ok_or_else(|| Error::format(format!("{what} spec must be an object")))
}

pub(crate) fn require_field<'a>(
    obj: &'a BTreeMap<String, Value>,
    key: &str,
    what: &str,
) -> Result<&'a Value> {
    obj.get(key)
        .ok_or_else(|| Error::format(format!("{what} spec is missing field {key:?}")))
}

pub(crate) fn require_str<'a>(
    obj: &'a BTreeMap<String, Value>,
    key: &str,
    what: &str,
) -> Result<&'a str> {
    require_field(obj, key, what)?
        .as_str()
        .ok_or_else(|| Error::format(format!("{what} field {key:?} must be a string")))
}

pub(crate) fn require_int(obj: &BTreeMap<String, Value>, key: &str, what: &str) -> Result<i64> {
    require_field(obj, key, what)?
        .as_int()
        .ok_or_else(|| Error::format(format!("{what} field {key:?} must be an integer")))
}

pub(crate) fn require_number(obj: &BTreeMap<String, Value>, key: &str, what: &str) -> Result<f64> {
    require_field(obj, key, what)?
        .as_number()
        .ok_or_else(|| Error::format(format!("{what} field {key:?} must be a number")))
}
