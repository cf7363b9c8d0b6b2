//! Codecs for selections, functions, loosely-typed variables, and ordered
//! sets.

use super::{require_field, require_int, require_object, require_str, type_wrapper};
use crate::error::{Error, Result};
use crate::registry::Codec;
use crate::session::{DecodeOptions, Session};
use std::collections::BTreeMap;
use trellis_core::{Datum, Function, OrderedSet, Selection, Value};

/// `selection`: the predicate's own canonical dictionary, or null.
pub struct SelectionCodec;

const SELECTION: &str = "selection";

impl Codec for SelectionCodec {
    fn encode(&self, _session: &mut Session<'_>, value: &Datum) -> Result<Value> {
        match value {
            Datum::Selection(Some(selection)) => Ok(selection.to_spec()),
            Datum::Selection(None) => Ok(Value::Null),
            other => Err(Error::UnsupportedValue {
                tag: SELECTION,
                kind: other.type_name(),
            }),
        }
    }

    fn decode(
        &self,
        _session: &mut Session<'_>,
        spec: &Value,
        _opts: &DecodeOptions,
    ) -> Result<Datum> {
        if spec.is_null() {
            return Ok(Datum::Selection(None));
        }
        Ok(Datum::Selection(Some(Selection::from_spec(spec)?)))
    }
}

/// `function`: delegated entirely to the function-serialization facility.
///
/// Decode is the one place wire data can become something callable, so it
/// demands the trust flag from [`DecodeOptions`] and fails with
/// [`Error::TrustRequired`] when the caller did not state one.
pub struct FunctionCodec;

const FUNCTION: &str = "function";

impl Codec for FunctionCodec {
    fn encode(&self, _session: &mut Session<'_>, value: &Datum) -> Result<Value> {
        match value {
            Datum::Function(Some(function)) => Ok(function.to_spec()),
            Datum::Function(None) => Ok(Value::Null),
            other => Err(Error::UnsupportedValue {
                tag: FUNCTION,
                kind: other.type_name(),
            }),
        }
    }

    fn decode(
        &self,
        _session: &mut Session<'_>,
        spec: &Value,
        opts: &DecodeOptions,
    ) -> Result<Datum> {
        if spec.is_null() {
            return Ok(Datum::Function(None));
        }
        let trust = opts.trusted.ok_or(Error::TrustRequired)?;
        Ok(Datum::Function(Some(Function::from_spec(spec, trust)?)))
    }
}

/// `variable`: loosely-typed named bindings.
///
/// Structured kinds get a `{type, data}` wrapper; raw bytes decode to UTF-8
/// and pass through as a plain string; JSON-safe payloads pass through
/// untouched. Decode dispatches on the presence of the wrapper.
pub struct VariableCodec;

const VARIABLE: &str = "variable";

impl Codec for VariableCodec {
    fn encode(&self, session: &mut Session<'_>, value: &Datum) -> Result<Value> {
        match value {
            Datum::Nd(_) => Ok(type_wrapper(
                "native-array",
                session.encode("native-array", value)?,
            )),
            Datum::Column(_) => Ok(type_wrapper(
                "arrow-array",
                session.encode("arrow-array", value)?,
            )),
            Datum::OrderedSet(_) => Ok(type_wrapper(
                "ordered-set",
                session.encode("ordered-set", value)?,
            )),
            Datum::Scalar(_) => Ok(type_wrapper(
                "numeric-scalar",
                session.encode("numeric-scalar", value)?,
            )),
            Datum::Bytes(bytes) => {
                let text = String::from_utf8(bytes.clone())
                    .map_err(|_| Error::format("variable byte payload is not valid UTF-8"))?;
                Ok(Value::String(text))
            }
            Datum::Json(value) => Ok(value.clone()),
            other => Err(Error::UnsupportedValue {
                tag: VARIABLE,
                kind: other.type_name(),
            }),
        }
    }

    fn decode(
        &self,
        session: &mut Session<'_>,
        spec: &Value,
        opts: &DecodeOptions,
    ) -> Result<Datum> {
        if let Some(obj) = spec.as_object() {
            if let (Some(Value::String(branch)), Some(data)) = (obj.get("type"), obj.get("data")) {
                return session.decode_with(branch, data, opts);
            }
        }
        Ok(Datum::Json(spec.clone()))
    }
}

/// `ordered-set`: categorical dictionaries as `{class, data}` snapshots.
pub struct OrderedSetCodec;

const ORDERED_SET: &str = "ordered-set";

impl Codec for OrderedSetCodec {
    fn encode(&self, _session: &mut Session<'_>, value: &Datum) -> Result<Value> {
        let Datum::OrderedSet(set) = value else {
            return Err(Error::UnsupportedValue {
                tag: ORDERED_SET,
                kind: value.type_name(),
            });
        };
        let values = Value::Array(
            set.snapshot_entries()
                .into_iter()
                .map(|(value, index)| Value::Array(vec![value, Value::Int(index)]))
                .collect(),
        );
        let mut data = BTreeMap::new();
        data.insert("values".to_string(), values);
        data.insert("count".to_string(), Value::Int(set.count()));
        data.insert("nan_count".to_string(), Value::Int(set.nan_count()));
        data.insert("missing_count".to_string(), Value::Int(set.missing_count()));

        let mut obj = BTreeMap::new();
        obj.insert("class".to_string(), Value::from(set.class_name()));
        obj.insert("data".to_string(), Value::Object(data));
        Ok(Value::Object(obj))
    }

    fn decode(
        &self,
        _session: &mut Session<'_>,
        spec: &Value,
        _opts: &DecodeOptions,
    ) -> Result<Datum> {
        let obj = require_object(spec, ORDERED_SET)?;
        let class = require_str(obj, "class", ORDERED_SET)?;
        let data = require_object(require_field(obj, "data", ORDERED_SET)?, ORDERED_SET)?;
        let entries = require_field(data, "values", ORDERED_SET)?
            .as_array()
            .ok_or_else(|| Error::format("ordered-set values must be an array"))?
            .iter()
            .map(|pair| {
                let pair = pair
                    .as_array()
                    .filter(|p| p.len() == 2)
                    .ok_or_else(|| {
                        Error::format("ordered-set entries must be [value, index] pairs")
                    })?;
                let index = pair[1]
                    .as_int()
                    .ok_or_else(|| Error::format("ordered-set entry index must be an integer"))?;
                Ok((pair[0].clone(), index))
            })
            .collect::<Result<Vec<_>>>()?;
        let set = OrderedSet::from_snapshot(
            class,
            entries,
            require_int(data, "count", ORDERED_SET)?,
            require_int(data, "nan_count", ORDERED_SET)?,
            require_int(data, "missing_count", ORDERED_SET)?,
        )?;
        Ok(Datum::OrderedSet(set))
    }
}
