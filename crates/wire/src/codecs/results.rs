//! Result transport codecs: passthrough payloads, dataframe state, and the
//! result tags the remote-execution layer speaks.
//!
//! `task-result` and `rmi-result` are renaming aliases: the former onto
//! `evaluate-result`, the latter onto the plain `json` passthrough. The
//! wire shape of an evaluate result is self-describing by structure: a JSON
//! array means a batched sequence of results, anything else is a single
//! result fed through the `array` codec.

use crate::error::{Error, Result};
use crate::registry::Codec;
use crate::session::{DecodeOptions, Session};
use trellis_core::{Datum, Value};

/// `json`: identity on JSON-safe payloads.
pub struct JsonCodec;

const JSON: &str = "json";

impl Codec for JsonCodec {
    fn encode(&self, _session: &mut Session<'_>, value: &Datum) -> Result<Value> {
        match value {
            Datum::Json(value) => Ok(value.clone()),
            other => Err(Error::UnsupportedValue {
                tag: JSON,
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
        Ok(Datum::Json(spec.clone()))
    }
}

/// `dataframe-state`: opaque state owned by the persistence collaborator,
/// embedded without interpretation.
pub struct DataFrameStateCodec;

const DATAFRAME_STATE: &str = "dataframe-state";

impl Codec for DataFrameStateCodec {
    fn encode(&self, _session: &mut Session<'_>, value: &Datum) -> Result<Value> {
        match value {
            Datum::Json(state) => Ok(state.clone()),
            other => Err(Error::UnsupportedValue {
                tag: DATAFRAME_STATE,
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
        Ok(Datum::Json(spec.clone()))
    }
}

/// `task-result`: alias of `evaluate-result`.
pub struct TaskResultCodec;

impl Codec for TaskResultCodec {
    fn encode(&self, session: &mut Session<'_>, value: &Datum) -> Result<Value> {
        session.encode("evaluate-result", value)
    }

    fn decode(
        &self,
        session: &mut Session<'_>,
        spec: &Value,
        opts: &DecodeOptions,
    ) -> Result<Datum> {
        session.decode_with("evaluate-result", spec, opts)
    }
}

/// `rmi-result`: alias of the `json` passthrough.
pub struct RmiResultCodec;

impl Codec for RmiResultCodec {
    fn encode(&self, session: &mut Session<'_>, value: &Datum) -> Result<Value> {
        session.encode("json", value)
    }

    fn decode(
        &self,
        session: &mut Session<'_>,
        spec: &Value,
        opts: &DecodeOptions,
    ) -> Result<Datum> {
        session.decode_with("json", spec, opts)
    }
}

/// `evaluate-result`: batched outputs map the array codec element-wise,
/// nested batches stay nested; a single output goes through once.
pub struct EvaluateResultCodec;

impl Codec for EvaluateResultCodec {
    fn encode(&self, session: &mut Session<'_>, value: &Datum) -> Result<Value> {
        match value {
            Datum::List(items) => Ok(Value::Array(
                items
                    .iter()
                    .map(|item| self.encode(session, item))
                    .collect::<Result<Vec<_>>>()?,
            )),
            single => session.encode("array", single),
        }
    }

    fn decode(
        &self,
        session: &mut Session<'_>,
        spec: &Value,
        opts: &DecodeOptions,
    ) -> Result<Datum> {
        match spec {
            Value::Array(items) => Ok(Datum::List(
                items
                    .iter()
                    .map(|item| self.decode(session, item, opts))
                    .collect::<Result<Vec<_>>>()?,
            )),
            single => session.decode_with("array", single, opts),
        }
    }
}
