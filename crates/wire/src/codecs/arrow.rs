//! Codec for columnar arrays via the Arrow IPC stream format.
//!
//! A single array is wrapped as a one-column batch and written through the
//! IPC stream writer into exactly one blob. Decode accepts the current
//! `arrow-ipc-blob` key and, for envelopes written before the stream format
//! became the only serialization, the legacy `arrow-serialized-blob` key,
//! reading both through the same stream reader.

use super::require_object;
use crate::error::{Error, Result};
use crate::registry::Codec;
use crate::session::{DecodeOptions, Session};
use arrow_array::{new_empty_array, Array, RecordBatch};
use arrow_ipc::reader::StreamReader;
use arrow_ipc::writer::StreamWriter;
use arrow_schema::{Field, Schema};
use arrow_select::concat::concat;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;
use trellis_core::{Datum, Value};

const ARROW_ARRAY: &str = "arrow-array";

/// Current wire key: an IPC stream blob.
const IPC_KEY: &str = "arrow-ipc-blob";
/// Key used by envelopes from before the IPC stream format was adopted.
const LEGACY_KEY: &str = "arrow-serialized-blob";

/// Column name used for the single-column wrapper batch.
const COLUMN: &str = "x";

/// `arrow-array`: one columnar array per spec, one blob per array.
pub struct ArrowArrayCodec;

impl Codec for ArrowArrayCodec {
    fn encode(&self, session: &mut Session<'_>, value: &Datum) -> Result<Value> {
        let Datum::Column(array) = value else {
            return Err(Error::UnsupportedValue {
                tag: ARROW_ARRAY,
                kind: value.type_name(),
            });
        };
        let field = Field::new(COLUMN, array.data_type().clone(), true);
        let schema = Arc::new(Schema::new(vec![field]));
        let batch = RecordBatch::try_new(schema.clone(), vec![array.clone()])?;

        let mut writer = StreamWriter::try_new(Vec::new(), schema.as_ref())?;
        writer.write(&batch)?;
        writer.finish()?;
        let buffer = writer.into_inner()?;

        let mut obj = BTreeMap::new();
        obj.insert(IPC_KEY.to_string(), Value::String(session.add_blob(&buffer)));
        Ok(Value::Object(obj))
    }

    fn decode(
        &self,
        session: &mut Session<'_>,
        spec: &Value,
        _opts: &DecodeOptions,
    ) -> Result<Datum> {
        let obj = require_object(spec, ARROW_ARRAY)?;
        let reference = obj
            .get(IPC_KEY)
            .or_else(|| obj.get(LEGACY_KEY))
            .ok_or_else(|| {
                Error::format(format!(
                    "arrow-array spec carries neither {IPC_KEY:?} nor {LEGACY_KEY:?}"
                ))
            })?
            .as_str()
            .ok_or_else(|| Error::format("arrow-array blob key must be a reference string"))?;
        let blob = session.get_blob(reference)?.to_vec();

        let reader = StreamReader::try_new(Cursor::new(blob), None)?;
        let schema = reader.schema();
        if schema.fields().len() != 1 {
            return Err(Error::format(format!(
                "arrow-array stream must hold exactly one column, found {}",
                schema.fields().len()
            )));
        }

        let mut batches = Vec::new();
        for batch in reader {
            batches.push(batch?);
        }
        let array = match batches.len() {
            // An exhausted stream still names its column type.
            0 => new_empty_array(schema.field(0).data_type()),
            1 => batches[0].column(0).clone(),
            _ => {
                let columns: Vec<&dyn Array> =
                    batches.iter().map(|batch| batch.column(0).as_ref()).collect();
                concat(&columns)?
            }
        };
        Ok(Datum::Column(array))
    }
}
