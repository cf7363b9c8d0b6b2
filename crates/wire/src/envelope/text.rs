//! Human-readable text envelope: `{"data": ..., "blobs": {id: base64}}`.
//!
//! Logically identical to the binary envelope but with blobs inlined as
//! base64 text. Larger, no offset header; JSON framing is the integrity
//! check. Used for debugging and interchange with tools that cannot read
//! the binary layout.

use crate::error::{Error, Result};
use crate::session::Session;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::collections::BTreeMap;
use tracing::debug;
use trellis_core::Value;

/// Serialize a session's blobs plus the root encoded form into JSON text.
pub fn serialize(session: &Session<'_>, data: &Value) -> Result<String> {
    let mut blobs = BTreeMap::new();
    for (id, bytes) in session.blob_entries() {
        blobs.insert(id.clone(), Value::String(STANDARD.encode(bytes)));
    }
    let mut document = BTreeMap::new();
    document.insert("data".to_string(), data.clone());
    document.insert("blobs".to_string(), Value::Object(blobs));
    let text = serde_json::to_string(&Value::Object(document))?;
    debug!(bytes = text.len(), "serialized text envelope");
    Ok(text)
}

/// Restore session blobs from JSON text and return the root encoded form.
///
/// The session's blob store is replaced wholesale; the text envelope does
/// not carry an object-spec table.
pub fn deserialize(session: &mut Session<'_>, text: &str) -> Result<Value> {
    let document: Value = serde_json::from_str(text)?;
    let obj = document
        .as_object()
        .ok_or_else(|| Error::format("text envelope must be a JSON object"))?;
    let data = obj
        .get("data")
        .ok_or_else(|| Error::format("text envelope is missing \"data\""))?
        .clone();
    let blobs = obj
        .get("blobs")
        .and_then(Value::as_object)
        .ok_or_else(|| Error::format("text envelope is missing \"blobs\""))?;
    let restored = blobs
        .iter()
        .map(|(id, encoded)| {
            let encoded = encoded
                .as_str()
                .ok_or_else(|| Error::format("text envelope blobs must be base64 strings"))?;
            Ok((id.clone(), STANDARD.decode(encoded)?))
        })
        .collect::<Result<Vec<_>>>()?;
    session.restore(restored, BTreeMap::new());
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    #[test]
    fn test_roundtrip_with_blobs() {
        let registry = Registry::new();
        let mut session = Session::new(&registry);
        let reference = session.add_blob(&[0u8, 1, 254, 255]);
        let root = Value::from(reference.clone());

        let text = serialize(&session, &root).unwrap();
        let mut fresh = Session::new(&registry);
        let data = deserialize(&mut fresh, &text).unwrap();
        assert_eq!(data, root);
        assert_eq!(fresh.get_blob(&reference).unwrap(), &[0u8, 1, 254, 255]);
    }

    #[test]
    fn test_output_is_plain_json() {
        let registry = Registry::new();
        let mut session = Session::new(&registry);
        session.add_blob(b"Hello");
        let text = serialize(&session, &Value::Null).unwrap();
        assert!(text.contains("\"blobs\""));
        assert!(text.contains("SGVsbG8="));
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let registry = Registry::new();
        let mut session = Session::new(&registry);
        let err = deserialize(
            &mut session,
            r#"{"data":null,"blobs":{"id":"!!not base64!!"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Base64(_)));
    }

    #[test]
    fn test_missing_keys_rejected() {
        let registry = Registry::new();
        let mut session = Session::new(&registry);
        assert!(matches!(
            deserialize(&mut session, r#"{"data":null}"#).unwrap_err(),
            Error::Format { .. }
        ));
        assert!(matches!(
            deserialize(&mut session, r#"{"blobs":{}}"#).unwrap_err(),
            Error::Format { .. }
        ));
    }
}
