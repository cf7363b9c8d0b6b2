//! Envelope-level behavior: integrity checks, blob identity, and backward
//! compatibility with the legacy columnar key.

use std::collections::BTreeMap;
use trellis::prelude::*;
use trellis_wire::Error;

#[test]
fn corrupting_header_offsets_fails_decode() {
    let registry = Registry::with_defaults();
    let mut session = Session::new(&registry);
    let array = NdArray::from_vec(vec![1i64, 2, 3]);
    let encoded = session.encode("task-result", &Datum::Nd(array)).unwrap();
    let envelope = serialize(&session, &encoded).unwrap();

    // Envelope holds the metadata blob plus one values blob: count word
    // followed by three offset words.
    for word in 1..=3 {
        let mut corrupted = envelope.clone();
        corrupted[8 * word + 7] ^= 0x40;
        let mut fresh = Session::new(&registry);
        let result = deserialize(&mut fresh, &corrupted);
        assert!(
            matches!(result, Err(Error::Format { .. })),
            "corrupted offset word {word} decoded anyway"
        );
    }
}

#[test]
fn truncated_envelope_fails_decode() {
    let registry = Registry::with_defaults();
    let mut session = Session::new(&registry);
    let encoded = session
        .encode("evaluate-result", &Datum::Nd(NdArray::from_vec(vec![9f32])))
        .unwrap();
    let envelope = serialize(&session, &encoded).unwrap();

    let mut fresh = Session::new(&registry);
    let result = deserialize(&mut fresh, &envelope[..envelope.len() - 3]);
    assert!(matches!(result, Err(Error::Format { .. })));
}

#[test]
fn identical_arrays_get_independent_blobs() {
    let registry = Registry::with_defaults();
    let mut session = Session::new(&registry);
    let array = NdArray::from_vec(vec![7u8, 7, 7]);
    let first = session.encode("native-array", &Datum::Nd(array.clone())).unwrap();
    let second = session.encode("native-array", &Datum::Nd(array)).unwrap();

    let first_ref = first.get("values").and_then(Value::as_str).unwrap();
    let second_ref = second.get("values").and_then(Value::as_str).unwrap();
    assert_ne!(first_ref, second_ref);
    assert_eq!(session.get_blob(first_ref).unwrap(), session.get_blob(second_ref).unwrap());
}

#[test]
fn empty_array_blob_survives_envelope() {
    let registry = Registry::with_defaults();
    let mut session = Session::new(&registry);
    let empty = NdArray::from_vec(Vec::<i32>::new());
    let encoded = session.encode("native-array", &Datum::Nd(empty.clone())).unwrap();
    let envelope = serialize(&session, &encoded).unwrap();

    let mut fresh = Session::new(&registry);
    let data = deserialize(&mut fresh, &envelope).unwrap();
    match fresh.decode("native-array", &data).unwrap() {
        Datum::Nd(decoded) => {
            assert_eq!(decoded, empty);
            assert!(decoded.is_empty());
        }
        other => panic!("expected dense array, got {other:?}"),
    }
}

#[test]
fn legacy_columnar_key_decodes_from_envelope() {
    use arrow_array::{Array, ArrayRef, Int32Array};
    use std::sync::Arc;

    let registry = Registry::with_defaults();
    let column: ArrayRef = Arc::new(Int32Array::from(vec![1, 2, 3]));

    // Produce a fresh envelope, then rewrite its spec under the key an older
    // envelope generation would have used.
    let mut session = Session::new(&registry);
    let encoded = session.encode("arrow-array", &Datum::Column(column.clone())).unwrap();
    let reference = encoded.get("arrow-ipc-blob").unwrap().clone();
    let mut legacy_spec = BTreeMap::new();
    legacy_spec.insert("arrow-serialized-blob".to_string(), reference);
    let envelope = serialize(&session, &Value::Object(legacy_spec)).unwrap();

    let mut fresh = Session::new(&registry);
    let data = deserialize(&mut fresh, &envelope).unwrap();
    match fresh.decode("arrow-array", &data).unwrap() {
        Datum::Column(decoded) => assert_eq!(decoded.to_data(), column.to_data()),
        other => panic!("expected column, got {other:?}"),
    }
}

#[test]
fn fresh_envelopes_use_only_the_current_columnar_key() {
    use arrow_array::{ArrayRef, Int32Array};
    use std::sync::Arc;

    let registry = Registry::with_defaults();
    let mut session = Session::new(&registry);
    let column: ArrayRef = Arc::new(Int32Array::from(vec![1]));
    let encoded = session.encode("arrow-array", &Datum::Column(column)).unwrap();
    let obj = encoded.as_object().unwrap();
    assert!(obj.contains_key("arrow-ipc-blob"));
    assert!(!obj.contains_key("arrow-serialized-blob"));
}
