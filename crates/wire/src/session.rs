//! Per-message encoding state: blob store, object tables, and dispatch.
//!
//! A [`Session`] lives for exactly one encode-or-decode of one message. It
//! borrows the (immutable, shared) [`Registry`] and owns everything mutable:
//! the blob store, the write-once object-spec table, and the decode-side
//! object cache. Codecs recurse through the session's `encode`/`decode`
//! methods rather than calling each other directly.
//!
//! Sessions are not shareable across threads while in use; callers encoding
//! messages in parallel create one session per message. A session in which
//! decode failed partway is poisoned and must be discarded.

use crate::error::{Error, Result};
use crate::registry::Registry;
use std::collections::{BTreeMap, HashMap};
use tracing::trace;
use trellis_core::{Datum, Trust, Value};
use uuid::Uuid;

/// Prefix that turns a blob id into a reference string.
const BLOB_PREFIX: &str = "blob:";

/// Codec-specific decode options.
///
/// The only option today is the trust flag consumed by the function codec.
/// It has no default on purpose: the single decode path that can materialize
/// executable payloads fails with [`Error::TrustRequired`] unless the caller
/// states a [`Trust`] explicitly.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// Whether wire-supplied function payloads may be materialized.
    pub trusted: Option<Trust>,
}

impl DecodeOptions {
    /// Options with the trust flag set.
    pub fn trusted(trust: Trust) -> DecodeOptions {
        DecodeOptions {
            trusted: Some(trust),
        }
    }
}

/// One message's encoding or decoding state.
pub struct Session<'r> {
    registry: &'r Registry,
    /// Blobs in registration order; order defines binary envelope layout.
    blobs: Vec<(String, Vec<u8>)>,
    blob_index: HashMap<String, usize>,
    object_specs: BTreeMap<String, Value>,
    objects: HashMap<String, Datum>,
}

impl<'r> Session<'r> {
    /// A fresh session over a registry.
    pub fn new(registry: &'r Registry) -> Session<'r> {
        Session {
            registry,
            blobs: Vec::new(),
            blob_index: HashMap::new(),
            object_specs: BTreeMap::new(),
            objects: HashMap::new(),
        }
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    /// Encode one value through the codec registered for `tag`.
    pub fn encode(&mut self, tag: &str, value: &Datum) -> Result<Value> {
        let registry = self.registry;
        let codec = registry.lookup(tag)?;
        codec.encode(self, value)
    }

    /// Encode an ordered sequence, order-preserving.
    pub fn encode_list(&mut self, tag: &str, values: &[Datum]) -> Result<Vec<Value>> {
        values.iter().map(|value| self.encode(tag, value)).collect()
    }

    /// Encode a sequence of sequences, order-preserving at both levels.
    pub fn encode_list2(&mut self, tag: &str, values: &[Vec<Datum>]) -> Result<Vec<Vec<Value>>> {
        values
            .iter()
            .map(|inner| self.encode_list(tag, inner))
            .collect()
    }

    /// Encode a keyed mapping, preserving keys.
    pub fn encode_dict(
        &mut self,
        tag: &str,
        values: &BTreeMap<String, Datum>,
    ) -> Result<BTreeMap<String, Value>> {
        values
            .iter()
            .map(|(key, value)| Ok((key.clone(), self.encode(tag, value)?)))
            .collect()
    }

    /// Decode one spec through the codec registered for `tag`, with default
    /// options.
    pub fn decode(&mut self, tag: &str, spec: &Value) -> Result<Datum> {
        self.decode_with(tag, spec, &DecodeOptions::default())
    }

    /// Decode one spec with explicit codec options.
    pub fn decode_with(&mut self, tag: &str, spec: &Value, opts: &DecodeOptions) -> Result<Datum> {
        let registry = self.registry;
        let codec = registry.lookup(tag)?;
        codec.decode(self, spec, opts)
    }

    /// Decode an ordered sequence, order-preserving.
    pub fn decode_list(
        &mut self,
        tag: &str,
        specs: &[Value],
        opts: &DecodeOptions,
    ) -> Result<Vec<Datum>> {
        specs
            .iter()
            .map(|spec| self.decode_with(tag, spec, opts))
            .collect()
    }

    /// Decode a sequence of sequences, order-preserving at both levels.
    pub fn decode_list2(
        &mut self,
        tag: &str,
        specs: &[Value],
        opts: &DecodeOptions,
    ) -> Result<Vec<Vec<Datum>>> {
        specs
            .iter()
            .map(|spec| {
                let inner = spec
                    .as_array()
                    .ok_or_else(|| Error::format("nested list spec must be an array"))?;
                self.decode_list(tag, inner, opts)
            })
            .collect()
    }

    /// Decode a keyed mapping, preserving keys.
    pub fn decode_dict(
        &mut self,
        tag: &str,
        specs: &BTreeMap<String, Value>,
        opts: &DecodeOptions,
    ) -> Result<BTreeMap<String, Datum>> {
        specs
            .iter()
            .map(|(key, spec)| Ok((key.clone(), self.decode_with(tag, spec, opts)?)))
            .collect()
    }

    // ------------------------------------------------------------------
    // Blob store
    // ------------------------------------------------------------------

    /// Copy `bytes` into the session and return a fresh reference.
    ///
    /// The caller keeps ownership of its buffer. Ids are never reused and
    /// never content-addressed: identical bytes added twice yield two
    /// independent references.
    pub fn add_blob(&mut self, bytes: &[u8]) -> String {
        let id = Uuid::new_v4().to_string();
        trace!(blob = %id, len = bytes.len(), "registering blob");
        self.blob_index.insert(id.clone(), self.blobs.len());
        self.blobs.push((id.clone(), bytes.to_vec()));
        format!("{BLOB_PREFIX}{id}")
    }

    /// Resolve a `blob:<id>` reference produced by this session.
    pub fn get_blob(&self, reference: &str) -> Result<&[u8]> {
        let id = reference
            .strip_prefix(BLOB_PREFIX)
            .ok_or_else(|| Error::reference(reference))?;
        let index = self
            .blob_index
            .get(id)
            .ok_or_else(|| Error::reference(reference))?;
        Ok(&self.blobs[*index].1)
    }

    /// Number of blobs registered so far.
    pub fn blob_count(&self) -> usize {
        self.blobs.len()
    }

    // ------------------------------------------------------------------
    // Shared object specs (encode side) and objects (decode side)
    // ------------------------------------------------------------------

    /// Store an encoded form under an id for by-reference sharing.
    ///
    /// # Panics
    ///
    /// Panics if `id` was already written: object-spec ids are write-once.
    pub fn set_object_spec(&mut self, id: &str, spec: Value) {
        assert!(
            !self.object_specs.contains_key(id),
            "object spec id {id:?} written twice"
        );
        self.object_specs.insert(id.to_string(), spec);
    }

    /// Fetch a shared encoded form by id.
    pub fn get_object_spec(&self, id: &str) -> Result<&Value> {
        self.object_specs
            .get(id)
            .ok_or_else(|| Error::reference(id))
    }

    /// True when `id` has a stored encoded form.
    pub fn has_object_spec(&self, id: &str) -> bool {
        self.object_specs.contains_key(id)
    }

    /// Cache a decoded value under an id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was already written: object ids are write-once.
    pub fn set_object(&mut self, id: &str, value: Datum) {
        assert!(
            !self.objects.contains_key(id),
            "object id {id:?} written twice"
        );
        self.objects.insert(id.to_string(), value);
    }

    /// Fetch a cached decoded value by id.
    pub fn get_object(&self, id: &str) -> Result<&Datum> {
        self.objects.get(id).ok_or_else(|| Error::reference(id))
    }

    /// True when `id` has a cached decoded value.
    pub fn has_object(&self, id: &str) -> bool {
        self.objects.contains_key(id)
    }

    // ------------------------------------------------------------------
    // Envelope access
    // ------------------------------------------------------------------

    /// Blobs in registration order, for envelope serialization.
    pub(crate) fn blob_entries(&self) -> &[(String, Vec<u8>)] {
        &self.blobs
    }

    /// The object-spec table, for envelope serialization.
    pub(crate) fn object_specs(&self) -> &BTreeMap<String, Value> {
        &self.object_specs
    }

    /// Replace blob store and object-spec table wholesale from an envelope.
    pub(crate) fn restore(
        &mut self,
        blobs: Vec<(String, Vec<u8>)>,
        object_specs: BTreeMap<String, Value>,
    ) {
        self.blob_index = blobs
            .iter()
            .enumerate()
            .map(|(index, (id, _))| (id.clone(), index))
            .collect();
        self.blobs = blobs;
        self.object_specs = object_specs;
        self.objects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_registry() -> Registry {
        Registry::new()
    }

    #[test]
    fn test_add_and_get_blob() {
        let registry = empty_registry();
        let mut session = Session::new(&registry);
        let reference = session.add_blob(b"payload");
        assert!(reference.starts_with("blob:"));
        assert_eq!(session.get_blob(&reference).unwrap(), b"payload");
    }

    #[test]
    fn test_identical_content_gets_distinct_references() {
        let registry = empty_registry();
        let mut session = Session::new(&registry);
        let first = session.add_blob(b"same");
        let second = session.add_blob(b"same");
        assert_ne!(first, second);
        assert_eq!(session.get_blob(&first).unwrap(), b"same");
        assert_eq!(session.get_blob(&second).unwrap(), b"same");
        assert_eq!(session.blob_count(), 2);
    }

    #[test]
    fn test_get_blob_requires_prefix() {
        let registry = empty_registry();
        let mut session = Session::new(&registry);
        let reference = session.add_blob(b"x");
        let bare_id = reference.strip_prefix("blob:").unwrap().to_string();
        let err = session.get_blob(&bare_id).unwrap_err();
        assert!(matches!(err, Error::Reference { .. }));
    }

    #[test]
    fn test_get_blob_unknown_id_fails() {
        let registry = empty_registry();
        let session = Session::new(&registry);
        let err = session.get_blob("blob:not-a-real-id").unwrap_err();
        assert!(matches!(err, Error::Reference { .. }));
    }

    #[test]
    fn test_object_specs_store_and_fetch() {
        let registry = empty_registry();
        let mut session = Session::new(&registry);
        assert!(!session.has_object_spec("state-1"));
        session.set_object_spec("state-1", Value::from("payload"));
        assert!(session.has_object_spec("state-1"));
        assert_eq!(
            session.get_object_spec("state-1").unwrap(),
            &Value::from("payload")
        );
        assert!(matches!(
            session.get_object_spec("state-2").unwrap_err(),
            Error::Reference { .. }
        ));
    }

    #[test]
    #[should_panic(expected = "written twice")]
    fn test_object_spec_is_write_once() {
        let registry = empty_registry();
        let mut session = Session::new(&registry);
        session.set_object_spec("id", Value::Null);
        session.set_object_spec("id", Value::Null);
    }

    #[test]
    #[should_panic(expected = "written twice")]
    fn test_object_is_write_once() {
        let registry = empty_registry();
        let mut session = Session::new(&registry);
        session.set_object("id", Datum::Json(Value::Null));
        session.set_object("id", Datum::Json(Value::Null));
    }

    #[test]
    fn test_list_and_dict_mapping_preserve_structure() {
        use trellis_core::Datum;

        let registry = Registry::with_defaults();
        let mut session = Session::new(&registry);
        let values = vec![
            Datum::Json(Value::Int(1)),
            Datum::Json(Value::from("two")),
        ];
        let encoded = session.encode_list("json", &values).unwrap();
        assert_eq!(encoded, vec![Value::Int(1), Value::from("two")]);

        let decoded = session
            .decode_list("json", &encoded, &DecodeOptions::default())
            .unwrap();
        assert_eq!(decoded.len(), 2);

        let nested = vec![vec![Datum::Json(Value::Int(3))], vec![]];
        let encoded2 = session.encode_list2("json", &nested).unwrap();
        assert_eq!(encoded2, vec![vec![Value::Int(3)], vec![]]);
        let respecs: Vec<Value> = encoded2.into_iter().map(Value::Array).collect();
        let decoded2 = session
            .decode_list2("json", &respecs, &DecodeOptions::default())
            .unwrap();
        assert_eq!(decoded2[0].len(), 1);
        assert!(decoded2[1].is_empty());

        let mut mapping = BTreeMap::new();
        mapping.insert("limit".to_string(), Datum::Json(Value::Int(10)));
        let encoded3 = session.encode_dict("json", &mapping).unwrap();
        assert_eq!(encoded3.get("limit"), Some(&Value::Int(10)));
        let decoded3 = session
            .decode_dict("json", &encoded3, &DecodeOptions::default())
            .unwrap();
        assert!(decoded3.contains_key("limit"));
    }

    #[test]
    fn test_restore_replaces_state_wholesale() {
        let registry = empty_registry();
        let mut session = Session::new(&registry);
        let stale = session.add_blob(b"stale");
        session.set_object_spec("old", Value::Null);

        let mut specs = BTreeMap::new();
        specs.insert("new".to_string(), Value::Int(1));
        session.restore(vec![("fresh-id".to_string(), b"fresh".to_vec())], specs);

        assert!(session.get_blob(&stale).is_err());
        assert_eq!(session.get_blob("blob:fresh-id").unwrap(), b"fresh");
        assert!(!session.has_object_spec("old"));
        assert!(session.has_object_spec("new"));
    }
}
