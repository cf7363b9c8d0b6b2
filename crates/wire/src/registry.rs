//! Type-tag → codec dispatch table.
//!
//! The registry is built once at process start, before the first session is
//! created, and is immutable afterwards: sessions borrow it read-only, so one
//! registry serves any number of concurrent sessions. Registering the same
//! tag twice is a startup-time programming error and panics immediately.

use crate::error::{Error, Result};
use crate::session::{DecodeOptions, Session};
use std::collections::HashMap;
use trellis_core::{Datum, Value};

/// One type tag's paired encode/decode functions.
///
/// Codecs are stateless; everything mutable lives in the [`Session`] they
/// receive, which is also how they recurse into other codecs.
pub trait Codec: Send + Sync {
    /// Encode `value` into its JSON-shaped form, registering blobs on the
    /// session as needed.
    fn encode(&self, session: &mut Session<'_>, value: &Datum) -> Result<Value>;

    /// Decode `spec` back into a value, resolving blob references through
    /// the session.
    fn decode(&self, session: &mut Session<'_>, spec: &Value, opts: &DecodeOptions)
        -> Result<Datum>;
}

/// The static tag → codec table.
pub struct Registry {
    codecs: HashMap<String, Box<dyn Codec>>,
}

impl Registry {
    /// An empty registry, for callers composing their own codec set.
    pub fn new() -> Registry {
        Registry {
            codecs: HashMap::new(),
        }
    }

    /// A registry with every built-in codec registered.
    pub fn with_defaults() -> Registry {
        let mut registry = Registry::new();
        crate::codecs::register_defaults(&mut registry);
        registry
    }

    /// Insert a codec under `tag`.
    ///
    /// # Panics
    ///
    /// Panics if `tag` is already registered. Registration happens once at
    /// startup; a duplicate is a bug, not a condition to recover from.
    pub fn register(&mut self, tag: impl Into<String>, codec: Box<dyn Codec>) {
        let tag = tag.into();
        assert!(
            !self.codecs.contains_key(&tag),
            "codec already registered for tag {tag:?}"
        );
        self.codecs.insert(tag, codec);
    }

    /// Look up the codec for `tag`.
    pub fn lookup(&self, tag: &str) -> Result<&dyn Codec> {
        self.codecs
            .get(tag)
            .map(|codec| codec.as_ref())
            .ok_or_else(|| Error::UnknownType {
                tag: tag.to_string(),
            })
    }

    /// Registered tag count.
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// True when no codecs are registered.
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Registry {
        Registry::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullCodec;

    impl Codec for NullCodec {
        fn encode(&self, _session: &mut Session<'_>, _value: &Datum) -> Result<Value> {
            Ok(Value::Null)
        }

        fn decode(
            &self,
            _session: &mut Session<'_>,
            _spec: &Value,
            _opts: &DecodeOptions,
        ) -> Result<Datum> {
            Ok(Datum::Json(Value::Null))
        }
    }

    #[test]
    fn test_lookup_unknown_tag_fails() {
        let registry = Registry::new();
        let err = registry.lookup("nope").unwrap_err();
        assert!(matches!(err, Error::UnknownType { tag } if tag == "nope"));
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_duplicate_registration_panics() {
        let mut registry = Registry::new();
        registry.register("thing", Box::new(NullCodec));
        registry.register("thing", Box::new(NullCodec));
    }

    #[test]
    fn test_defaults_cover_builtin_tags() {
        let registry = Registry::with_defaults();
        for tag in [
            "json",
            "array",
            "native-array",
            "arrow-array",
            "numeric-scalar",
            "dtype",
            "selection",
            "function",
            "variable",
            "binner",
            "grid",
            "ordered-set",
            "dataframe-state",
            "task-result",
            "rmi-result",
            "evaluate-result",
        ] {
            assert!(registry.lookup(tag).is_ok(), "missing builtin tag {tag}");
        }
    }
}
