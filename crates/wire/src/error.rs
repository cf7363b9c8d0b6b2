//! Error taxonomy for wire encoding and decoding.
//!
//! Every failure surfaces synchronously to the direct caller of
//! encode/decode/serialize/deserialize; these are deterministic pure
//! transforms, so there is nothing to retry. A session in which decode
//! failed partway is poisoned and must be discarded.
//!
//! Duplicate codec registration and duplicate object-spec ids are
//! programming errors, not runtime conditions: they panic at the call site
//! instead of appearing here.

use arrow_schema::ArrowError;
use thiserror::Error;
use trellis_core::{
    ArrayError, BinnerError, DTypeParseError, FunctionError, SelectionError, SetError,
};

/// Result alias for wire operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while encoding, decoding, or (de)serializing.
#[derive(Debug, Error)]
pub enum Error {
    /// The type tag is absent from the registry.
    #[error("unknown type tag: {tag:?}")]
    UnknownType {
        /// The tag that was looked up.
        tag: String,
    },

    /// No codec branch matches the value's kind.
    #[error("codec {tag:?} does not support {kind} values")]
    UnsupportedValue {
        /// The codec's type tag.
        tag: &'static str,
        /// The rejected datum variant.
        kind: &'static str,
    },

    /// Envelope or spec integrity violated.
    #[error("malformed wire data: {reason}")]
    Format {
        /// What was wrong.
        reason: String,
    },

    /// A blob or object-spec reference is malformed or unknown to this session.
    #[error("unknown or malformed reference: {reference:?}")]
    Reference {
        /// The offending reference string.
        reference: String,
    },

    /// Function decode was reached without an explicit trust flag.
    #[error("function decode requires an explicit trust flag")]
    TrustRequired,

    /// Element-type descriptor failed to parse.
    #[error(transparent)]
    DType(#[from] DTypeParseError),

    /// Dense-array construction failed.
    #[error(transparent)]
    Array(#[from] ArrayError),

    /// Selection factory failure.
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// Function factory failure (includes the untrusted refusal).
    #[error(transparent)]
    Function(#[from] FunctionError),

    /// Binner factory failure.
    #[error(transparent)]
    Binner(#[from] BinnerError),

    /// Ordered-set catalog failure.
    #[error(transparent)]
    Set(#[from] SetError),

    /// Metadata document could not be read or written.
    #[error("metadata document: {0}")]
    Json(#[from] serde_json::Error),

    /// Columnar serialization failure.
    #[error("arrow: {0}")]
    Arrow(#[from] ArrowError),

    /// Inline blob base64 failure.
    #[error("base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl Error {
    /// Shorthand for a [`Error::Format`] with a formatted reason.
    pub(crate) fn format(reason: impl Into<String>) -> Error {
        Error::Format {
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`Error::Reference`].
    pub(crate) fn reference(reference: impl Into<String>) -> Error {
        Error::Reference {
            reference: reference.into(),
        }
    }
}
