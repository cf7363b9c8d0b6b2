//! Envelope serializers: the output boundary of the wire subsystem.
//!
//! An envelope is the serialized form of one session plus its root encoded
//! form. Two serializations exist:
//!
//! - [`binary`]: a compact buffer with a fixed-width offset header, the
//!   default for transport and persistence
//! - [`text`]: a debuggable JSON document with base64-inlined blobs
//!
//! The crate-level [`serialize`]/[`deserialize`] are the binary form.

pub mod binary;
pub mod text;

pub use binary::{deserialize, serialize};
