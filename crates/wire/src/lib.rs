//! Wire encoding for Trellis results.
//!
//! This crate turns in-memory computation results into a transport-agnostic
//! wire representation and back. It has three layers:
//!
//! - a [`Registry`] mapping type tags to [`Codec`]s, built once at process
//!   start and shared read-only across sessions;
//! - a per-message [`Session`] owning the blob store and shared-object
//!   tables, through which codecs recurse;
//! - the [`envelope`] serializers flattening session state into bytes
//!   (binary, the default) or text (JSON with inlined blobs).
//!
//! ## Example
//!
//! ```
//! use trellis_core::{Datum, NdArray};
//! use trellis_wire::{deserialize, serialize, Registry, Session};
//!
//! let registry = Registry::with_defaults();
//!
//! // Encode: one session per message.
//! let mut session = Session::new(&registry);
//! let array = NdArray::from_vec(vec![1i64, 2, 3]);
//! let encoded = session.encode("task-result", &Datum::Nd(array)).unwrap();
//! let envelope = serialize(&session, &encoded).unwrap();
//!
//! // Decode: a fresh session on the receiving side.
//! let mut session = Session::new(&registry);
//! let data = deserialize(&mut session, &envelope).unwrap();
//! let result = session.decode("task-result", &data).unwrap();
//! assert_eq!(result.as_nd().unwrap().to_vec::<i64>().unwrap(), vec![1, 2, 3]);
//! ```
//!
//! Encoding and decoding are synchronous, single-threaded, pure in-memory
//! transforms; callers needing parallelism create one session per message.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codecs;
pub mod envelope;
mod error;
mod registry;
mod session;

pub use envelope::{deserialize, serialize};
pub use error::{Error, Result};
pub use registry::{Codec, Registry};
pub use session::{DecodeOptions, Session};
