//! # Trellis result transport
//!
//! Wire encoding for the Trellis dataframe engine: converts computation
//! results (dense buffers, columnar arrays, scalars, selections, bin grids,
//! categorical dictionaries) into a self-describing envelope and back, so
//! results can cross process boundaries or be persisted.
//!
//! ## Quick Start
//!
//! ```
//! use trellis::prelude::*;
//!
//! let registry = Registry::with_defaults();
//!
//! // Sender: encode a result and flatten it into an envelope.
//! let mut session = Session::new(&registry);
//! let result = Datum::Nd(NdArray::from_vec(vec![1i64, 2, 3]));
//! let encoded = session.encode("evaluate-result", &result)?;
//! let envelope = serialize(&session, &encoded)?;
//!
//! // Receiver: restore the session and decode.
//! let mut session = Session::new(&registry);
//! let data = deserialize(&mut session, &envelope)?;
//! let decoded = session.decode("evaluate-result", &data)?;
//! # assert!(decoded.as_nd().is_some());
//! # Ok::<(), trellis_wire::Error>(())
//! ```
//!
//! ## Crates
//!
//! - [`trellis_core`] - the value model crossing the wire boundary
//! - [`trellis_wire`] - registry, session, codecs, and envelope formats

#![warn(missing_docs)]

pub mod prelude;

pub use trellis_core::{Datum, NdArray, Value};
pub use trellis_wire::{deserialize, serialize, DecodeOptions, Error, Registry, Session};
