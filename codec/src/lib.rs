//! Delta and record encoding for netvar.
//!
//! This crate ties together bitstream, wire, and schema to serialize only the
//! changed part of a replicated value relative to a state the receiver holds.
//!
//! # Features
//!
//! - [`DeltaSerde`] for scalars, sequences, sets and maps
//! - Change-bitmask deltas for `Vec<E>` and `[E; N]`
//! - Added/removed deltas for sets, added/removed/changed deltas for maps
//! - Full-rewrite fallback whenever the delta would not be smaller
//! - Layout-driven records over the closed [`FieldValue`] shape set
//!
//! # Design Principles
//!
//! - **Correctness first** - Applying a delta to the exact pre-image reproduces the post-image.
//! - **Atomic decode** - A failed delta leaves the receiving value untouched.
//! - **Deterministic** - Same inputs produce same outputs (ordered collections).
//!
//! # Example
//!
//! ```
//! use codec::{apply_delta, encode_delta, DELTA_MARKER};
//!
//! let previous = vec![1i32, 2, 3, 4, 5];
//! let current = vec![1i32, 9, 3, 4, 9];
//! let bytes = encode_delta(&current, &previous).unwrap();
//! assert_eq!(bytes[0], DELTA_MARKER);
//!
//! let mut received = previous.clone();
//! apply_delta(&mut received, &bytes).unwrap();
//! assert_eq!(received, current);
//! ```

mod delta;
mod error;
mod map;
mod scratch;
mod sequence;
mod set;
mod value;

pub use delta::{apply_delta, encode_delta, DeltaSerde, DELTA_MARKER, FULL_MARKER};
pub use error::{CodecError, CodecResult};
pub use scratch::DeltaScratch;
pub use value::{
    decode_record, encode_record, read_record, read_value, write_record, write_value, FieldValue,
};
