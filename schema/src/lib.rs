//! Replicated record layouts for netvar.
//!
//! This crate defines how a replicated record is described on the wire:
//! - The closed set of field shapes ([`FieldKind`])
//! - Ordered record layouts with validation
//! - Deterministic layout hashing
//!
//! # Design Principles
//!
//! - **Explicit layouts** - No reflection on arbitrary Rust types.
//! - **Closed shapes** - Every field shape is a variant matched exhaustively by codecs.
//! - **Deterministic hashing** - Layout hash is stable given the same definition.

mod error;
mod field;
mod hash;
mod layout;

pub use error::{SchemaError, SchemaResult};
pub use field::{ElemKind, FieldDef, FieldKind};
pub use hash::layout_hash;
pub use layout::{Layout, LayoutBuilder};

/// A field ID within a layout.
pub type FieldId = u16;
