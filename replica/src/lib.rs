//! Dirty-tracked replicated values for netvar.
//!
//! This crate wraps values implementing [`codec::DeltaSerde`] with the state a
//! replication scheduler needs:
//! - Dirty flag, last-sent time and min/max send intervals
//! - Read/write permission policies keyed by [`ClientId`]
//! - A snapshot of what the remote side holds, so only deltas are sent
//! - Grouped delta messages over type-erased [`NetworkVariable`]s
//!
//! # Design Principles
//!
//! - **Reject before mutate** - Permission checks run before the value or its flags change.
//! - **Atomic reads** - A failed read leaves value, snapshot and dirty flag untouched.
//! - **Caller-supplied time** - No clock is read internally; callers pass `now`.
//!
//! # Example
//!
//! ```
//! use std::time::Instant;
//!
//! use bitstream::{BitBuffer, BitReader};
//! use replica::{ClientId, DirtyValue};
//!
//! let mut server = DirtyValue::new(vec![0u32; 8]);
//! let mut client = DirtyValue::new(vec![0u32; 8]);
//!
//! server.modify(ClientId::SERVER, |v| v[2] = 40).unwrap();
//! assert!(server.should_send(Instant::now()));
//!
//! let mut buffer = BitBuffer::new();
//! server.sync(&mut buffer, Instant::now()).unwrap();
//! client.read_delta(&mut BitReader::new(buffer.as_bytes()), false).unwrap();
//! assert_eq!(client.value(), server.value());
//! ```

mod config;
mod dirty;
mod error;
mod group;
mod permission;

pub use config::{UpdateTraits, VarSettings};
pub use dirty::DirtyValue;
pub use error::{ReplicaError, ReplicaResult};
pub use group::{read_dirty_group, write_dirty_group, NetworkVariable};
pub use permission::{ClientId, PermissionCheck, ReadPermission, WritePermission};
