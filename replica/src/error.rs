//! Error types for replicated values.

use bitstream::BitError;
use codec::CodecError;
use thiserror::Error;
use wire::WireError;

use crate::ClientId;

/// Result type for replication operations.
pub type ReplicaResult<T> = Result<T, ReplicaError>;

/// Errors that can occur while mutating or synchronizing replicated values.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ReplicaError {
    /// The caller may not write this value. Nothing was changed.
    #[error("client {client} may not write a {permission} value")]
    PermissionDenied {
        client: ClientId,
        permission: &'static str,
    },

    /// A group message describes a different number of variables.
    #[error("group has {expected} variables, message describes {found}")]
    GroupMismatch { expected: usize, found: usize },

    /// Encoding or decoding failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl From<WireError> for ReplicaError {
    fn from(err: WireError) -> Self {
        Self::Codec(err.into())
    }
}

impl From<BitError> for ReplicaError {
    fn from(err: BitError) -> Self {
        Self::Codec(err.into())
    }
}
