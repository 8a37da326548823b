//! Error types for delta and record codecs.

use bitstream::BitError;
use schema::FieldId;
use thiserror::Error;
use wire::{Malformed, WireError};

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during delta or record encoding/decoding.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum CodecError {
    /// Value encoding error (buffer, range or malformed input).
    #[error(transparent)]
    Wire(#[from] WireError),

    /// A value does not have the shape its field kind requires.
    #[error("expected {expected} value, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// A fixed-length sequence delta announces a different length.
    #[error("sequence length {found} does not match fixed length {expected}")]
    LengthMismatch { expected: usize, found: usize },

    /// A record does not provide one value per layout field.
    #[error("record has {found} values, layout has {expected} fields")]
    FieldCountMismatch { expected: usize, found: usize },

    /// Error while encoding or decoding a specific record field.
    #[error("field {field}: {source}")]
    Field {
        field: FieldId,
        #[source]
        source: Box<CodecError>,
    },
}

impl CodecError {
    pub(crate) fn in_field(self, field: FieldId) -> Self {
        Self::Field {
            field,
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping field context.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Field { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<BitError> for CodecError {
    fn from(err: BitError) -> Self {
        Self::Wire(WireError::Bits(err))
    }
}

impl From<Malformed> for CodecError {
    fn from(err: Malformed) -> Self {
        Self::Wire(WireError::Malformed(err))
    }
}
