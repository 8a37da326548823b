//! Error types for value encoding.

use bitstream::BitError;
use thiserror::Error;

/// Result type for value encoding operations.
pub type WireResult<T> = Result<T, WireError>;

/// Errors raised while encoding or decoding values.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum WireError {
    /// The underlying buffer rejected the operation (capacity, end of input).
    #[error(transparent)]
    Bits(#[from] BitError),

    /// A ranged/quantized encode precondition was violated.
    #[error("range error: {0}")]
    Range(#[from] RangeError),

    /// Received bytes do not describe a valid value.
    #[error("malformed data: {0}")]
    Malformed(#[from] Malformed),
}

/// Precondition violations of quantized float encoding.
///
/// Always reported before any bits are written.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RangeError {
    #[error("value {value} outside [{min}, {max}]")]
    ValueOutOfRange { value: f64, min: f64, max: f64 },

    #[error("byte budget {bytes} outside [1, {max}]")]
    InvalidByteBudget { bytes: u8, max: u8 },

    #[error("empty or non-finite range [{min}, {max}]")]
    EmptyRange { min: f64, max: f64 },
}

/// Decode-time structural errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Malformed {
    /// A varint header announces more bytes than remain.
    #[error("varint header {header} needs {needed} more bytes, {available} available")]
    Truncated {
        header: u8,
        needed: usize,
        available: usize,
    },

    /// A decoded integer does not fit the requested type.
    #[error("value {value} overflows {target}")]
    Overflow { value: u64, target: &'static str },

    /// A delta envelope starts with an unknown marker byte.
    #[error("invalid marker byte {marker}")]
    InvalidMarker { marker: u8 },

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    /// A declared length cannot be satisfied by the remaining input.
    #[error("declared length {length} exceeds remaining input ({available_bits} bits)")]
    LengthExceedsInput { length: u64, available_bits: usize },

    /// A sequence delta grows the sequence without marking a new index.
    #[error("new index {index} missing from change mask")]
    MaskGap { index: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_error_is_transparent() {
        let err = WireError::from(BitError::EndOfBuffer {
            requested: 8,
            available: 0,
        });
        assert!(err.to_string().contains("8 bits"));
        assert!(matches!(err, WireError::Bits(_)));
    }

    #[test]
    fn range_error_display() {
        let err: WireError = RangeError::ValueOutOfRange {
            value: 11.0,
            min: -10.0,
            max: 10.0,
        }
        .into();
        let msg = err.to_string();
        assert!(msg.contains("range error"));
        assert!(msg.contains("11"));
    }

    #[test]
    fn malformed_display() {
        let err = Malformed::Truncated {
            header: 255,
            needed: 8,
            available: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("255"));
        assert!(msg.contains("8 more bytes"));
    }

    #[test]
    fn source_chain() {
        use std::error::Error as _;
        let err = WireError::from(Malformed::InvalidUtf8);
        assert!(err.source().is_some());
    }
}
