//! Error types for bitstream operations.

use thiserror::Error;

/// Result type for bitstream operations.
pub type BitResult<T> = Result<T, BitError>;

/// Errors that can occur during bit-level encoding/decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitError {
    /// Attempted to read past the end of the written data.
    #[error("attempted to read {requested} bits but only {available} bits available")]
    EndOfBuffer {
        /// Number of bits requested.
        requested: usize,
        /// Number of bits available.
        available: usize,
    },

    /// A write targets a non-resizable buffer beyond its bounds.
    ///
    /// The buffer is left unchanged when this is returned.
    #[error("attempted to write {requested} bits but buffer capacity is {capacity} bits")]
    CapacityExceeded {
        /// Bit offset the write would have reached.
        requested: usize,
        /// Capacity of the buffer in bits.
        capacity: usize,
    },

    /// Invalid bit count for the operation.
    #[error("invalid bit count {bits}, maximum allowed is {max_bits}")]
    InvalidBitCount {
        /// The invalid bit count provided.
        bits: u8,
        /// Maximum allowed bits for this operation.
        max_bits: u8,
    },

    /// Value exceeds the range representable by the specified number of bits.
    #[error("value {value} cannot be represented in {bits} bits")]
    ValueOutOfRange {
        /// The value that was out of range.
        value: u64,
        /// Number of bits available.
        bits: u8,
    },

    /// Seek target lies outside the physical allocation.
    #[error("seek to bit {target} is outside [0, {capacity}]")]
    SeekOutOfRange {
        /// Requested bit position (may be negative).
        target: i128,
        /// Capacity of the buffer in bits.
        capacity: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_end_of_buffer() {
        let err = BitError::EndOfBuffer {
            requested: 8,
            available: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("8 bits"), "should mention requested bits");
        assert!(msg.contains("3 bits"), "should mention available bits");
        assert!(msg.contains("read"), "should mention read operation");
    }

    #[test]
    fn error_display_capacity_exceeded() {
        let err = BitError::CapacityExceeded {
            requested: 136,
            capacity: 128,
        };
        let msg = err.to_string();
        assert!(msg.contains("136"), "should mention requested bits");
        assert!(msg.contains("128"), "should mention capacity");
        assert!(msg.contains("write"), "should mention write operation");
    }

    #[test]
    fn error_display_invalid_bit_count() {
        let err = BitError::InvalidBitCount {
            bits: 65,
            max_bits: 64,
        };
        let msg = err.to_string();
        assert!(msg.contains("65"));
        assert!(msg.contains("64"));
    }

    #[test]
    fn error_display_seek_out_of_range() {
        let err = BitError::SeekOutOfRange {
            target: -3,
            capacity: 128,
        };
        let msg = err.to_string();
        assert!(msg.contains("-3"));
        assert!(msg.contains("128"));
    }

    #[test]
    fn error_equality() {
        let err1 = BitError::EndOfBuffer {
            requested: 8,
            available: 3,
        };
        let err2 = err1.clone();
        let err3 = BitError::EndOfBuffer {
            requested: 8,
            available: 4,
        };
        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }

    #[test]
    fn error_is_std_error() {
        fn assert_error<E: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<BitError>();
    }
}
