//! Bit-level write contract and a counting writer.

use crate::error::{BitError, BitResult};

/// Sink for bit-level encoding.
///
/// Bits are written least-significant first. Multi-bit writes reserve their
/// full size up front, so an implementation that can run out of room fails
/// before any bit of the value is written.
pub trait BitWrite {
    /// Writes a single bit.
    fn write_bit(&mut self, bit: bool) -> BitResult<()>;

    /// Writes a full byte at the current (possibly misaligned) position.
    fn write_byte(&mut self, byte: u8) -> BitResult<()>;

    /// Ensures that `bits` more bits can be written without failing.
    fn reserve_bits(&mut self, bits: usize) -> BitResult<()>;

    /// Writes the low `bits` bits of `value`, least-significant bit first.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `bits > 64` and
    /// [`BitError::ValueOutOfRange`] if `value` doesn't fit in `bits`.
    fn write_bits(&mut self, value: u64, bits: u8) -> BitResult<()> {
        check_value_fits(value, bits)?;
        self.reserve_bits(usize::from(bits))?;
        let mut count = 0u8;
        while count + 8 <= bits {
            self.write_byte((value >> count) as u8)?;
            count += 8;
        }
        while count < bits {
            self.write_bit((value >> count) & 1 == 1)?;
            count += 1;
        }
        Ok(())
    }

    /// Writes a run of bytes.
    fn write_bytes(&mut self, bytes: &[u8]) -> BitResult<()> {
        self.reserve_bits(bytes.len().saturating_mul(8))?;
        for &byte in bytes {
            self.write_byte(byte)?;
        }
        Ok(())
    }
}

pub(crate) fn check_value_fits(value: u64, bits: u8) -> BitResult<()> {
    if bits > 64 {
        return Err(BitError::InvalidBitCount { bits, max_bits: 64 });
    }
    if bits < 64 && value >> bits != 0 {
        return Err(BitError::ValueOutOfRange { value, bits });
    }
    Ok(())
}

/// A writer that only counts the bits it would have written.
///
/// Used to price an encoding (for example a delta against a full rewrite)
/// without allocating.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BitCounter {
    bits: usize,
}

impl BitCounter {
    /// Creates a counter at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { bits: 0 }
    }

    /// Number of bits counted so far.
    #[must_use]
    pub const fn bits(&self) -> usize {
        self.bits
    }

    /// Number of whole bytes needed to hold the counted bits.
    #[must_use]
    pub const fn bytes(&self) -> usize {
        self.bits.div_ceil(8)
    }
}

impl BitWrite for BitCounter {
    fn write_bit(&mut self, _bit: bool) -> BitResult<()> {
        self.bits += 1;
        Ok(())
    }

    fn write_byte(&mut self, _byte: u8) -> BitResult<()> {
        self.bits += 8;
        Ok(())
    }

    fn reserve_bits(&mut self, _bits: usize) -> BitResult<()> {
        Ok(())
    }

    fn write_bits(&mut self, value: u64, bits: u8) -> BitResult<()> {
        check_value_fits(value, bits)?;
        self.bits += usize::from(bits);
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> BitResult<()> {
        self.bits += bytes.len() * 8;
        Ok(())
    }
}
