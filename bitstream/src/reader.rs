//! Bit-level read contract and a borrowed reader with bounded operations.

use crate::error::{BitError, BitResult};

/// Source for bit-level decoding.
///
/// Bits are read least-significant first, mirroring [`BitWrite`](crate::BitWrite).
/// Implementations never read past the data they consider valid.
pub trait BitRead {
    /// Reads a single bit.
    fn read_bit(&mut self) -> BitResult<bool>;

    /// Reads a full byte at the current (possibly misaligned) position.
    fn read_byte(&mut self) -> BitResult<u8>;

    /// Number of bits that can still be read.
    fn bits_remaining(&self) -> usize;

    /// Reads `bits` bits into the low end of a `u64`.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `bits > 64` and
    /// [`BitError::EndOfBuffer`] if fewer than `bits` bits remain; in both
    /// cases nothing is consumed.
    fn read_bits(&mut self, bits: u8) -> BitResult<u64> {
        if bits > 64 {
            return Err(BitError::InvalidBitCount { bits, max_bits: 64 });
        }
        ensure_remaining(self.bits_remaining(), usize::from(bits))?;
        let mut value = 0u64;
        let mut count = 0u8;
        while count + 8 <= bits {
            value |= u64::from(self.read_byte()?) << count;
            count += 8;
        }
        while count < bits {
            if self.read_bit()? {
                value |= 1 << count;
            }
            count += 1;
        }
        Ok(value)
    }

    /// Fills `out` with the next bytes.
    fn read_bytes(&mut self, out: &mut [u8]) -> BitResult<()> {
        ensure_remaining(self.bits_remaining(), out.len().saturating_mul(8))?;
        for slot in out.iter_mut() {
            *slot = self.read_byte()?;
        }
        Ok(())
    }
}

pub(crate) const fn ensure_remaining(available: usize, requested: usize) -> BitResult<()> {
    if requested > available {
        return Err(BitError::EndOfBuffer {
            requested,
            available,
        });
    }
    Ok(())
}

/// Reads a byte that may straddle two underlying bytes.
///
/// `bit_pos` is the absolute bit offset; the caller guarantees 8 bits remain.
pub(crate) fn load_byte(data: &[u8], bit_pos: usize) -> u8 {
    let idx = bit_pos / 8;
    let shift = bit_pos % 8;
    if shift == 0 {
        data[idx]
    } else {
        (data[idx] >> shift) | (data[idx + 1] << (8 - shift))
    }
}

/// A bit-level reader over borrowed bytes.
///
/// All read operations are bounds-checked and return errors on failure.
/// The reader never panics on malformed input.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
    bit_len: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a new `BitReader` over every bit of `data`.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            bit_pos: 0,
            bit_len: data.len() * 8,
        }
    }

    /// Creates a reader limited to the first `bit_len` bits of `data`.
    ///
    /// `bit_len` is clamped to the bits physically present.
    #[must_use]
    pub fn with_bit_len(data: &'a [u8], bit_len: usize) -> Self {
        Self {
            data,
            bit_pos: 0,
            bit_len: bit_len.min(data.len() * 8),
        }
    }

    /// Returns `true` if there are no more bits to read.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bit_pos >= self.bit_len
    }

    /// Returns the current bit position.
    #[must_use]
    pub const fn bit_position(&self) -> usize {
        self.bit_pos
    }

    /// Returns `true` if the cursor sits on a byte boundary.
    #[must_use]
    pub const fn is_aligned(&self) -> bool {
        self.bit_pos % 8 == 0
    }

    /// Skips to the next byte boundary.
    pub fn skip_pad_bits(&mut self) -> BitResult<()> {
        let rem = self.bit_pos % 8;
        if rem == 0 {
            return Ok(());
        }
        let skip = 8 - rem;
        ensure_remaining(self.bits_remaining(), skip)?;
        self.bit_pos += skip;
        Ok(())
    }

    /// Returns the unread tail of the data, starting at the current byte.
    #[must_use]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        let start = (self.bit_pos / 8).min(self.data.len());
        &self.data[start..]
    }
}

impl BitRead for BitReader<'_> {
    fn read_bit(&mut self) -> BitResult<bool> {
        ensure_remaining(self.bits_remaining(), 1)?;
        let bit = (self.data[self.bit_pos / 8] >> (self.bit_pos % 8)) & 1;
        self.bit_pos += 1;
        Ok(bit == 1)
    }

    fn read_byte(&mut self) -> BitResult<u8> {
        ensure_remaining(self.bits_remaining(), 8)?;
        let value = load_byte(self.data, self.bit_pos);
        self.bit_pos += 8;
        Ok(value)
    }

    fn bits_remaining(&self) -> usize {
        self.bit_len.saturating_sub(self.bit_pos)
    }

    fn read_bytes(&mut self, out: &mut [u8]) -> BitResult<()> {
        ensure_remaining(self.bits_remaining(), out.len().saturating_mul(8))?;
        if self.is_aligned() {
            let start = self.bit_pos / 8;
            out.copy_from_slice(&self.data[start..start + out.len()]);
            self.bit_pos += out.len() * 8;
        } else {
            for slot in out.iter_mut() {
                *slot = load_byte(self.data, self.bit_pos);
                self.bit_pos += 8;
            }
        }
        Ok(())
    }
}
