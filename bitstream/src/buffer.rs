//! Growable, bit-addressable byte buffer.

use log::trace;

use crate::config::{sanitize_growth_factor, BufferConfig};
use crate::error::{BitError, BitResult};
use crate::reader::{ensure_remaining, load_byte, BitRead};
use crate::writer::BitWrite;

/// Reference point for [`BitBuffer::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOrigin {
    /// Offset from bit 0.
    Begin,
    /// Offset from the current cursor.
    Current,
    /// Offset from the written length.
    End,
}

/// A byte buffer with a bit cursor.
///
/// The cursor (`position`) addresses the next bit to read or write. The
/// written length (`bit_length`) is the high-water mark of bits considered
/// valid: reads stop there, writes push it forward.
///
/// A resizable buffer grows before any write that would pass its capacity.
/// A fixed buffer fails with [`BitError::CapacityExceeded`] instead and is
/// left untouched.
#[derive(Debug, Clone)]
pub struct BitBuffer {
    target: Vec<u8>,
    position: usize,
    bit_length: usize,
    resizable: bool,
    growth_factor: f32,
}

impl Default for BitBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl BitBuffer {
    /// Creates a resizable buffer with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(BufferConfig::default())
    }

    /// Creates a resizable buffer with `bytes` of initial capacity.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self::with_config(BufferConfig {
            initial_capacity: bytes,
            ..BufferConfig::default()
        })
    }

    /// Creates a resizable buffer from a [`BufferConfig`].
    #[must_use]
    pub fn with_config(config: BufferConfig) -> Self {
        Self {
            target: vec![0; config.initial_capacity],
            position: 0,
            bit_length: 0,
            resizable: true,
            growth_factor: config.effective_growth_factor(),
        }
    }

    /// Creates an empty, non-resizable buffer of exactly `bytes` bytes.
    #[must_use]
    pub fn fixed(bytes: usize) -> Self {
        Self {
            target: vec![0; bytes],
            position: 0,
            bit_length: 0,
            resizable: false,
            growth_factor: BufferConfig::default().growth_factor,
        }
    }

    /// Wraps received bytes for reading. The buffer is not resizable and
    /// every bit of `data` counts as written.
    #[must_use]
    pub fn wrap(data: Vec<u8>) -> Self {
        let bit_length = data.len() * 8;
        Self {
            target: data,
            position: 0,
            bit_length,
            resizable: false,
            growth_factor: BufferConfig::default().growth_factor,
        }
    }

    /// Bit offset of the next read or write.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Number of bits considered written.
    #[must_use]
    pub const fn bit_length(&self) -> usize {
        self.bit_length
    }

    /// Physical allocation in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.target.len()
    }

    /// Number of bytes holding written bits.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bit_length.div_ceil(8)
    }

    /// Returns `true` if nothing has been written.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bit_length == 0
    }

    #[must_use]
    pub const fn is_resizable(&self) -> bool {
        self.resizable
    }

    #[must_use]
    pub const fn growth_factor(&self) -> f32 {
        self.growth_factor
    }

    /// Replaces the growth factor; values `<= 1.0` become `1.5`.
    pub fn set_growth_factor(&mut self, factor: f32) {
        self.growth_factor = sanitize_growth_factor(factor);
    }

    /// Returns `true` if the cursor sits on a byte boundary.
    #[must_use]
    pub const fn is_aligned(&self) -> bool {
        self.position % 8 == 0
    }

    /// The written prefix of the buffer.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.target[..self.len()]
    }

    /// Copies the written prefix into a new vector.
    #[must_use]
    pub fn to_owned_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    /// Consumes the buffer, returning the written prefix.
    #[must_use]
    pub fn into_bytes(mut self) -> Vec<u8> {
        let len = self.len();
        self.target.truncate(len);
        self.target
    }

    /// Moves the cursor, in bits.
    ///
    /// The target must lie within the physical allocation. Seeking past the
    /// written length is allowed; a later write extends the length to cover it.
    pub fn seek(&mut self, offset: i64, origin: SeekOrigin) -> BitResult<usize> {
        let base = match origin {
            SeekOrigin::Begin => 0,
            SeekOrigin::Current => self.position,
            SeekOrigin::End => self.bit_length,
        };
        let target = base as i128 + i128::from(offset);
        let capacity = self.capacity_bits();
        if target < 0 || target > capacity as i128 {
            return Err(BitError::SeekOutOfRange { target, capacity });
        }
        self.position = target as usize;
        Ok(self.position)
    }

    /// Sets the written length in bits, growing the allocation if needed.
    ///
    /// Shrinking clears the truncated bits; the cursor is clamped to the new
    /// length.
    pub fn set_length(&mut self, bits: usize) -> BitResult<()> {
        self.ensure_capacity(bits)?;
        if bits < self.bit_length {
            self.clear_bits(bits, self.bit_length);
        }
        self.bit_length = bits;
        self.position = self.position.min(bits);
        Ok(())
    }

    /// Clears the cursor and written length, keeping the allocation.
    pub fn reset(&mut self) {
        let high = self.bit_length.max(self.position);
        self.clear_bits(0, high);
        self.position = 0;
        self.bit_length = 0;
    }

    /// Resets the buffer and copies `bytes` in as fully written data.
    ///
    /// Reuses the allocation; a fixed buffer too small for `bytes` fails and
    /// keeps its contents.
    pub fn load(&mut self, bytes: &[u8]) -> BitResult<()> {
        self.ensure_capacity(bytes.len().saturating_mul(8))?;
        self.reset();
        self.target[..bytes.len()].copy_from_slice(bytes);
        self.bit_length = bytes.len() * 8;
        Ok(())
    }

    /// Reads the next byte without advancing.
    pub fn peek_byte(&self) -> BitResult<u8> {
        ensure_remaining(self.bits_remaining(), 8)?;
        Ok(load_byte(&self.target, self.position))
    }

    /// Writes zero bits up to the next byte boundary.
    pub fn pad_to_byte(&mut self) -> BitResult<()> {
        let rem = self.position % 8;
        if rem == 0 {
            return Ok(());
        }
        let pad = 8 - rem;
        self.write_bits(0, pad as u8)
    }

    /// Advances the cursor to the next byte boundary.
    pub fn skip_pad_bits(&mut self) -> BitResult<()> {
        let rem = self.position % 8;
        if rem == 0 {
            return Ok(());
        }
        let skip = 8 - rem;
        ensure_remaining(self.bits_remaining(), skip)?;
        self.position += skip;
        Ok(())
    }

    /// Copies `bits` bits from `source` into this buffer at the cursor.
    pub fn copy_bits_from(&mut self, source: &mut dyn BitRead, bits: usize) -> BitResult<()> {
        ensure_remaining(source.bits_remaining(), bits)?;
        self.reserve_bits(bits)?;
        let mut left = bits;
        while left >= 8 {
            let byte = source.read_byte()?;
            self.write_byte(byte)?;
            left -= 8;
        }
        while left > 0 {
            let bit = source.read_bit()?;
            self.write_bit(bit)?;
            left -= 1;
        }
        Ok(())
    }

    /// Runs `f`, restoring the cursor and written length if it fails.
    ///
    /// Bits written past the restored length are cleared, so an aborted
    /// encode leaves no trace in the output.
    pub fn rollback_on_error<T, E>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<T, E> {
        let position = self.position;
        let bit_length = self.bit_length;
        let result = f(self);
        if result.is_err() {
            let high = self.bit_length.max(self.position);
            if high > bit_length {
                self.clear_bits(bit_length, high);
            }
            self.position = position;
            self.bit_length = bit_length;
        }
        result
    }

    fn capacity_bits(&self) -> usize {
        self.target.len().saturating_mul(8)
    }

    fn ensure_capacity(&mut self, required_bits: usize) -> BitResult<()> {
        let capacity = self.capacity_bits();
        if required_bits <= capacity {
            return Ok(());
        }
        if !self.resizable {
            return Err(BitError::CapacityExceeded {
                requested: required_bits,
                capacity,
            });
        }
        let required = required_bits.div_ceil(8);
        let grown = grown_capacity(self.target.len(), required, self.growth_factor);
        trace!(
            "bit buffer grow: {} -> {} bytes ({} required)",
            self.target.len(),
            grown,
            required
        );
        self.target.resize(grown, 0);
        Ok(())
    }

    fn clear_bits(&mut self, from: usize, to: usize) {
        let end = to.div_ceil(8).min(self.target.len());
        let mut start = from / 8;
        if start >= end {
            return;
        }
        let rem = from % 8;
        if rem != 0 {
            self.target[start] &= (1u8 << rem) - 1;
            start += 1;
        }
        self.target[start..end].fill(0);
    }

    fn advance(&mut self, bits: usize) {
        self.position += bits;
        if self.position > self.bit_length {
            self.bit_length = self.position;
        }
    }
}

/// `max(cap, 1) * factor ^ ceil(extra / max(cap, 1))`, never below `required`.
fn grown_capacity(current: usize, required: usize, factor: f32) -> usize {
    let base = current.max(1);
    let extra = required.saturating_sub(current);
    let exponent = extra.div_ceil(base);
    let grown = (base as f64) * f64::from(factor).powi(i32::try_from(exponent).unwrap_or(i32::MAX));
    let grown = if grown.is_finite() && grown < usize::MAX as f64 {
        grown as usize
    } else {
        required.saturating_mul(2)
    };
    grown.max(required)
}

impl BitWrite for BitBuffer {
    fn write_bit(&mut self, bit: bool) -> BitResult<()> {
        self.ensure_capacity(self.position + 1)?;
        let idx = self.position / 8;
        let mask = 1u8 << (self.position % 8);
        if bit {
            self.target[idx] |= mask;
        } else {
            self.target[idx] &= !mask;
        }
        self.advance(1);
        Ok(())
    }

    fn write_byte(&mut self, byte: u8) -> BitResult<()> {
        self.ensure_capacity(self.position + 8)?;
        let idx = self.position / 8;
        let off = self.position % 8;
        if off == 0 {
            self.target[idx] = byte;
        } else {
            self.target[idx] = (self.target[idx] & (0xFF >> (8 - off))) | (byte << off);
            self.target[idx + 1] = (self.target[idx + 1] & (0xFF << off)) | (byte >> (8 - off));
        }
        self.advance(8);
        Ok(())
    }

    fn reserve_bits(&mut self, bits: usize) -> BitResult<()> {
        match self.position.checked_add(bits) {
            Some(end) => self.ensure_capacity(end),
            None => Err(BitError::CapacityExceeded {
                requested: usize::MAX,
                capacity: self.capacity_bits(),
            }),
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> BitResult<()> {
        self.reserve_bits(bytes.len().saturating_mul(8))?;
        if self.is_aligned() {
            let start = self.position / 8;
            self.target[start..start + bytes.len()].copy_from_slice(bytes);
            self.advance(bytes.len() * 8);
        } else {
            for &byte in bytes {
                self.write_byte(byte)?;
            }
        }
        Ok(())
    }
}

impl BitRead for BitBuffer {
    fn read_bit(&mut self) -> BitResult<bool> {
        ensure_remaining(self.bits_remaining(), 1)?;
        let bit = (self.target[self.position / 8] >> (self.position % 8)) & 1;
        self.position += 1;
        Ok(bit == 1)
    }

    fn read_byte(&mut self) -> BitResult<u8> {
        ensure_remaining(self.bits_remaining(), 8)?;
        let value = load_byte(&self.target, self.position);
        self.position += 8;
        Ok(value)
    }

    fn bits_remaining(&self) -> usize {
        self.bit_length.saturating_sub(self.position)
    }

    fn read_bytes(&mut self, out: &mut [u8]) -> BitResult<()> {
        ensure_remaining(self.bits_remaining(), out.len().saturating_mul(8))?;
        if self.is_aligned() {
            let start = self.position / 8;
            out.copy_from_slice(&self.target[start..start + out.len()]);
            self.position += out.len() * 8;
        } else {
            for slot in out.iter_mut() {
                *slot = load_byte(&self.target, self.position);
                self.position += 8;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_empty() {
        let buf = BitBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), 16);
        assert_eq!(buf.position(), 0);
        assert!(buf.is_resizable());
        assert!(buf.as_bytes().is_empty());
    }

    #[test]
    fn write_bits_lsb_first() {
        let mut buf = BitBuffer::new();
        buf.write_bit(true).unwrap();
        buf.write_bit(false).unwrap();
        buf.write_bit(true).unwrap();
        assert_eq!(buf.as_bytes(), &[0b101]);
        assert_eq!(buf.bit_length(), 3);
    }

    #[test]
    fn misaligned_byte_is_split() {
        let mut buf = BitBuffer::new();
        buf.write_bits(0b111, 3).unwrap();
        buf.write_byte(0xAA).unwrap();
        // 0xAA << 3 = 0x550 -> low byte 0x50 | 0b111, high byte 0x05
        assert_eq!(buf.as_bytes(), &[0x57, 0x05]);
        buf.seek(0, SeekOrigin::Begin).unwrap();
        assert_eq!(buf.read_bits(3).unwrap(), 0b111);
        assert_eq!(buf.read_byte().unwrap(), 0xAA);
    }

    #[test]
    fn growth_preserves_content() {
        let mut buf = BitBuffer::with_capacity(2);
        for i in 0..40u8 {
            buf.write_byte(i).unwrap();
        }
        assert!(buf.capacity() >= 40);
        let expected: Vec<u8> = (0..40).collect();
        assert_eq!(buf.as_bytes(), expected.as_slice());
    }

    #[test]
    fn growth_follows_factor() {
        assert_eq!(grown_capacity(16, 17, 2.0), 32);
        assert_eq!(grown_capacity(16, 40, 2.0), 64);
        assert_eq!(grown_capacity(0, 1, 2.0), 2);
        // 1 * 1.5 truncates to 1, so the requirement wins
        assert_eq!(grown_capacity(1, 2, 1.5), 2);
        assert_eq!(grown_capacity(1, 10_000, 1.5), 20_000);
    }

    #[test]
    fn fixed_buffer_overflow_leaves_state() {
        let mut buf = BitBuffer::fixed(1);
        buf.write_bits(0b1_0101, 5).unwrap();
        let err = buf.write_bits(0xFF, 8).unwrap_err();
        assert_eq!(
            err,
            BitError::CapacityExceeded {
                requested: 13,
                capacity: 8
            }
        );
        assert_eq!(buf.position(), 5);
        assert_eq!(buf.bit_length(), 5);
        assert_eq!(buf.as_bytes(), &[0b1_0101]);
    }

    #[test]
    fn fixed_buffer_write_bytes_is_atomic() {
        let mut buf = BitBuffer::fixed(2);
        buf.write_byte(1).unwrap();
        assert!(buf.write_bytes(&[2, 3]).is_err());
        assert_eq!(buf.as_bytes(), &[1]);
    }

    #[test]
    fn invalid_write_bits_rejected_before_write() {
        let mut buf = BitBuffer::new();
        assert!(matches!(
            buf.write_bits(0, 65),
            Err(BitError::InvalidBitCount { .. })
        ));
        assert!(matches!(
            buf.write_bits(8, 3),
            Err(BitError::ValueOutOfRange { .. })
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn read_stops_at_written_length() {
        let mut buf = BitBuffer::new();
        buf.write_bits(0b11, 2).unwrap();
        buf.seek(0, SeekOrigin::Begin).unwrap();
        assert_eq!(buf.read_bits(2).unwrap(), 0b11);
        assert!(matches!(
            buf.read_bit(),
            Err(BitError::EndOfBuffer { .. })
        ));
    }

    #[test]
    fn seek_origins() {
        let mut buf = BitBuffer::new();
        buf.write_bytes(&[1, 2, 3]).unwrap();
        assert_eq!(buf.seek(-8, SeekOrigin::End).unwrap(), 16);
        assert_eq!(buf.read_byte().unwrap(), 3);
        assert_eq!(buf.seek(-16, SeekOrigin::Current).unwrap(), 8);
        assert_eq!(buf.read_byte().unwrap(), 2);
        assert_eq!(buf.seek(4, SeekOrigin::Begin).unwrap(), 4);
    }

    #[test]
    fn seek_out_of_range() {
        let mut buf = BitBuffer::fixed(2);
        assert!(matches!(
            buf.seek(-1, SeekOrigin::Begin),
            Err(BitError::SeekOutOfRange { target: -1, .. })
        ));
        assert!(buf.seek(16, SeekOrigin::Begin).is_ok());
        assert!(buf.seek(17, SeekOrigin::Begin).is_err());
    }

    #[test]
    fn overwrite_after_seek_keeps_length() {
        let mut buf = BitBuffer::new();
        buf.write_bytes(&[0xAA, 0xBB, 0xCC]).unwrap();
        buf.seek(8, SeekOrigin::Begin).unwrap();
        buf.write_byte(0x11).unwrap();
        assert_eq!(buf.bit_length(), 24);
        assert_eq!(buf.as_bytes(), &[0xAA, 0x11, 0xCC]);
    }

    #[test]
    fn set_length_truncates_and_clamps() {
        let mut buf = BitBuffer::new();
        buf.write_bytes(&[0xFF, 0xFF]).unwrap();
        buf.set_length(4).unwrap();
        assert_eq!(buf.position(), 4);
        assert_eq!(buf.as_bytes(), &[0x0F]);
        buf.set_length(16).unwrap();
        assert_eq!(buf.as_bytes(), &[0x0F, 0x00]);
    }

    #[test]
    fn set_length_on_fixed_buffer() {
        let mut buf = BitBuffer::fixed(1);
        assert!(buf.set_length(8).is_ok());
        assert!(matches!(
            buf.set_length(9),
            Err(BitError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn reset_clears_state_and_content() {
        let mut buf = BitBuffer::new();
        buf.write_bytes(&[0xFF, 0xFF]).unwrap();
        buf.reset();
        assert!(buf.is_empty());
        assert_eq!(buf.position(), 0);
        buf.write_bit(false).unwrap();
        assert_eq!(buf.as_bytes(), &[0]);
    }

    #[test]
    fn wrap_exposes_all_bits() {
        let mut buf = BitBuffer::wrap(vec![0x34, 0x12]);
        assert!(!buf.is_resizable());
        assert_eq!(buf.bit_length(), 16);
        assert_eq!(buf.read_bits(16).unwrap(), 0x1234);
        assert!(buf.write_bit(true).is_err());
    }

    #[test]
    fn load_reuses_allocation() {
        let mut buf = BitBuffer::with_capacity(64);
        buf.write_bytes(&[9; 10]).unwrap();
        buf.load(&[1, 2, 3]).unwrap();
        assert_eq!(buf.capacity(), 64);
        assert_eq!(buf.as_bytes(), &[1, 2, 3]);
        assert_eq!(buf.position(), 0);
        assert_eq!(buf.read_byte().unwrap(), 1);
    }

    #[test]
    fn peek_does_not_advance() {
        let mut buf = BitBuffer::wrap(vec![7, 8]);
        assert_eq!(buf.peek_byte().unwrap(), 7);
        assert_eq!(buf.position(), 0);
    }

    #[test]
    fn pad_and_skip() {
        let mut buf = BitBuffer::new();
        buf.write_bit(true).unwrap();
        buf.pad_to_byte().unwrap();
        buf.write_byte(0x42).unwrap();
        assert_eq!(buf.as_bytes(), &[0x01, 0x42]);

        buf.seek(1, SeekOrigin::Begin).unwrap();
        buf.skip_pad_bits().unwrap();
        assert_eq!(buf.read_byte().unwrap(), 0x42);
    }

    #[test]
    fn copy_bits_between_buffers() {
        let mut src = BitBuffer::wrap(vec![0xAB, 0x0C]);
        let mut dst = BitBuffer::new();
        dst.write_bit(true).unwrap();
        dst.copy_bits_from(&mut src, 12).unwrap();
        dst.seek(1, SeekOrigin::Begin).unwrap();
        assert_eq!(dst.read_bits(12).unwrap(), 0xCAB);
    }

    #[test]
    fn rollback_restores_on_error() {
        let mut buf = BitBuffer::fixed(2);
        buf.write_byte(0x01).unwrap();
        let result: BitResult<()> = buf.rollback_on_error(|b| {
            b.write_bits(0b101, 3)?;
            b.write_bytes(&[0xFF, 0xFF])
        });
        assert!(result.is_err());
        assert_eq!(buf.position(), 8);
        assert_eq!(buf.bit_length(), 8);
        assert_eq!(buf.as_bytes(), &[0x01]);
        buf.set_length(16).unwrap();
        assert_eq!(buf.as_bytes(), &[0x01, 0x00]);
    }

    #[test]
    fn rollback_keeps_success() {
        let mut buf = BitBuffer::new();
        let value = buf
            .rollback_on_error(|b| b.write_byte(5).map(|()| 5))
            .unwrap();
        assert_eq!(value, 5);
        assert_eq!(buf.as_bytes(), &[5]);
    }

    #[test]
    fn invalid_growth_factor_coerced() {
        let mut buf = BitBuffer::new();
        buf.set_growth_factor(0.9);
        assert!((buf.growth_factor() - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn failed_load_keeps_contents() {
        let mut buf = BitBuffer::fixed(2);
        buf.write_bits(0x1AB, 9).unwrap();
        let err = buf.load(&[1, 2, 3]).unwrap_err();
        assert_eq!(
            err,
            BitError::CapacityExceeded {
                requested: 24,
                capacity: 16
            }
        );
        assert_eq!(buf.position(), 9);
        assert_eq!(buf.bit_length(), 9);
        assert_eq!(buf.as_bytes(), &[0xAB, 0x01]);
    }

    #[test]
    fn into_bytes_truncates() {
        let mut buf = BitBuffer::with_capacity(32);
        buf.write_bits(0x1FF, 9).unwrap();
        assert_eq!(buf.into_bytes(), vec![0xFF, 0x01]);
    }
}
