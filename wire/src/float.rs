//! Fixed, packed and quantized float encodings.
//!
//! Packed floats byte-swap the IEEE-754 bit pattern before varint encoding so
//! the sign/exponent byte lands in the low end. Quantized ("ranged") floats map
//! a value in a known `[min, max]` onto `n` raw little-endian bytes.

use bitstream::{BitRead, BitWrite};

use crate::error::{Malformed, RangeError, WireError, WireResult};
use crate::varint::{read_varint, write_varint};

/// Largest byte budget for a ranged `f32`.
pub const MAX_RANGED_F32_BYTES: u8 = 4;
/// Largest byte budget for a ranged `f64`.
pub const MAX_RANGED_F64_BYTES: u8 = 8;

/// Writes the raw little-endian bit pattern (4 bytes).
pub fn write_f32_fixed(w: &mut dyn BitWrite, value: f32) -> WireResult<()> {
    w.write_bytes(&value.to_bits().to_le_bytes())?;
    Ok(())
}

/// Reads a raw little-endian `f32` bit pattern.
pub fn read_f32_fixed(r: &mut dyn BitRead) -> WireResult<f32> {
    let mut bytes = [0u8; 4];
    r.read_bytes(&mut bytes)?;
    Ok(f32::from_bits(u32::from_le_bytes(bytes)))
}

/// Writes the raw little-endian bit pattern (8 bytes).
pub fn write_f64_fixed(w: &mut dyn BitWrite, value: f64) -> WireResult<()> {
    w.write_bytes(&value.to_bits().to_le_bytes())?;
    Ok(())
}

/// Reads a raw little-endian `f64` bit pattern.
pub fn read_f64_fixed(r: &mut dyn BitRead) -> WireResult<f64> {
    let mut bytes = [0u8; 8];
    r.read_bytes(&mut bytes)?;
    Ok(f64::from_bits(u64::from_le_bytes(bytes)))
}

/// Writes `value` as a varint of its byte-swapped bit pattern.
pub fn write_f32_packed(w: &mut dyn BitWrite, value: f32) -> WireResult<()> {
    write_varint(w, u64::from(value.to_bits().swap_bytes()))
}

/// Reads a packed `f32`; a varint wider than 32 bits is `Malformed::Overflow`.
pub fn read_f32_packed(r: &mut dyn BitRead) -> WireResult<f32> {
    let raw = read_varint(r)?;
    let swapped = u32::try_from(raw).map_err(|_| {
        WireError::from(Malformed::Overflow {
            value: raw,
            target: "f32",
        })
    })?;
    Ok(f32::from_bits(swapped.swap_bytes()))
}

/// Writes `value` as a varint of its byte-swapped bit pattern.
pub fn write_f64_packed(w: &mut dyn BitWrite, value: f64) -> WireResult<()> {
    write_varint(w, value.to_bits().swap_bytes())
}

/// Reads a packed `f64`.
pub fn read_f64_packed(r: &mut dyn BitRead) -> WireResult<f64> {
    let raw = read_varint(r)?;
    Ok(f64::from_bits(raw.swap_bytes()))
}

/// Parameters of a quantized float: the value range and the byte budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranged {
    pub min: f64,
    pub max: f64,
    pub bytes: u8,
}

impl Ranged {
    /// Validates the range and the byte budget against `max_bytes`.
    pub fn checked(min: f64, max: f64, bytes: u8, max_bytes: u8) -> Result<Self, RangeError> {
        if bytes == 0 || bytes > max_bytes {
            return Err(RangeError::InvalidByteBudget {
                bytes,
                max: max_bytes,
            });
        }
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(RangeError::EmptyRange { min, max });
        }
        Ok(Self { min, max, bytes })
    }

    /// `256^bytes - 1`, the largest raw value.
    #[must_use]
    pub const fn steps(&self) -> u64 {
        if self.bytes >= 8 {
            u64::MAX
        } else {
            (1u64 << (8 * self.bytes as u32)) - 1
        }
    }

    /// Largest decode error for an in-range value.
    #[must_use]
    pub fn resolution(&self) -> f64 {
        (self.max - self.min) / self.steps() as f64
    }

    /// Maps `value` to its raw integer.
    pub fn quantize(&self, value: f64) -> Result<u64, RangeError> {
        if value.is_nan() || value < self.min || value > self.max {
            return Err(RangeError::ValueOutOfRange {
                value,
                min: self.min,
                max: self.max,
            });
        }
        let unit = (value - self.min) / (self.max - self.min);
        Ok((unit * self.steps() as f64).round() as u64)
    }

    /// Maps a raw integer back into the range.
    #[must_use]
    pub fn dequantize(&self, raw: u64) -> f64 {
        (raw as f64 / self.steps() as f64) * (self.max - self.min) + self.min
    }

    fn write(&self, w: &mut dyn BitWrite, value: f64) -> WireResult<()> {
        let raw = self.quantize(value)?;
        w.write_bytes(&raw.to_le_bytes()[..usize::from(self.bytes)])?;
        Ok(())
    }

    fn read(&self, r: &mut dyn BitRead) -> WireResult<f64> {
        let mut raw = [0u8; 8];
        r.read_bytes(&mut raw[..usize::from(self.bytes)])?;
        Ok(self.dequantize(u64::from_le_bytes(raw)))
    }
}

/// Writes `value` quantized to `bytes` bytes over `[min, max]`.
///
/// All preconditions are checked before anything is written.
pub fn write_ranged_f32(
    w: &mut dyn BitWrite,
    value: f32,
    min: f32,
    max: f32,
    bytes: u8,
) -> WireResult<()> {
    Ranged::checked(f64::from(min), f64::from(max), bytes, MAX_RANGED_F32_BYTES)?
        .write(w, f64::from(value))
}

pub fn read_ranged_f32(r: &mut dyn BitRead, min: f32, max: f32, bytes: u8) -> WireResult<f32> {
    let ranged = Ranged::checked(f64::from(min), f64::from(max), bytes, MAX_RANGED_F32_BYTES)?;
    Ok(ranged.read(r)? as f32)
}

/// Writes `value` quantized to `bytes` bytes over `[min, max]`.
pub fn write_ranged_f64(
    w: &mut dyn BitWrite,
    value: f64,
    min: f64,
    max: f64,
    bytes: u8,
) -> WireResult<()> {
    Ranged::checked(min, max, bytes, MAX_RANGED_F64_BYTES)?.write(w, value)
}

pub fn read_ranged_f64(r: &mut dyn BitRead, min: f64, max: f64, bytes: u8) -> WireResult<f64> {
    Ranged::checked(min, max, bytes, MAX_RANGED_F64_BYTES)?.read(r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitstream::{BitBuffer, BitReader};

    #[test]
    fn fixed_is_raw_little_endian() {
        let mut buf = BitBuffer::new();
        write_f32_fixed(&mut buf, 1.0).unwrap();
        assert_eq!(buf.as_bytes(), &[0x00, 0x00, 0x80, 0x3F]);
        write_f64_fixed(&mut buf, -2.5).unwrap();
        let bytes = buf.into_bytes();
        let mut reader = BitReader::new(&bytes);
        assert_eq!(read_f32_fixed(&mut reader).unwrap(), 1.0);
        assert_eq!(read_f64_fixed(&mut reader).unwrap(), -2.5);
    }

    #[test]
    fn packed_swaps_bytes() {
        let mut buf = BitBuffer::new();
        // 1.0f32 = 0x3F80_0000, swapped 0x0000_803F = 32831 = 2288 + 0x774F
        write_f32_packed(&mut buf, 1.0).unwrap();
        assert_eq!(buf.as_bytes(), &[249, 0x4F, 0x77]);
        assert_eq!(read_f32_packed(&mut BitReader::new(buf.as_bytes())).unwrap(), 1.0);
    }

    #[test]
    fn packed_zero_is_one_byte() {
        let mut buf = BitBuffer::new();
        write_f32_packed(&mut buf, 0.0).unwrap();
        write_f64_packed(&mut buf, 0.0).unwrap();
        assert_eq!(buf.as_bytes(), &[0, 0]);
    }

    #[test]
    fn packed_roundtrip_specials() {
        for value in [f32::MIN, f32::MAX, -0.0, f32::INFINITY, f32::MIN_POSITIVE, 123.456] {
            let mut buf = BitBuffer::new();
            write_f32_packed(&mut buf, value).unwrap();
            let back = read_f32_packed(&mut BitReader::new(buf.as_bytes())).unwrap();
            assert_eq!(back.to_bits(), value.to_bits());
        }
        for value in [f64::MIN, f64::MAX, -0.0, f64::NEG_INFINITY, 1e-300] {
            let mut buf = BitBuffer::new();
            write_f64_packed(&mut buf, value).unwrap();
            let back = read_f64_packed(&mut BitReader::new(buf.as_bytes())).unwrap();
            assert_eq!(back.to_bits(), value.to_bits());
        }
        let mut buf = BitBuffer::new();
        write_f32_packed(&mut buf, f32::NAN).unwrap();
        assert!(read_f32_packed(&mut BitReader::new(buf.as_bytes())).unwrap().is_nan());
    }

    #[test]
    fn ranged_within_resolution() {
        let mut buf = BitBuffer::new();
        write_ranged_f32(&mut buf, 3.5, -10.0, 10.0, 2).unwrap();
        assert_eq!(buf.len(), 2);
        let back = read_ranged_f32(&mut BitReader::new(buf.as_bytes()), -10.0, 10.0, 2).unwrap();
        assert!((back - 3.5).abs() <= 20.0 / 65535.0);
    }

    #[test]
    fn ranged_endpoints_exact() {
        let ranged = Ranged::checked(-1.0, 1.0, 1, 4).unwrap();
        assert_eq!(ranged.quantize(-1.0).unwrap(), 0);
        assert_eq!(ranged.quantize(1.0).unwrap(), 255);
        assert_eq!(ranged.dequantize(0), -1.0);
        assert_eq!(ranged.dequantize(255), 1.0);
    }

    #[test]
    fn ranged_f64_eight_bytes() {
        let mut buf = BitBuffer::new();
        write_ranged_f64(&mut buf, 0.25, 0.0, 1.0, 8).unwrap();
        assert_eq!(buf.len(), 8);
        let back = read_ranged_f64(&mut BitReader::new(buf.as_bytes()), 0.0, 1.0, 8).unwrap();
        assert!((back - 0.25).abs() < 1e-12);
    }

    #[test]
    fn ranged_preconditions_leave_buffer_untouched() {
        let mut buf = BitBuffer::new();
        let cases = [
            write_ranged_f32(&mut buf, 11.0, -10.0, 10.0, 2),
            write_ranged_f32(&mut buf, f32::NAN, -10.0, 10.0, 2),
            write_ranged_f32(&mut buf, 0.0, -10.0, 10.0, 0),
            write_ranged_f32(&mut buf, 0.0, -10.0, 10.0, 5),
            write_ranged_f32(&mut buf, 0.0, 1.0, 1.0, 2),
            write_ranged_f32(&mut buf, 0.0, f32::NEG_INFINITY, 1.0, 2),
        ];
        assert!(matches!(
            cases[0],
            Err(WireError::Range(RangeError::ValueOutOfRange { .. }))
        ));
        assert!(matches!(
            cases[1],
            Err(WireError::Range(RangeError::ValueOutOfRange { .. }))
        ));
        assert!(matches!(
            cases[2],
            Err(WireError::Range(RangeError::InvalidByteBudget { bytes: 0, max: 4 }))
        ));
        assert!(matches!(
            cases[3],
            Err(WireError::Range(RangeError::InvalidByteBudget { bytes: 5, .. }))
        ));
        assert!(matches!(
            cases[4],
            Err(WireError::Range(RangeError::EmptyRange { .. }))
        ));
        assert!(matches!(
            cases[5],
            Err(WireError::Range(RangeError::EmptyRange { .. }))
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn ranged_f64_budget_is_eight() {
        let mut buf = BitBuffer::new();
        assert!(write_ranged_f64(&mut buf, 0.0, 0.0, 1.0, 9).is_err());
        assert!(write_ranged_f64(&mut buf, 0.0, 0.0, 1.0, 8).is_ok());
    }
}
