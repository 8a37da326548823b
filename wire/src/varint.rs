//! Byte-prefixed variable-length integers and zig-zag mapping.
//!
//! Layout of an encoded `u64`, selected by the first (header) byte:
//!
//! | Header      | Total bytes | Value                                        |
//! |-------------|-------------|----------------------------------------------|
//! | `0..=240`   | 1           | header                                       |
//! | `241..=248` | 2           | `240 + 256 * (header - 241) + b1`            |
//! | `249`       | 3           | `2288 + u16::from_le_bytes([b1, b2])`        |
//! | `250..=255` | 4..=9       | `header - 247` little-endian bytes           |

use bitstream::{BitRead, BitWrite};

use crate::error::{Malformed, WireError, WireResult};

/// Largest value encoded in a single byte.
pub const ONE_BYTE_MAX: u64 = 240;
/// Largest value encoded in two bytes.
pub const TWO_BYTE_MAX: u64 = 2287;
/// Largest value encoded in three bytes.
pub const THREE_BYTE_MAX: u64 = 67_823;
/// Longest possible encoding in bytes.
pub const MAX_VARINT_BYTES: usize = 9;

const TWO_BYTE_BASE: u8 = 241;
const THREE_BYTE_HEADER: u8 = 249;
const WIDE_HEADER_BASE: u8 = 247;

/// Exact number of bytes [`write_varint`] emits for `value`.
#[must_use]
pub const fn varint_len(value: u64) -> usize {
    if value <= ONE_BYTE_MAX {
        1
    } else if value <= TWO_BYTE_MAX {
        2
    } else if value <= THREE_BYTE_MAX {
        3
    } else {
        1 + wide_len(value)
    }
}

/// Number of little-endian payload bytes for a wide (header `250..=255`) value.
const fn wide_len(value: u64) -> usize {
    let significant = (64 - value.leading_zeros() as usize).div_ceil(8);
    if significant < 3 {
        3
    } else {
        significant
    }
}

/// Encodes `value` into its byte form without writing it anywhere.
///
/// Returns the scratch array and the number of bytes used.
#[must_use]
pub fn encode_varint(value: u64) -> ([u8; MAX_VARINT_BYTES], usize) {
    let mut out = [0u8; MAX_VARINT_BYTES];
    let len = if value <= ONE_BYTE_MAX {
        out[0] = value as u8;
        1
    } else if value <= TWO_BYTE_MAX {
        let rest = value - ONE_BYTE_MAX;
        out[0] = (rest >> 8) as u8 + TWO_BYTE_BASE;
        out[1] = (rest & 0xFF) as u8;
        2
    } else if value <= THREE_BYTE_MAX {
        let rest = value - (TWO_BYTE_MAX + 1);
        out[0] = THREE_BYTE_HEADER;
        out[1..3].copy_from_slice(&(rest as u16).to_le_bytes());
        3
    } else {
        let wide = wide_len(value);
        out[0] = WIDE_HEADER_BASE + wide as u8;
        out[1..=wide].copy_from_slice(&value.to_le_bytes()[..wide]);
        1 + wide
    };
    (out, len)
}

/// Writes an unsigned varint. Either every byte is written or none is.
pub fn write_varint(w: &mut dyn BitWrite, value: u64) -> WireResult<()> {
    let (bytes, len) = encode_varint(value);
    w.write_bytes(&bytes[..len])?;
    Ok(())
}

/// Reads an unsigned varint.
///
/// Non-minimal encodings (a value written in a wider band than needed) are
/// accepted.
pub fn read_varint(r: &mut dyn BitRead) -> WireResult<u64> {
    let header = r.read_byte()?;
    if u64::from(header) <= ONE_BYTE_MAX {
        return Ok(u64::from(header));
    }
    let needed = match header {
        TWO_BYTE_BASE..=248 => 1,
        THREE_BYTE_HEADER => 2,
        _ => usize::from(header - WIDE_HEADER_BASE),
    };
    let available = r.bits_remaining() / 8;
    if needed > available {
        return Err(Malformed::Truncated {
            header,
            needed,
            available,
        }
        .into());
    }
    let mut payload = [0u8; 8];
    r.read_bytes(&mut payload[..needed])?;
    let value = match header {
        TWO_BYTE_BASE..=248 => {
            ONE_BYTE_MAX + (u64::from(header - TWO_BYTE_BASE) << 8) + u64::from(payload[0])
        }
        THREE_BYTE_HEADER => {
            TWO_BYTE_MAX + 1 + u64::from(u16::from_le_bytes([payload[0], payload[1]]))
        }
        _ => u64::from_le_bytes(payload),
    };
    Ok(value)
}

/// Maps a signed integer onto the unsigned range, small magnitudes first.
#[must_use]
pub const fn zigzag_encode(value: i64) -> u64 {
    ((value >> 63) as u64) ^ ((value as u64) << 1)
}

/// Inverse of [`zigzag_encode`].
#[must_use]
pub const fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Writes a zig-zag mapped signed varint.
pub fn write_varint_signed(w: &mut dyn BitWrite, value: i64) -> WireResult<()> {
    write_varint(w, zigzag_encode(value))
}

/// Reads a zig-zag mapped signed varint.
pub fn read_varint_signed(r: &mut dyn BitRead) -> WireResult<i64> {
    read_varint(r).map(zigzag_decode)
}

macro_rules! narrow_unsigned {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Reads a varint that must fit in `", stringify!($ty), "`.")]
            pub fn $name(r: &mut dyn BitRead) -> WireResult<$ty> {
                let value = read_varint(r)?;
                <$ty>::try_from(value).map_err(|_| {
                    WireError::from(Malformed::Overflow {
                        value,
                        target: stringify!($ty),
                    })
                })
            }
        )*
    };
}

macro_rules! narrow_signed {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Reads a zig-zag varint that must fit in `", stringify!($ty), "`.")]
            pub fn $name(r: &mut dyn BitRead) -> WireResult<$ty> {
                let raw = read_varint(r)?;
                <$ty>::try_from(zigzag_decode(raw)).map_err(|_| {
                    WireError::from(Malformed::Overflow {
                        value: raw,
                        target: stringify!($ty),
                    })
                })
            }
        )*
    };
}

narrow_unsigned! {
    read_varint_u16 => u16,
    read_varint_u32 => u32,
    read_varint_usize => usize,
}

narrow_signed! {
    read_varint_i16 => i16,
    read_varint_i32 => i32,
}

macro_rules! fixed_le {
    ($($write:ident, $read:ident => $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Writes a `", stringify!($ty), "` as raw little-endian bytes.")]
            pub fn $write(w: &mut dyn BitWrite, value: $ty) -> WireResult<()> {
                w.write_bytes(&value.to_le_bytes())?;
                Ok(())
            }

            #[doc = concat!("Reads a raw little-endian `", stringify!($ty), "`.")]
            pub fn $read(r: &mut dyn BitRead) -> WireResult<$ty> {
                let mut bytes = [0u8; std::mem::size_of::<$ty>()];
                r.read_bytes(&mut bytes)?;
                Ok(<$ty>::from_le_bytes(bytes))
            }
        )*
    };
}

fixed_le! {
    write_u16_le, read_u16_le => u16,
    write_u32_le, read_u32_le => u32,
    write_u64_le, read_u64_le => u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitstream::{BitBuffer, BitError, BitReader};

    fn encoded(value: u64) -> Vec<u8> {
        let mut buf = BitBuffer::new();
        write_varint(&mut buf, value).unwrap();
        buf.into_bytes()
    }

    fn decoded(bytes: &[u8]) -> WireResult<u64> {
        read_varint(&mut BitReader::new(bytes))
    }

    #[test]
    fn band_boundaries_layout() {
        assert_eq!(encoded(0), vec![0]);
        assert_eq!(encoded(240), vec![240]);
        assert_eq!(encoded(241), vec![241, 1]);
        assert_eq!(encoded(2287), vec![248, 255]);
        assert_eq!(encoded(2288), vec![249, 0, 0]);
        assert_eq!(encoded(67_823), vec![249, 0xFF, 0xFF]);
        assert_eq!(encoded(67_824), vec![250, 0xF0, 0x08, 0x01]);
        assert_eq!(encoded(u64::from(u32::MAX)), vec![251, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(
            encoded(u64::MAX),
            vec![255, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn boundary_roundtrip() {
        let values = [
            0,
            240,
            241,
            2287,
            2288,
            67_823,
            67_824,
            (1 << 24) - 1,
            1 << 24,
            u64::from(u32::MAX),
            1 << 40,
            (1 << 56) - 1,
            1 << 56,
            u64::MAX,
        ];
        for value in values {
            let bytes = encoded(value);
            assert_eq!(bytes.len(), varint_len(value), "length of {value}");
            assert_eq!(decoded(&bytes).unwrap(), value, "roundtrip of {value}");
        }
    }

    #[test]
    fn wide_headers_cover_three_to_eight_bytes() {
        assert_eq!(encoded((1 << 24) - 1)[0], 250);
        assert_eq!(encoded(1 << 24)[0], 251);
        assert_eq!(encoded(1 << 32)[0], 252);
        assert_eq!(encoded(1 << 40)[0], 253);
        assert_eq!(encoded(1 << 48)[0], 254);
        assert_eq!(encoded(1 << 56)[0], 255);
    }

    #[test]
    fn misaligned_varint() {
        let mut buf = BitBuffer::new();
        buf.write_bits(0b101, 3).unwrap();
        write_varint(&mut buf, 1_000_000).unwrap();
        let bytes = buf.into_bytes();
        let mut reader = BitReader::new(&bytes);
        assert_eq!(reader.read_bits(3).unwrap(), 0b101);
        assert_eq!(read_varint(&mut reader).unwrap(), 1_000_000);
    }

    #[test]
    fn truncated_header_rejected() {
        let err = decoded(&[252, 1, 2]).unwrap_err();
        assert_eq!(
            err,
            WireError::Malformed(Malformed::Truncated {
                header: 252,
                needed: 5,
                available: 2
            })
        );
        assert!(matches!(
            decoded(&[]),
            Err(WireError::Bits(BitError::EndOfBuffer { .. }))
        ));
        assert!(decoded(&[249, 1]).is_err());
    }

    #[test]
    fn non_minimal_encoding_accepted() {
        assert_eq!(decoded(&[250, 5, 0, 0]).unwrap(), 5);
    }

    #[test]
    fn fixed_buffer_write_is_atomic() {
        let mut buf = BitBuffer::fixed(3);
        buf.write_byte(0).unwrap();
        assert!(write_varint(&mut buf, 70_000).is_err());
        assert_eq!(buf.bit_length(), 8);
    }

    #[test]
    fn zigzag_known_values() {
        assert_eq!(zigzag_encode(0), 0);
        assert_eq!(zigzag_encode(-1), 1);
        assert_eq!(zigzag_encode(1), 2);
        assert_eq!(zigzag_encode(-2), 3);
        assert_eq!(zigzag_encode(i64::MAX), u64::MAX - 1);
        assert_eq!(zigzag_encode(i64::MIN), u64::MAX);
        for v in [0, -1, 1, i64::MIN, i64::MAX, -123_456, 987_654] {
            assert_eq!(zigzag_decode(zigzag_encode(v)), v);
        }
    }

    #[test]
    fn narrowing_reads() {
        let bytes = encoded(70_000);
        assert!(matches!(
            read_varint_u16(&mut BitReader::new(&bytes)),
            Err(WireError::Malformed(Malformed::Overflow { target: "u16", .. }))
        ));
        assert_eq!(read_varint_u32(&mut BitReader::new(&bytes)).unwrap(), 70_000);

        let mut buf = BitBuffer::new();
        write_varint_signed(&mut buf, i64::from(i16::MIN)).unwrap();
        write_varint_signed(&mut buf, i64::from(i16::MIN) - 1).unwrap();
        let bytes = buf.into_bytes();
        let mut reader = BitReader::new(&bytes);
        assert_eq!(read_varint_i16(&mut reader).unwrap(), i16::MIN);
        assert!(read_varint_i16(&mut reader).is_err());
    }

    #[test]
    fn fixed_width_little_endian() {
        let mut buf = BitBuffer::new();
        write_u16_le(&mut buf, 0x1234).unwrap();
        write_u32_le(&mut buf, 0xDEAD_BEEF).unwrap();
        write_u64_le(&mut buf, 1).unwrap();
        let bytes = buf.into_bytes();
        assert_eq!(&bytes[..2], &[0x34, 0x12]);
        let mut reader = BitReader::new(&bytes);
        assert_eq!(read_u16_le(&mut reader).unwrap(), 0x1234);
        assert_eq!(read_u32_le(&mut reader).unwrap(), 0xDEAD_BEEF);
        assert_eq!(read_u64_le(&mut reader).unwrap(), 1);
    }
}
