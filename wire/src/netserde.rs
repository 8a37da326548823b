//! Per-type serialization contract.
//!
//! Every replicated type implements [`NetSerde`] explicitly; there is no
//! runtime type inspection. The impls below cover the primitive and
//! collection shapes the replication layer supports.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::{BuildHasher, Hash};

use bitstream::{BitBuffer, BitCounter, BitRead, BitReader, BitWrite};

use crate::error::{Malformed, WireError, WireResult};
use crate::float::{read_f32_packed, read_f64_packed, write_f32_packed, write_f64_packed};
use crate::varint::{
    read_varint, read_varint_i16, read_varint_i32, read_varint_signed, read_varint_u16,
    read_varint_u32, read_varint_usize, write_varint, write_varint_signed,
};

/// Serialize and deserialize a value against a bit stream.
pub trait NetSerde: Sized {
    fn ser(&self, w: &mut dyn BitWrite) -> WireResult<()>;

    fn de(r: &mut dyn BitRead) -> WireResult<Self>;

    /// Exact number of bits [`ser`](Self::ser) writes for this value.
    fn encoded_bits(&self) -> WireResult<usize> {
        let mut counter = BitCounter::new();
        self.ser(&mut counter)?;
        Ok(counter.bits())
    }
}

/// Encodes a single value into a fresh byte vector.
pub fn encode<T: NetSerde>(value: &T) -> WireResult<Vec<u8>> {
    let mut buffer = BitBuffer::new();
    value.ser(&mut buffer)?;
    Ok(buffer.into_bytes())
}

/// Decodes a single value from the start of `bytes`.
pub fn decode<T: NetSerde>(bytes: &[u8]) -> WireResult<T> {
    T::de(&mut BitReader::new(bytes))
}

/// Writes a collection length.
pub fn write_len(w: &mut dyn BitWrite, len: usize) -> WireResult<()> {
    write_varint(w, len as u64)
}

/// Reads an element count, rejecting counts that could not fit in the
/// remaining input at one bit per element.
pub fn read_len(r: &mut dyn BitRead) -> WireResult<usize> {
    let raw = read_varint(r)?;
    let available_bits = r.bits_remaining();
    match usize::try_from(raw) {
        Ok(len) if len <= available_bits => Ok(len),
        _ => Err(Malformed::LengthExceedsInput {
            length: raw,
            available_bits,
        }
        .into()),
    }
}

/// Reads a byte count, rejecting counts larger than the remaining input.
fn read_byte_len(r: &mut dyn BitRead) -> WireResult<usize> {
    let raw = read_varint(r)?;
    let available_bits = r.bits_remaining();
    match usize::try_from(raw) {
        Ok(len) if len <= available_bits / 8 => Ok(len),
        _ => Err(Malformed::LengthExceedsInput {
            length: raw,
            available_bits,
        }
        .into()),
    }
}

/// Writes a length-prefixed byte array.
pub fn write_byte_array(w: &mut dyn BitWrite, bytes: &[u8]) -> WireResult<()> {
    write_len(w, bytes.len())?;
    w.write_bytes(bytes)?;
    Ok(())
}

/// Reads a length-prefixed byte array.
pub fn read_byte_array(r: &mut dyn BitRead) -> WireResult<Vec<u8>> {
    let len = read_byte_len(r)?;
    let mut out = vec![0u8; len];
    r.read_bytes(&mut out)?;
    Ok(out)
}

/// Writes a length-prefixed UTF-8 string.
pub fn write_str(w: &mut dyn BitWrite, value: &str) -> WireResult<()> {
    write_byte_array(w, value.as_bytes())
}

/// Reads a length-prefixed UTF-8 string.
pub fn read_string(r: &mut dyn BitRead) -> WireResult<String> {
    let bytes = read_byte_array(r)?;
    String::from_utf8(bytes).map_err(|_| WireError::from(Malformed::InvalidUtf8))
}

impl NetSerde for bool {
    fn ser(&self, w: &mut dyn BitWrite) -> WireResult<()> {
        w.write_bit(*self)?;
        Ok(())
    }

    fn de(r: &mut dyn BitRead) -> WireResult<Self> {
        Ok(r.read_bit()?)
    }
}

impl NetSerde for u8 {
    fn ser(&self, w: &mut dyn BitWrite) -> WireResult<()> {
        w.write_byte(*self)?;
        Ok(())
    }

    fn de(r: &mut dyn BitRead) -> WireResult<Self> {
        Ok(r.read_byte()?)
    }
}

impl NetSerde for i8 {
    fn ser(&self, w: &mut dyn BitWrite) -> WireResult<()> {
        w.write_byte(*self as u8)?;
        Ok(())
    }

    fn de(r: &mut dyn BitRead) -> WireResult<Self> {
        Ok(r.read_byte()? as Self)
    }
}

macro_rules! varint_impl {
    ($($ty:ty => $read:ident),* $(,)?) => {
        $(
            impl NetSerde for $ty {
                fn ser(&self, w: &mut dyn BitWrite) -> WireResult<()> {
                    write_varint(w, *self as u64)
                }

                fn de(r: &mut dyn BitRead) -> WireResult<Self> {
                    $read(r)
                }
            }
        )*
    };
}

varint_impl! {
    u16 => read_varint_u16,
    u32 => read_varint_u32,
    u64 => read_varint,
    usize => read_varint_usize,
}

macro_rules! zigzag_impl {
    ($($ty:ty => $read:ident),* $(,)?) => {
        $(
            impl NetSerde for $ty {
                fn ser(&self, w: &mut dyn BitWrite) -> WireResult<()> {
                    write_varint_signed(w, i64::from(*self))
                }

                fn de(r: &mut dyn BitRead) -> WireResult<Self> {
                    $read(r)
                }
            }
        )*
    };
}

zigzag_impl! {
    i16 => read_varint_i16,
    i32 => read_varint_i32,
    i64 => read_varint_signed,
}

impl NetSerde for f32 {
    fn ser(&self, w: &mut dyn BitWrite) -> WireResult<()> {
        write_f32_packed(w, *self)
    }

    fn de(r: &mut dyn BitRead) -> WireResult<Self> {
        read_f32_packed(r)
    }
}

impl NetSerde for f64 {
    fn ser(&self, w: &mut dyn BitWrite) -> WireResult<()> {
        write_f64_packed(w, *self)
    }

    fn de(r: &mut dyn BitRead) -> WireResult<Self> {
        read_f64_packed(r)
    }
}

impl NetSerde for String {
    fn ser(&self, w: &mut dyn BitWrite) -> WireResult<()> {
        write_str(w, self)
    }

    fn de(r: &mut dyn BitRead) -> WireResult<Self> {
        read_string(r)
    }
}

impl<T: NetSerde> NetSerde for Option<T> {
    fn ser(&self, w: &mut dyn BitWrite) -> WireResult<()> {
        match self {
            Some(value) => {
                w.write_bit(true)?;
                value.ser(w)
            }
            None => {
                w.write_bit(false)?;
                Ok(())
            }
        }
    }

    fn de(r: &mut dyn BitRead) -> WireResult<Self> {
        if r.read_bit()? {
            T::de(r).map(Some)
        } else {
            Ok(None)
        }
    }
}

impl<T: NetSerde> NetSerde for Vec<T> {
    fn ser(&self, w: &mut dyn BitWrite) -> WireResult<()> {
        write_len(w, self.len())?;
        self.iter().try_for_each(|item| item.ser(w))
    }

    fn de(r: &mut dyn BitRead) -> WireResult<Self> {
        let len = read_len(r)?;
        (0..len).map(|_| T::de(r)).collect()
    }
}

impl<T: NetSerde + Eq + Hash, S: BuildHasher + Default> NetSerde for HashSet<T, S> {
    fn ser(&self, w: &mut dyn BitWrite) -> WireResult<()> {
        write_len(w, self.len())?;
        self.iter().try_for_each(|item| item.ser(w))
    }

    fn de(r: &mut dyn BitRead) -> WireResult<Self> {
        let len = read_len(r)?;
        (0..len).map(|_| T::de(r)).collect()
    }
}

impl<T: NetSerde + Ord> NetSerde for BTreeSet<T> {
    fn ser(&self, w: &mut dyn BitWrite) -> WireResult<()> {
        write_len(w, self.len())?;
        self.iter().try_for_each(|item| item.ser(w))
    }

    fn de(r: &mut dyn BitRead) -> WireResult<Self> {
        let len = read_len(r)?;
        (0..len).map(|_| T::de(r)).collect()
    }
}

impl<K, V, S> NetSerde for HashMap<K, V, S>
where
    K: NetSerde + Eq + Hash,
    V: NetSerde,
    S: BuildHasher + Default,
{
    fn ser(&self, w: &mut dyn BitWrite) -> WireResult<()> {
        write_len(w, self.len())?;
        self.iter().try_for_each(|(key, value)| {
            key.ser(w)?;
            value.ser(w)
        })
    }

    fn de(r: &mut dyn BitRead) -> WireResult<Self> {
        let len = read_len(r)?;
        (0..len).map(|_| Ok((K::de(r)?, V::de(r)?))).collect()
    }
}

impl<K: NetSerde + Ord, V: NetSerde> NetSerde for BTreeMap<K, V> {
    fn ser(&self, w: &mut dyn BitWrite) -> WireResult<()> {
        write_len(w, self.len())?;
        self.iter().try_for_each(|(key, value)| {
            key.ser(w)?;
            value.ser(w)
        })
    }

    fn de(r: &mut dyn BitRead) -> WireResult<Self> {
        let len = read_len(r)?;
        (0..len).map(|_| Ok((K::de(r)?, V::de(r)?))).collect()
    }
}

impl<T: NetSerde, const N: usize> NetSerde for [T; N] {
    fn ser(&self, w: &mut dyn BitWrite) -> WireResult<()> {
        self.iter().try_for_each(|item| item.ser(w))
    }

    fn de(r: &mut dyn BitRead) -> WireResult<Self> {
        let items = (0..N).map(|_| T::de(r)).collect::<WireResult<Vec<T>>>()?;
        let available_bits = r.bits_remaining();
        items.try_into().map_err(|_: Vec<T>| {
            WireError::from(Malformed::LengthExceedsInput {
                length: N as u64,
                available_bits,
            })
        })
    }
}

impl<A: NetSerde, B: NetSerde> NetSerde for (A, B) {
    fn ser(&self, w: &mut dyn BitWrite) -> WireResult<()> {
        self.0.ser(w)?;
        self.1.ser(w)
    }

    fn de(r: &mut dyn BitRead) -> WireResult<Self> {
        Ok((A::de(r)?, B::de(r)?))
    }
}

impl<A: NetSerde, B: NetSerde, C: NetSerde> NetSerde for (A, B, C) {
    fn ser(&self, w: &mut dyn BitWrite) -> WireResult<()> {
        self.0.ser(w)?;
        self.1.ser(w)?;
        self.2.ser(w)
    }

    fn de(r: &mut dyn BitRead) -> WireResult<Self> {
        Ok((A::de(r)?, B::de(r)?, C::de(r)?))
    }
}
