//! Value encodings for netvar replication payloads.
//!
//! This crate defines how scalars and plain collections are laid out on top of
//! a [`bitstream`] buffer: byte-prefixed varints, zig-zag signed integers,
//! fixed/packed/quantized floats, length-prefixed strings, and the
//! [`NetSerde`] contract tying them to Rust types.
//!
//! # Design Principles
//!
//! - **Stable wire format** - Band thresholds and byte orders are constants, not runtime state.
//! - **Bounded decoding** - Declared lengths are validated against the remaining input before allocation.
//! - **Fail fast on encode** - Preconditions are checked before any bit is written.
//!
//! # Example
//!
//! ```
//! use bitstream::{BitBuffer, BitReader};
//! use wire::{read_varint, write_varint};
//!
//! let mut buffer = BitBuffer::new();
//! write_varint(&mut buffer, 67_824).unwrap();
//! assert_eq!(buffer.as_bytes(), &[250, 0xF0, 0x08, 0x01]);
//!
//! let mut reader = BitReader::new(buffer.as_bytes());
//! assert_eq!(read_varint(&mut reader).unwrap(), 67_824);
//! ```

mod error;
mod float;
mod netserde;
mod varint;

pub use error::{Malformed, RangeError, WireError, WireResult};
pub use float::{
    read_f32_fixed, read_f32_packed, read_f64_fixed, read_f64_packed, read_ranged_f32,
    read_ranged_f64, write_f32_fixed, write_f32_packed, write_f64_fixed, write_f64_packed,
    write_ranged_f32, write_ranged_f64, Ranged, MAX_RANGED_F32_BYTES, MAX_RANGED_F64_BYTES,
};
pub use netserde::{
    decode, encode, read_byte_array, read_len, read_string, write_byte_array, write_len,
    write_str, NetSerde,
};
pub use varint::{
    encode_varint, read_u16_le, read_u32_le, read_u64_le, read_varint, read_varint_i16,
    read_varint_i32, read_varint_signed, read_varint_u16, read_varint_u32, read_varint_usize,
    varint_len, write_u16_le, write_u32_le, write_u64_le, write_varint, write_varint_signed,
    zigzag_decode, zigzag_encode, MAX_VARINT_BYTES, ONE_BYTE_MAX, THREE_BYTE_MAX, TWO_BYTE_MAX,
};
