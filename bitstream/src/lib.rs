//! Bit-level buffers for netvar replication payloads.
//!
//! This crate provides [`BitBuffer`], a growable bit-addressable buffer,
//! [`BitReader`] for zero-copy decoding of received bytes, [`BitCounter`] for
//! pricing an encoding without writing it, and [`BufferPool`] for reusing
//! buffers across messages.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **LSB-first** - Sub-byte writes fill each byte from its least-significant bit.
//! - **Fail before writing** - A write that cannot complete leaves the buffer untouched.
//! - **No domain knowledge** - This crate knows nothing about varints, floats or replicated values.
//!
//! # Example
//!
//! ```
//! use bitstream::{BitBuffer, BitRead, BitReader, BitWrite};
//!
//! let mut buffer = BitBuffer::new();
//! buffer.write_bit(true).unwrap();
//! buffer.write_bits(42, 7).unwrap();
//!
//! let bytes = buffer.into_bytes();
//!
//! let mut reader = BitReader::new(&bytes);
//! assert!(reader.read_bit().unwrap());
//! assert_eq!(reader.read_bits(7).unwrap(), 42);
//! ```

mod buffer;
mod config;
mod error;
mod pool;
mod reader;
mod writer;

pub use buffer::{BitBuffer, SeekOrigin};
pub use config::{BufferConfig, PoolConfig, FALLBACK_GROWTH_FACTOR};
pub use error::{BitError, BitResult};
pub use pool::{BufferPool, PoolStats, PooledBuffer};
pub use reader::{BitRead, BitReader};
pub use writer::{BitCounter, BitWrite};
