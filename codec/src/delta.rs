//! Delta serialization contract and envelope markers.
//!
//! Every delta starts with a one-byte marker. [`FULL_MARKER`] is followed by
//! the value's complete [`NetSerde`] encoding; [`DELTA_MARKER`] is followed by
//! a shape-specific change description (see the sequence, set and map impls).
//! Scalars have no delta form and always write their full encoding without a
//! marker.

use bitstream::{BitBuffer, BitRead, BitReader, BitWrite};
use wire::{Malformed, NetSerde};

use crate::error::CodecResult;
use crate::scratch::DeltaScratch;

/// Marker byte introducing a change description.
pub const DELTA_MARKER: u8 = 0;

/// Marker byte introducing a complete rewrite.
pub const FULL_MARKER: u8 = 1;

/// Serialize a value relative to a previous state known to the receiver.
///
/// `de_delta` must be applied to the exact pre-image that `ser_delta`
/// compared against. On error the receiving value is left untouched.
pub trait DeltaSerde: NetSerde + Clone + PartialEq {
    /// Writes the change from `previous` to `self`, reusing `scratch`.
    fn ser_delta_with(
        &self,
        previous: &Self,
        w: &mut dyn BitWrite,
        scratch: &mut DeltaScratch,
    ) -> CodecResult<()> {
        let _ = (previous, scratch);
        self.ser(w)?;
        Ok(())
    }

    /// Writes the change from `previous` to `self`.
    fn ser_delta(&self, previous: &Self, w: &mut dyn BitWrite) -> CodecResult<()> {
        self.ser_delta_with(previous, w, &mut DeltaScratch::new())
    }

    /// Applies a change written by [`ser_delta`](Self::ser_delta).
    fn de_delta(&mut self, r: &mut dyn BitRead) -> CodecResult<()> {
        *self = Self::de(r)?;
        Ok(())
    }
}

macro_rules! impl_full_delta {
    ($($ty:ty),* $(,)?) => {
        $(impl DeltaSerde for $ty {})*
    };
}

impl_full_delta!(bool, u8, i8, u16, u32, u64, usize, i16, i32, i64, f32, f64, String);

impl<T: DeltaSerde> DeltaSerde for Option<T> {}

/// Which envelope a delta uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Marker {
    Delta,
    Full,
}

pub(crate) fn read_marker(r: &mut dyn BitRead) -> CodecResult<Marker> {
    match r.read_byte()? {
        DELTA_MARKER => Ok(Marker::Delta),
        FULL_MARKER => Ok(Marker::Full),
        marker => Err(Malformed::InvalidMarker { marker }.into()),
    }
}

/// Encodes the delta from `previous` to `current` into a fresh byte vector.
pub fn encode_delta<T: DeltaSerde>(current: &T, previous: &T) -> CodecResult<Vec<u8>> {
    let mut buffer = BitBuffer::new();
    current.ser_delta(previous, &mut buffer)?;
    Ok(buffer.into_bytes())
}

/// Applies delta bytes produced by [`encode_delta`] to `value`.
pub fn apply_delta<T: DeltaSerde>(value: &mut T, bytes: &[u8]) -> CodecResult<()> {
    value.de_delta(&mut BitReader::new(bytes))
}
