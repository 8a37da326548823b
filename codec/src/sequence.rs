//! Change-bitmask deltas for ordered sequences.
//!
//! Delta form: marker, varint length, `ceil(len/8)` mask bytes (bit `i` of
//! the sequence at byte `i/8`, bit `i%8`), then for each set bit either an
//! element delta (index existed before) or a full element (new index).

use bitstream::{BitCounter, BitRead, BitWrite};
use bitvec::prelude::{BitSlice, BitVec, Lsb0};
use log::debug;
use wire::{read_len, varint_len, write_len, Malformed, NetSerde};

use crate::delta::{read_marker, DeltaSerde, Marker, DELTA_MARKER, FULL_MARKER};
use crate::error::{CodecError, CodecResult};
use crate::scratch::DeltaScratch;

/// Whether the full form carries its own length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extent {
    Growable,
    Fixed,
}

impl<E: DeltaSerde> DeltaSerde for Vec<E> {
    fn ser_delta_with(
        &self,
        previous: &Self,
        w: &mut dyn BitWrite,
        scratch: &mut DeltaScratch,
    ) -> CodecResult<()> {
        write_sequence_delta(self, previous, Extent::Growable, w, scratch)
    }

    fn de_delta(&mut self, r: &mut dyn BitRead) -> CodecResult<()> {
        match read_marker(r)? {
            Marker::Full => *self = Self::de(r)?,
            Marker::Delta => {
                let len = read_len(r)?;
                let staged = read_changes(self.as_slice(), len, r)?;
                self.truncate(len);
                for (index, item) in staged {
                    if index < self.len() {
                        self[index] = item;
                    } else {
                        self.push(item);
                    }
                }
            }
        }
        Ok(())
    }
}

impl<E: DeltaSerde, const N: usize> DeltaSerde for [E; N] {
    fn ser_delta_with(
        &self,
        previous: &Self,
        w: &mut dyn BitWrite,
        scratch: &mut DeltaScratch,
    ) -> CodecResult<()> {
        write_sequence_delta(self, previous, Extent::Fixed, w, scratch)
    }

    fn de_delta(&mut self, r: &mut dyn BitRead) -> CodecResult<()> {
        match read_marker(r)? {
            Marker::Full => *self = Self::de(r)?,
            Marker::Delta => {
                let len = read_len(r)?;
                if len != N {
                    return Err(CodecError::LengthMismatch {
                        expected: N,
                        found: len,
                    });
                }
                let staged = read_changes(self.as_slice(), len, r)?;
                for (index, item) in staged {
                    self[index] = item;
                }
            }
        }
        Ok(())
    }
}

fn write_sequence_delta<E: DeltaSerde>(
    current: &[E],
    previous: &[E],
    extent: Extent,
    w: &mut dyn BitWrite,
    scratch: &mut DeltaScratch,
) -> CodecResult<()> {
    let len = current.len();
    if len == 0 {
        debug!("sequence delta: full rewrite of empty sequence");
        return write_full(current, extent, w);
    }

    let mut mask = scratch.take_mask(len);
    let result = choose_and_write(current, previous, extent, &mut mask, w, scratch);
    scratch.restore_mask(mask);
    result
}

fn choose_and_write<E: DeltaSerde>(
    current: &[E],
    previous: &[E],
    extent: Extent,
    mask: &mut BitVec<u8, Lsb0>,
    w: &mut dyn BitWrite,
    scratch: &mut DeltaScratch,
) -> CodecResult<()> {
    let len = current.len();
    let mut changed = 0usize;
    for (index, item) in current.iter().enumerate() {
        if previous.get(index).map_or(true, |prev| prev != item) {
            mask.set(index, true);
            changed += 1;
        }
    }

    if changed * 10 >= len * 9 {
        debug!("sequence delta: full rewrite, {changed} of {len} elements changed");
        return write_full(current, extent, w);
    }

    let mut counter = BitCounter::new();
    write_delta_body(current, previous, mask.as_bitslice(), &mut counter, scratch)?;
    let delta_bits = counter.bits();
    let full_bits = full_cost(current, extent)?;
    if delta_bits >= full_bits {
        debug!("sequence delta: full rewrite, delta {delta_bits} bits >= full {full_bits} bits");
        return write_full(current, extent, w);
    }

    debug!(
        "sequence delta: {changed} of {len} elements changed, {delta_bits} bits vs full {full_bits}"
    );
    write_delta_body(current, previous, mask.as_bitslice(), w, scratch)
}

fn write_delta_body<E: DeltaSerde>(
    current: &[E],
    previous: &[E],
    mask: &BitSlice<u8, Lsb0>,
    w: &mut dyn BitWrite,
    scratch: &mut DeltaScratch,
) -> CodecResult<()> {
    w.write_byte(DELTA_MARKER)?;
    write_len(w, current.len())?;
    write_mask(mask, w)?;
    for index in mask.iter_ones() {
        let item = &current[index];
        match previous.get(index) {
            Some(prev) => item.ser_delta_with(prev, w, scratch)?,
            None => item.ser(w)?,
        }
    }
    Ok(())
}

fn write_full<E: NetSerde>(current: &[E], extent: Extent, w: &mut dyn BitWrite) -> CodecResult<()> {
    w.write_byte(FULL_MARKER)?;
    if extent == Extent::Growable {
        write_len(w, current.len())?;
    }
    for item in current {
        item.ser(w)?;
    }
    Ok(())
}

fn full_cost<E: NetSerde>(current: &[E], extent: Extent) -> CodecResult<usize> {
    let mut bits = 8;
    if extent == Extent::Growable {
        bits += varint_len(current.len() as u64) * 8;
    }
    for item in current {
        bits += item.encoded_bits()?;
    }
    Ok(bits)
}

fn write_mask(mask: &BitSlice<u8, Lsb0>, w: &mut dyn BitWrite) -> CodecResult<()> {
    for chunk in mask.chunks(8) {
        let byte = chunk.iter_ones().fold(0u8, |byte, bit| byte | (1 << bit));
        w.write_byte(byte)?;
    }
    Ok(())
}

fn read_mask(r: &mut dyn BitRead, len: usize) -> CodecResult<BitVec<u8, Lsb0>> {
    let byte_len = len.div_ceil(8);
    let available_bits = r.bits_remaining();
    if byte_len * 8 > available_bits {
        return Err(Malformed::LengthExceedsInput {
            length: len as u64,
            available_bits,
        }
        .into());
    }
    let mut bytes = vec![0u8; byte_len];
    r.read_bytes(&mut bytes)?;
    let mut mask = BitVec::<u8, Lsb0>::from_vec(bytes);
    mask.truncate(len);
    Ok(mask)
}

/// Decodes the changed elements of a delta against `existing` without
/// touching it, returning `(index, value)` pairs in ascending index order.
fn read_changes<E: DeltaSerde>(
    existing: &[E],
    len: usize,
    r: &mut dyn BitRead,
) -> CodecResult<Vec<(usize, E)>> {
    let mask = read_mask(r, len)?;
    if let Some(index) = (existing.len()..len).find(|&index| !mask[index]) {
        return Err(Malformed::MaskGap { index }.into());
    }

    let mut staged = Vec::with_capacity(mask.count_ones());
    for index in mask.iter_ones() {
        let item = match existing.get(index) {
            Some(prev) => {
                let mut item = prev.clone();
                item.de_delta(r)?;
                item
            }
            None => E::de(r)?,
        };
        staged.push((index, item));
    }
    Ok(staged)
}
