//! Added/removed deltas for unordered sets.
//!
//! Delta form: marker, varint count of added elements, the added elements,
//! varint count of removed elements, the removed elements.

use std::collections::{BTreeSet, HashSet};
use std::hash::{BuildHasher, Hash};

use bitstream::{BitRead, BitWrite};
use log::debug;
use wire::{read_len, write_len, NetSerde, WireResult};

use crate::delta::{read_marker, DeltaSerde, Marker, DELTA_MARKER, FULL_MARKER};
use crate::error::CodecResult;
use crate::scratch::DeltaScratch;

impl<T, S> DeltaSerde for HashSet<T, S>
where
    T: NetSerde + Eq + Hash + Clone,
    S: BuildHasher + Default + Clone,
{
    fn ser_delta_with(
        &self,
        previous: &Self,
        w: &mut dyn BitWrite,
        _scratch: &mut DeltaScratch,
    ) -> CodecResult<()> {
        let added: Vec<&T> = self.difference(previous).collect();
        let removed: Vec<&T> = previous.difference(self).collect();
        write_set_delta(self.len(), &added, &removed, w, |w| self.ser(w))
    }

    fn de_delta(&mut self, r: &mut dyn BitRead) -> CodecResult<()> {
        match read_marker(r)? {
            Marker::Full => *self = Self::de(r)?,
            Marker::Delta => {
                let (added, removed) = read_set_parts::<T>(r)?;
                self.extend(added);
                for item in &removed {
                    self.remove(item);
                }
            }
        }
        Ok(())
    }
}

impl<T> DeltaSerde for BTreeSet<T>
where
    T: NetSerde + Ord + Clone,
{
    fn ser_delta_with(
        &self,
        previous: &Self,
        w: &mut dyn BitWrite,
        _scratch: &mut DeltaScratch,
    ) -> CodecResult<()> {
        let added: Vec<&T> = self.difference(previous).collect();
        let removed: Vec<&T> = previous.difference(self).collect();
        write_set_delta(self.len(), &added, &removed, w, |w| self.ser(w))
    }

    fn de_delta(&mut self, r: &mut dyn BitRead) -> CodecResult<()> {
        match read_marker(r)? {
            Marker::Full => *self = Self::de(r)?,
            Marker::Delta => {
                let (added, removed) = read_set_parts::<T>(r)?;
                self.extend(added);
                for item in &removed {
                    self.remove(item);
                }
            }
        }
        Ok(())
    }
}

fn write_set_delta<T: NetSerde>(
    len: usize,
    added: &[&T],
    removed: &[&T],
    w: &mut dyn BitWrite,
    write_full: impl FnOnce(&mut dyn BitWrite) -> WireResult<()>,
) -> CodecResult<()> {
    if added.len() + removed.len() >= len {
        debug!(
            "set delta: full rewrite, {} added {} removed of {len}",
            added.len(),
            removed.len()
        );
        w.write_byte(FULL_MARKER)?;
        write_full(w)?;
        return Ok(());
    }

    debug!(
        "set delta: {} added {} removed of {len}",
        added.len(),
        removed.len()
    );
    w.write_byte(DELTA_MARKER)?;
    write_len(w, added.len())?;
    for item in added {
        item.ser(w)?;
    }
    write_len(w, removed.len())?;
    for item in removed {
        item.ser(w)?;
    }
    Ok(())
}

fn read_set_parts<T: NetSerde>(r: &mut dyn BitRead) -> CodecResult<(Vec<T>, Vec<T>)> {
    let added = read_items(r)?;
    let removed = read_items(r)?;
    Ok((added, removed))
}

fn read_items<T: NetSerde>(r: &mut dyn BitRead) -> CodecResult<Vec<T>> {
    let len = read_len(r)?;
    let items = (0..len).map(|_| T::de(r)).collect::<WireResult<Vec<T>>>()?;
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{apply_delta, encode_delta, CodecError};
    use wire::Malformed;

    #[test]
    fn small_change_uses_delta_form() {
        let previous: BTreeSet<u32> = (0..10).collect();
        let mut current = previous.clone();
        current.insert(42);
        current.remove(&3);
        let bytes = encode_delta(&current, &previous).unwrap();
        assert_eq!(bytes, vec![DELTA_MARKER, 1, 42, 1, 3]);

        let mut received = previous.clone();
        apply_delta(&mut received, &bytes).unwrap();
        assert_eq!(received, current);
    }

    #[test]
    fn large_change_uses_full_form() {
        let previous: BTreeSet<u32> = [1, 2, 3].into_iter().collect();
        let current: BTreeSet<u32> = [4, 5, 6].into_iter().collect();
        let bytes = encode_delta(&current, &previous).unwrap();
        assert_eq!(bytes[0], FULL_MARKER);

        let mut received = previous.clone();
        apply_delta(&mut received, &bytes).unwrap();
        assert_eq!(received, current);
    }

    #[test]
    fn hash_set_delta() {
        let previous: HashSet<String> = ["a", "b", "c", "d", "e"]
            .into_iter()
            .map(String::from)
            .collect();
        let mut current = previous.clone();
        current.insert("z".to_string());
        let bytes = encode_delta(&current, &previous).unwrap();
        assert_eq!(bytes[0], DELTA_MARKER);

        let mut received = previous.clone();
        apply_delta(&mut received, &bytes).unwrap();
        assert_eq!(received, current);
    }

    #[test]
    fn emptied_set_uses_full_form() {
        let previous: BTreeSet<u8> = [1, 2].into_iter().collect();
        let bytes = encode_delta(&BTreeSet::new(), &previous).unwrap();
        assert_eq!(bytes, vec![FULL_MARKER, 0]);
    }

    #[test]
    fn truncated_delta_leaves_set_untouched() {
        let previous: BTreeSet<u32> = (0..10).collect();
        let mut received = previous.clone();
        // two added elements announced, one present
        let err = apply_delta(&mut received, &[DELTA_MARKER, 2, 50]).unwrap_err();
        assert!(matches!(err, CodecError::Wire(_)));
        assert_eq!(received, previous);
    }

    #[test]
    fn invalid_marker_is_rejected() {
        let mut received: BTreeSet<u8> = BTreeSet::new();
        let err = apply_delta(&mut received, &[3]).unwrap_err();
        assert_eq!(err, CodecError::from(Malformed::InvalidMarker { marker: 3 }));
    }
}
