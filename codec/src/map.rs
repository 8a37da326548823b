//! Added/removed/changed deltas for maps.
//!
//! Delta form: marker, then three varint-counted lists in fixed order:
//! added `(key, value)` pairs, removed keys, changed `(key, value)` pairs.
//! The receiver applies them in the same order.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use bitstream::{BitRead, BitWrite};
use log::debug;
use wire::{read_len, write_len, NetSerde, WireResult};

use crate::delta::{read_marker, DeltaSerde, Marker, DELTA_MARKER, FULL_MARKER};
use crate::error::CodecResult;
use crate::scratch::DeltaScratch;

struct MapChanges<'a, K, V> {
    added: Vec<(&'a K, &'a V)>,
    removed: Vec<&'a K>,
    changed: Vec<(&'a K, &'a V)>,
}

impl<K, V> MapChanges<'_, K, V> {
    fn count(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len()
    }
}

struct StagedChanges<K, V> {
    added: Vec<(K, V)>,
    removed: Vec<K>,
    changed: Vec<(K, V)>,
}

macro_rules! map_changes {
    ($current:expr, $previous:expr) => {{
        let mut changes = MapChanges {
            added: Vec::new(),
            removed: Vec::new(),
            changed: Vec::new(),
        };
        for (key, value) in $current {
            match $previous.get(key) {
                None => changes.added.push((key, value)),
                Some(old) if old != value => changes.changed.push((key, value)),
                Some(_) => {}
            }
        }
        changes.removed = $previous
            .keys()
            .filter(|key| !$current.contains_key(*key))
            .collect();
        changes
    }};
}

impl<K, V, S> DeltaSerde for HashMap<K, V, S>
where
    K: NetSerde + Eq + Hash + Clone,
    V: NetSerde + Clone + PartialEq,
    S: BuildHasher + Default + Clone,
{
    fn ser_delta_with(
        &self,
        previous: &Self,
        w: &mut dyn BitWrite,
        _scratch: &mut DeltaScratch,
    ) -> CodecResult<()> {
        let changes = map_changes!(self, previous);
        write_map_delta(self.len(), &changes, w, |w| self.ser(w))
    }

    fn de_delta(&mut self, r: &mut dyn BitRead) -> CodecResult<()> {
        match read_marker(r)? {
            Marker::Full => *self = Self::de(r)?,
            Marker::Delta => {
                let staged = read_map_parts::<K, V>(r)?;
                self.extend(staged.added);
                for key in &staged.removed {
                    self.remove(key);
                }
                self.extend(staged.changed);
            }
        }
        Ok(())
    }
}

impl<K, V> DeltaSerde for BTreeMap<K, V>
where
    K: NetSerde + Ord + Clone,
    V: NetSerde + Clone + PartialEq,
{
    fn ser_delta_with(
        &self,
        previous: &Self,
        w: &mut dyn BitWrite,
        _scratch: &mut DeltaScratch,
    ) -> CodecResult<()> {
        let changes = map_changes!(self, previous);
        write_map_delta(self.len(), &changes, w, |w| self.ser(w))
    }

    fn de_delta(&mut self, r: &mut dyn BitRead) -> CodecResult<()> {
        match read_marker(r)? {
            Marker::Full => *self = Self::de(r)?,
            Marker::Delta => {
                let staged = read_map_parts::<K, V>(r)?;
                self.extend(staged.added);
                for key in &staged.removed {
                    self.remove(key);
                }
                self.extend(staged.changed);
            }
        }
        Ok(())
    }
}

fn write_map_delta<K: NetSerde, V: NetSerde>(
    len: usize,
    changes: &MapChanges<'_, K, V>,
    w: &mut dyn BitWrite,
    write_full: impl FnOnce(&mut dyn BitWrite) -> WireResult<()>,
) -> CodecResult<()> {
    let (added, removed, changed) = (
        changes.added.len(),
        changes.removed.len(),
        changes.changed.len(),
    );
    if changes.count() >= len {
        debug!("map delta: full rewrite, {added} added {removed} removed {changed} changed of {len}");
        w.write_byte(FULL_MARKER)?;
        write_full(w)?;
        return Ok(());
    }

    debug!("map delta: {added} added {removed} removed {changed} changed of {len}");
    w.write_byte(DELTA_MARKER)?;
    write_pairs(&changes.added, w)?;
    write_len(w, removed)?;
    for key in &changes.removed {
        key.ser(w)?;
    }
    write_pairs(&changes.changed, w)?;
    Ok(())
}

fn write_pairs<K: NetSerde, V: NetSerde>(
    pairs: &[(&K, &V)],
    w: &mut dyn BitWrite,
) -> CodecResult<()> {
    write_len(w, pairs.len())?;
    for (key, value) in pairs {
        key.ser(w)?;
        value.ser(w)?;
    }
    Ok(())
}

fn read_map_parts<K: NetSerde, V: NetSerde>(
    r: &mut dyn BitRead,
) -> CodecResult<StagedChanges<K, V>> {
    let added = read_pairs(r)?;
    let removed_len = read_len(r)?;
    let removed = (0..removed_len)
        .map(|_| K::de(r))
        .collect::<WireResult<Vec<K>>>()?;
    let changed = read_pairs(r)?;
    Ok(StagedChanges {
        added,
        removed,
        changed,
    })
}

fn read_pairs<K: NetSerde, V: NetSerde>(r: &mut dyn BitRead) -> CodecResult<Vec<(K, V)>> {
    let len = read_len(r)?;
    let pairs = (0..len)
        .map(|_| Ok((K::de(r)?, V::de(r)?)))
        .collect::<WireResult<Vec<(K, V)>>>()?;
    Ok(pairs)
}
