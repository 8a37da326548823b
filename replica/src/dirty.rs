//! Dirty-tracked replicated values.

use std::fmt;
use std::time::Instant;

use bitstream::{BitBuffer, BitRead, BitWrite};
use codec::{DeltaScratch, DeltaSerde};
use log::{debug, trace};

use crate::config::VarSettings;
use crate::error::{ReplicaError, ReplicaResult};
use crate::ClientId;

type ChangeCallback<T> = Box<dyn FnMut(&T, &T) + Send>;
type Threshold<T> = Box<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// A replicated value with change tracking.
///
/// The value is compared against a snapshot of what the remote side last
/// received; deltas are always written against that snapshot. A value only
/// becomes clean through [`reset_dirty`](Self::reset_dirty) (or
/// [`sync`](Self::sync)), which also replaces the snapshot.
pub struct DirtyValue<T: DeltaSerde> {
    value: T,
    snapshot: T,
    dirty: bool,
    last_sent: Option<Instant>,
    owner: ClientId,
    settings: VarSettings,
    on_change: Option<ChangeCallback<T>>,
    threshold: Option<Threshold<T>>,
    scratch: DeltaScratch,
}

impl<T: DeltaSerde> DirtyValue<T> {
    /// Creates a clean value with default settings, owned by the server.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self::with_settings(value, VarSettings::default())
    }

    #[must_use]
    pub fn with_settings(value: T, settings: VarSettings) -> Self {
        Self {
            snapshot: value.clone(),
            value,
            dirty: false,
            last_sent: None,
            owner: ClientId::SERVER,
            settings,
            on_change: None,
            threshold: None,
            scratch: DeltaScratch::new(),
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    /// The value as last sent or received.
    pub fn snapshot(&self) -> &T {
        &self.snapshot
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn settings(&self) -> &VarSettings {
        &self.settings
    }

    pub fn owner(&self) -> ClientId {
        self.owner
    }

    pub fn set_owner(&mut self, owner: ClientId) {
        self.owner = owner;
    }

    pub fn last_sent(&self) -> Option<Instant> {
        self.last_sent
    }

    /// Registers the callback invoked with `(previous, current)` on every local
    /// change and on every value received from a peer.
    pub fn on_change(&mut self, callback: impl FnMut(&T, &T) + Send + 'static) {
        self.on_change = Some(Box::new(callback));
    }

    pub fn clear_on_change(&mut self) {
        self.on_change = None;
    }

    /// Registers the dirtiness threshold, called with `(last sent, current)`.
    ///
    /// Without one every change exceeds the threshold.
    pub fn set_threshold(&mut self, threshold: impl Fn(&T, &T) -> bool + Send + Sync + 'static) {
        self.threshold = Some(Box::new(threshold));
    }

    pub fn can_write(&self, client: ClientId) -> bool {
        self.settings.write.allows(client, self.owner)
    }

    pub fn can_read(&self, client: ClientId) -> bool {
        self.settings.read.allows(client, self.owner)
    }

    /// Replaces the value on behalf of `writer`.
    ///
    /// Assigning an equal value is a no-op.
    pub fn set(&mut self, writer: ClientId, value: T) -> ReplicaResult<()> {
        self.check_write(writer)?;
        if value == self.value {
            return Ok(());
        }
        let previous = std::mem::replace(&mut self.value, value);
        self.dirty = true;
        self.notify(&previous);
        Ok(())
    }

    /// Edits the value in place on behalf of `writer`.
    ///
    /// The value is marked dirty only if the edit changed it.
    pub fn modify<R>(&mut self, writer: ClientId, edit: impl FnOnce(&mut T) -> R) -> ReplicaResult<R> {
        self.check_write(writer)?;
        let previous = self.value.clone();
        let result = edit(&mut self.value);
        if previous != self.value {
            self.dirty = true;
            self.notify(&previous);
        }
        Ok(result)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// Acknowledges a send: clears the flag, records `now` and makes the
    /// current value the new snapshot.
    pub fn reset_dirty(&mut self, now: Instant) {
        self.dirty = false;
        self.last_sent = Some(now);
        self.snapshot.clone_from(&self.value);
    }

    /// Whether the value is due for sending at `now`.
    pub fn should_send(&self, now: Instant) -> bool {
        if !self.dirty {
            return false;
        }
        let Some(last_sent) = self.last_sent else {
            return true;
        };
        let elapsed = now.saturating_duration_since(last_sent);
        let traits = self.settings.traits;
        if traits.max_interval.is_some_and(|max| elapsed >= max) {
            return true;
        }
        elapsed >= traits.min_interval && self.exceeds_threshold()
    }

    fn exceeds_threshold(&self) -> bool {
        self.threshold
            .as_ref()
            .map_or(true, |threshold| threshold(&self.snapshot, &self.value))
    }

    /// Writes the complete value.
    pub fn write_field(&self, w: &mut dyn BitWrite) -> ReplicaResult<()> {
        self.value.ser(w)?;
        Ok(())
    }

    /// Replaces the value with a complete encoding read from `r`.
    pub fn read_field(&mut self, r: &mut dyn BitRead) -> ReplicaResult<()> {
        let incoming = T::de(r)?;
        self.accept(incoming, false);
        Ok(())
    }

    /// Writes the change from the snapshot to the current value.
    pub fn write_delta(&mut self, w: &mut dyn BitWrite) -> ReplicaResult<()> {
        self.value
            .ser_delta_with(&self.snapshot, w, &mut self.scratch)?;
        Ok(())
    }

    /// Applies a delta written by the remote [`write_delta`](Self::write_delta).
    ///
    /// With `keep_dirty` the value is marked dirty and the snapshot keeps the
    /// pre-image, so the next delta forwards the received change.
    pub fn read_delta(&mut self, r: &mut dyn BitRead, keep_dirty: bool) -> ReplicaResult<()> {
        let mut incoming = self.value.clone();
        incoming.de_delta(r)?;
        self.accept(incoming, keep_dirty);
        Ok(())
    }

    /// Writes the delta and acknowledges it. On failure nothing is written
    /// and the value stays dirty.
    pub fn sync(&mut self, w: &mut BitBuffer, now: Instant) -> ReplicaResult<()> {
        w.rollback_on_error(|buffer| self.write_delta(buffer))?;
        trace!("synced value at bit {}", w.position());
        self.reset_dirty(now);
        Ok(())
    }

    fn check_write(&self, writer: ClientId) -> ReplicaResult<()> {
        if self.can_write(writer) {
            return Ok(());
        }
        let permission = self.settings.write.name();
        debug!("rejected write from client {writer} ({permission} value owned by {})", self.owner);
        Err(ReplicaError::PermissionDenied {
            client: writer,
            permission,
        })
    }

    fn accept(&mut self, incoming: T, keep_dirty: bool) {
        let previous = std::mem::replace(&mut self.value, incoming);
        if keep_dirty {
            self.dirty = true;
        } else {
            self.snapshot.clone_from(&self.value);
        }
        self.notify(&previous);
    }

    fn notify(&mut self, previous: &T) {
        if let Some(callback) = self.on_change.as_mut() {
            callback(previous, &self.value);
        }
    }
}

impl<T: DeltaSerde + Default> Default for DirtyValue<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: DeltaSerde + fmt::Debug> fmt::Debug for DirtyValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirtyValue")
            .field("value", &self.value)
            .field("dirty", &self.dirty)
            .field("owner", &self.owner)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
