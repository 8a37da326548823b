//! Type-erased variables and grouped delta messages.
//!
//! A group message is a varint variable count, one presence bit per
//! variable, then the delta of every present variable in declaration order.
//! Both peers must declare the same variables in the same order.

use std::time::Instant;

use bitstream::{BitBuffer, BitRead, BitWrite};
use codec::DeltaSerde;
use log::debug;
use wire::{read_varint_usize, write_len};

use crate::error::{ReplicaError, ReplicaResult};
use crate::{ClientId, DirtyValue};

/// Object-safe view of a [`DirtyValue`] for schedulers driving many values.
pub trait NetworkVariable {
    fn is_dirty(&self) -> bool;

    fn should_send(&self, now: Instant) -> bool;

    fn can_read(&self, client: ClientId) -> bool;

    fn can_write(&self, client: ClientId) -> bool;

    /// Name of the write policy, for diagnostics.
    fn write_permission(&self) -> &'static str;

    fn write_field(&self, w: &mut dyn BitWrite) -> ReplicaResult<()>;

    fn read_field(&mut self, r: &mut dyn BitRead) -> ReplicaResult<()>;

    fn write_delta(&mut self, w: &mut dyn BitWrite) -> ReplicaResult<()>;

    fn read_delta(&mut self, r: &mut dyn BitRead, keep_dirty: bool) -> ReplicaResult<()>;

    fn reset_dirty(&mut self, now: Instant);
}

impl<T: DeltaSerde> NetworkVariable for DirtyValue<T> {
    fn is_dirty(&self) -> bool {
        DirtyValue::is_dirty(self)
    }

    fn should_send(&self, now: Instant) -> bool {
        DirtyValue::should_send(self, now)
    }

    fn can_read(&self, client: ClientId) -> bool {
        DirtyValue::can_read(self, client)
    }

    fn can_write(&self, client: ClientId) -> bool {
        DirtyValue::can_write(self, client)
    }

    fn write_permission(&self) -> &'static str {
        self.settings().write.name()
    }

    fn write_field(&self, w: &mut dyn BitWrite) -> ReplicaResult<()> {
        DirtyValue::write_field(self, w)
    }

    fn read_field(&mut self, r: &mut dyn BitRead) -> ReplicaResult<()> {
        DirtyValue::read_field(self, r)
    }

    fn write_delta(&mut self, w: &mut dyn BitWrite) -> ReplicaResult<()> {
        DirtyValue::write_delta(self, w)
    }

    fn read_delta(&mut self, r: &mut dyn BitRead, keep_dirty: bool) -> ReplicaResult<()> {
        DirtyValue::read_delta(self, r, keep_dirty)
    }

    fn reset_dirty(&mut self, now: Instant) {
        DirtyValue::reset_dirty(self, now);
    }
}

/// Writes every variable due at `now` that `client` may read, then
/// acknowledges the written ones. Returns how many were written.
///
/// On error nothing is written and no variable is acknowledged.
pub fn write_dirty_group(
    vars: &mut [&mut dyn NetworkVariable],
    client: ClientId,
    now: Instant,
    w: &mut BitBuffer,
) -> ReplicaResult<usize> {
    let due: Vec<bool> = vars
        .iter()
        .map(|var| var.should_send(now) && var.can_read(client))
        .collect();

    w.rollback_on_error(|buffer| -> ReplicaResult<()> {
        write_len(buffer, vars.len())?;
        for &present in &due {
            buffer.write_bit(present)?;
        }
        for (var, &present) in vars.iter_mut().zip(&due) {
            if present {
                var.write_delta(buffer)?;
            }
        }
        Ok(())
    })?;

    let mut sent = 0;
    for (var, &present) in vars.iter_mut().zip(&due) {
        if present {
            var.reset_dirty(now);
            sent += 1;
        }
    }
    debug!("wrote {sent} of {} variables for client {client}", vars.len());
    Ok(sent)
}

/// Applies a group message written by `sender`. Returns how many variables
/// were updated.
///
/// Each variable is applied atomically. A variable `sender` may not write
/// aborts the message before it is read; variables applied before it keep
/// their new values.
pub fn read_dirty_group(
    vars: &mut [&mut dyn NetworkVariable],
    sender: ClientId,
    keep_dirty: bool,
    r: &mut dyn BitRead,
) -> ReplicaResult<usize> {
    let count = read_varint_usize(r)?;
    if count != vars.len() {
        return Err(ReplicaError::GroupMismatch {
            expected: vars.len(),
            found: count,
        });
    }
    let mut present = Vec::with_capacity(count);
    for _ in 0..count {
        present.push(r.read_bit()?);
    }

    let mut applied = 0;
    for (index, var) in vars.iter_mut().enumerate() {
        if !present[index] {
            continue;
        }
        if !var.can_write(sender) {
            debug!("client {sender} sent variable {index} it may not write");
            return Err(ReplicaError::PermissionDenied {
                client: sender,
                permission: var.write_permission(),
            });
        }
        var.read_delta(r, keep_dirty)?;
        applied += 1;
    }
    Ok(applied)
}
