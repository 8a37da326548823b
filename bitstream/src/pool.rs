//! Bounded pool of reusable [`BitBuffer`]s with scoped acquisition.

use std::ops::{Deref, DerefMut};

use log::{trace, warn};
use parking_lot::Mutex;

use crate::buffer::BitBuffer;
use crate::config::PoolConfig;
use crate::error::BitResult;

/// Counters describing the current state of a [`BufferPool`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Idle buffers waiting for reuse.
    pub free: usize,
    /// Pooled buffers currently handed out.
    pub outstanding: usize,
    /// Buffers allocated by the pool over its lifetime (excluding transients).
    pub allocated: usize,
    /// Unpooled buffers currently handed out because the bound was hit.
    pub transient: usize,
}

#[derive(Debug, Default)]
struct PoolState {
    free: Vec<BitBuffer>,
    outstanding: usize,
    allocated: usize,
    transient: usize,
}

/// A pool of buffers shared by reference.
///
/// [`acquire`](Self::acquire) hands out a [`PooledBuffer`] guard that returns
/// the buffer on drop, so release happens on every exit path. Returned
/// buffers are always reset before they can be handed out again.
#[derive(Debug)]
pub struct BufferPool {
    config: PoolConfig,
    state: Mutex<PoolState>,
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl BufferPool {
    #[must_use]
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            state: Mutex::new(PoolState::default()),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Takes an empty buffer from the pool, allocating one if none is free.
    ///
    /// Past `max_outstanding` a transient buffer is returned instead; it
    /// behaves the same but is discarded on release.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let mut state = self.state.lock();
        if state.outstanding >= self.config.max_outstanding {
            state.transient += 1;
            warn!(
                "buffer pool exhausted ({} outstanding), allocating transient buffer",
                state.outstanding
            );
            drop(state);
            return PooledBuffer {
                pool: self,
                buffer: BitBuffer::with_config(self.config.buffer),
                lease: Lease::Transient,
            };
        }
        state.outstanding += 1;
        let buffer = if let Some(buffer) = state.free.pop() {
            trace!("buffer pool acquire: reused ({} free)", state.free.len());
            buffer
        } else {
            state.allocated += 1;
            trace!("buffer pool acquire: allocated #{}", state.allocated);
            BitBuffer::with_config(self.config.buffer)
        };
        PooledBuffer {
            pool: self,
            buffer,
            lease: Lease::Pooled,
        }
    }

    /// Acquires a buffer pre-loaded with received bytes, cursor at 0.
    pub fn acquire_with(&self, bytes: &[u8]) -> BitResult<PooledBuffer<'_>> {
        let mut guard = self.acquire();
        guard.load(bytes)?;
        Ok(guard)
    }

    /// Offers a buffer (for example one taken with [`PooledBuffer::detach`])
    /// to the free list.
    ///
    /// The buffer is reset. Fixed buffers, buffers larger than
    /// `max_retained_capacity`, and buffers arriving at a full free list are
    /// dropped.
    pub fn release(&self, buffer: BitBuffer) {
        let mut state = self.state.lock();
        self.retain(&mut state, buffer);
    }

    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        PoolStats {
            free: state.free.len(),
            outstanding: state.outstanding,
            allocated: state.allocated,
            transient: state.transient,
        }
    }

    fn retain(&self, state: &mut PoolState, mut buffer: BitBuffer) {
        if !buffer.is_resizable() {
            trace!("buffer pool release: fixed buffer dropped");
            return;
        }
        if buffer.capacity() > self.config.max_retained_capacity {
            warn!(
                "buffer pool release: dropping buffer of {} bytes (limit {})",
                buffer.capacity(),
                self.config.max_retained_capacity
            );
            return;
        }
        if state.free.len() >= self.config.max_retained {
            trace!("buffer pool release: free list full, buffer dropped");
            return;
        }
        buffer.reset();
        state.free.push(buffer);
        trace!("buffer pool release: {} free", state.free.len());
    }

    fn give_back(&self, buffer: BitBuffer) {
        let mut state = self.state.lock();
        state.outstanding = state.outstanding.saturating_sub(1);
        self.retain(&mut state, buffer);
    }

    fn forget_outstanding(&self) {
        let mut state = self.state.lock();
        state.outstanding = state.outstanding.saturating_sub(1);
    }

    fn end_transient(&self) {
        let mut state = self.state.lock();
        state.transient = state.transient.saturating_sub(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lease {
    Pooled,
    Transient,
    Detached,
}

/// A buffer on loan from a [`BufferPool`]; goes back to the pool on drop.
#[derive(Debug)]
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buffer: BitBuffer,
    lease: Lease,
}

impl PooledBuffer<'_> {
    /// Returns `true` if this buffer came from the free list or a pooled
    /// allocation rather than the overflow path.
    #[must_use]
    pub fn is_pooled(&self) -> bool {
        self.lease == Lease::Pooled
    }

    /// Takes the buffer out of the pool's care.
    ///
    /// The pool stops counting it as outstanding; it can be handed back
    /// later with [`BufferPool::release`].
    #[must_use]
    pub fn detach(mut self) -> BitBuffer {
        let buffer = std::mem::replace(&mut self.buffer, BitBuffer::fixed(0));
        match self.lease {
            Lease::Pooled => self.pool.forget_outstanding(),
            Lease::Transient => self.pool.end_transient(),
            Lease::Detached => {}
        }
        self.lease = Lease::Detached;
        buffer
    }
}

impl Deref for PooledBuffer<'_> {
    type Target = BitBuffer;

    fn deref(&self) -> &BitBuffer {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut BitBuffer {
        &mut self.buffer
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        match self.lease {
            Lease::Pooled => {
                let buffer = std::mem::replace(&mut self.buffer, BitBuffer::fixed(0));
                self.pool.give_back(buffer);
            }
            Lease::Transient => self.pool.end_transient(),
            Lease::Detached => {}
        }
    }
}
