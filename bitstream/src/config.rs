//! Sizing configuration for buffers and pools.

/// Growth factor used when a configured factor is `<= 1.0` or not finite.
pub const FALLBACK_GROWTH_FACTOR: f32 = 1.5;

/// Initial sizing and growth policy of a resizable [`BitBuffer`](crate::BitBuffer).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BufferConfig {
    /// Initial allocation in bytes.
    pub initial_capacity: usize,

    /// Multiplier applied to the capacity each time a write outgrows it.
    pub growth_factor: f32,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
            growth_factor: 2.0,
        }
    }
}

impl BufferConfig {
    /// A tiny buffer that grows often, for exercising growth paths in tests.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            initial_capacity: 1,
            growth_factor: 1.5,
        }
    }

    /// Growth factor with invalid values coerced to [`FALLBACK_GROWTH_FACTOR`].
    #[must_use]
    pub fn effective_growth_factor(&self) -> f32 {
        sanitize_growth_factor(self.growth_factor)
    }
}

pub(crate) fn sanitize_growth_factor(factor: f32) -> f32 {
    if factor.is_finite() && factor > 1.0 {
        factor
    } else {
        FALLBACK_GROWTH_FACTOR
    }
}

/// Bounds of a [`BufferPool`](crate::BufferPool).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolConfig {
    /// Maximum number of idle buffers kept for reuse.
    pub max_retained: usize,

    /// Maximum number of pooled buffers handed out at once. Acquisitions
    /// beyond this get a transient buffer that is never pooled.
    pub max_outstanding: usize,

    /// Buffers that grew beyond this many bytes are dropped on release.
    pub max_retained_capacity: usize,

    /// Configuration for freshly allocated buffers.
    pub buffer: BufferConfig,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_retained: 64,
            max_outstanding: 1024,
            max_retained_capacity: 64 * 1024,
            buffer: BufferConfig::default(),
        }
    }
}

impl PoolConfig {
    /// Small bounds that are easy to hit in tests.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_retained: 2,
            max_outstanding: 4,
            max_retained_capacity: 256,
            buffer: BufferConfig::for_testing(),
        }
    }

    /// No bounds on retention or outstanding buffers (use with caution).
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_retained: usize::MAX,
            max_outstanding: usize::MAX,
            max_retained_capacity: usize::MAX,
            buffer: BufferConfig::default(),
        }
    }
}
