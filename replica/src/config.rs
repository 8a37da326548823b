//! Per-variable send throttling and settings.

use std::time::Duration;

use crate::{ReadPermission, WritePermission};

/// Send throttling for one replicated value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UpdateTraits {
    /// Minimum time between two sends of a dirty value.
    pub min_interval: Duration,
    /// Time after which a dirty value is sent even below its threshold.
    pub max_interval: Option<Duration>,
}

impl UpdateTraits {
    /// No throttling: a dirty value is due immediately.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            min_interval: Duration::ZERO,
            max_interval: None,
        }
    }

    /// Short intervals for deterministic tests.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            min_interval: Duration::from_millis(10),
            max_interval: Some(Duration::from_millis(100)),
        }
    }

    #[must_use]
    pub const fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    #[must_use]
    pub const fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = Some(interval);
        self
    }
}

/// Permissions and throttling of one replicated value.
#[derive(Debug, Clone, Default)]
pub struct VarSettings {
    pub read: ReadPermission,
    pub write: WritePermission,
    pub traits: UpdateTraits,
}

impl VarSettings {
    #[must_use]
    pub fn with_read(mut self, read: ReadPermission) -> Self {
        self.read = read;
        self
    }

    #[must_use]
    pub fn with_write(mut self, write: WritePermission) -> Self {
        self.write = write;
        self
    }

    #[must_use]
    pub fn with_traits(mut self, traits: UpdateTraits) -> Self {
        self.traits = traits;
        self
    }
}
