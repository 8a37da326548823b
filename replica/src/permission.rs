//! Client identities and read/write permission policies.

use std::fmt;
use std::sync::Arc;

/// Identity of a connected peer. The server is always [`ClientId::SERVER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClientId(u64);

impl ClientId {
    pub const SERVER: Self = Self(0);

    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn is_server(self) -> bool {
        self.0 == Self::SERVER.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Externally supplied permission check.
pub type PermissionCheck = Arc<dyn Fn(ClientId) -> bool + Send + Sync>;

/// Who may mutate a replicated value.
#[derive(Clone, Default)]
pub enum WritePermission {
    Everyone,
    #[default]
    ServerOnly,
    OwnerOnly,
    Custom(PermissionCheck),
}

impl WritePermission {
    /// Creates a policy backed by `check`.
    pub fn custom(check: impl Fn(ClientId) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(check))
    }

    /// Whether `client` may write a value owned by `owner`.
    #[must_use]
    pub fn allows(&self, client: ClientId, owner: ClientId) -> bool {
        match self {
            Self::Everyone => true,
            Self::ServerOnly => client.is_server(),
            Self::OwnerOnly => client == owner,
            Self::Custom(check) => check(client),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Everyone => "everyone",
            Self::ServerOnly => "server_only",
            Self::OwnerOnly => "owner_only",
            Self::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for WritePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Who may receive a replicated value.
#[derive(Clone, Default)]
pub enum ReadPermission {
    #[default]
    Everyone,
    OwnerOnly,
    ServerOnly,
    Custom(PermissionCheck),
}

impl ReadPermission {
    /// Creates a policy backed by `check`.
    pub fn custom(check: impl Fn(ClientId) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(check))
    }

    /// Whether `client` may read a value owned by `owner`.
    #[must_use]
    pub fn allows(&self, client: ClientId, owner: ClientId) -> bool {
        match self {
            Self::Everyone => true,
            Self::OwnerOnly => client == owner,
            Self::ServerOnly => client.is_server(),
            Self::Custom(check) => check(client),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Everyone => "everyone",
            Self::OwnerOnly => "owner_only",
            Self::ServerOnly => "server_only",
            Self::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for ReadPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
