//! Hookbus error types.
//!
//! Comprehensive error handling for all hookbus operations.

use std::io;
use thiserror::Error;

/// Main error type for hookbus operations.
#[derive(Error, Debug)]
pub enum HookError {
    /// IO error during socket operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Protocol error during RPC framing or dispatch.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The listen address is already in use; the hook should fall back to
    /// connecting as a client.
    #[error("bind error: {0}")]
    Bind(String),

    /// DNS/host resolution failed or returned no addresses.
    #[error("resolve error: {0}")]
    Resolve(String),

    /// The broker's reported version and ours differ under strict
    /// inequality.
    #[error("version mismatch: local={local} remote={remote}")]
    VersionMismatch { local: String, remote: String },

    /// `stop` was called on a hook that has no active role.
    #[error("nothing to stop")]
    NothingToStop,

    /// `kill` was called with a child name the spawner does not know about.
    #[error("nothing to kill: {0}")]
    NothingToKill(String),

    /// `kill` was called with no target on a hook acting as broker.
    #[error("cannot kill server")]
    CannotKillServer,

    /// Any other RPC/socket error that doesn't fit a more specific variant.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Result type alias for hookbus operations.
pub type Result<T> = std::result::Result<T, HookError>;

impl HookError {
    #[must_use]
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    #[must_use]
    pub fn bind(msg: impl Into<String>) -> Self {
        Self::Bind(msg.into())
    }

    #[must_use]
    pub fn resolve(msg: impl Into<String>) -> Self {
        Self::Resolve(msg.into())
    }

    #[must_use]
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Whether a start-time failure should be treated as recoverable by
    /// falling back from `listen` to `connect` (§4.5.1).
    #[must_use]
    pub const fn is_bind_conflict(&self) -> bool {
        matches!(self, Self::Bind(_))
    }
}
