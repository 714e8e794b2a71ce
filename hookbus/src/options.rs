//! Hook configuration (spec §6).
//!
//! `HookOptions` is the already-materialized configuration object the core
//! accepts; loading it from a file or key/value store is external (§1).
//! Doc-comment-per-field in the style of `monocoque_core::options::SocketOptions`.
//!
//! §6's `eventMap` (pattern -> handler, installed via `on` at construction)
//! is not a field here: a handler is a closure, and `HookOptions` needs to
//! stay `Clone`/`Debug` to serve as a plain configuration object (it is
//! itself embedded in `ChildHookSpec`). `Hook::new` takes the event map as
//! a separate constructor argument instead.

use serde_json::Value;
use std::path::PathBuf;

/// One auxiliary transport binding: a type key plus its adapter-specific
/// options (§6 `transports`).
#[derive(Debug, Clone)]
pub struct TransportSpec {
    /// Looked up in a `TransportRegistry` to find the adapter implementation.
    pub type_key: String,
    /// Opaque, adapter-specific configuration.
    pub options: Value,
}

/// One child-hook specification for the external spawner (§6 `hooks`).
#[derive(Debug, Clone)]
pub struct ChildHookSpec {
    /// Passed to `Spawner::spawn_child` verbatim.
    pub name: String,
    pub options: HookOptions,
}

/// Already-materialized hook configuration.
///
/// Constructed by the caller (struct literal or `HookOptionsBuilder`); no
/// file/env loader lives in this crate (§1 Non-goals).
#[derive(Debug, Clone)]
pub struct HookOptions {
    /// `name` / `hook-name`. Renamed by the broker on connect if it
    /// collides with an already-registered peer (§3 invariant).
    pub name: String,

    /// `type` / `hook-type`. Opaque to the core; carried through `report`.
    pub r#type: String,

    /// `hook-port`. The TCP port to listen on (server role) or connect to
    /// (client role).
    pub port: u16,

    /// `hook-host`. An IPv4/IPv6 literal or DNS name, resolved at start
    /// time (§4.5.2 step 1).
    pub host: String,

    /// `hook-socket`. Reserved for a local-socket transport; unused by the
    /// TCP-only transport this workspace ships.
    pub socket: Option<PathBuf>,

    /// This hook's own semantic version, compared against the broker's
    /// under strict inequality on connect (§4.5.3 step 3).
    pub version: String,

    /// `debug`. Raises the default log verbosity when set.
    pub debug: bool,

    /// `quiet`. Suppresses the default log sink entirely.
    pub quiet: bool,

    /// `noConfig`. Present for CLI-serialization fidelity; this crate never
    /// loads a config file regardless of this flag's value.
    pub no_config: bool,

    /// `transports`. Auxiliary sinks invoked alongside the primary RPC path
    /// on every emit (§4.5.5 step 4).
    pub transports: Vec<TransportSpec>,

    /// `hooks`. Child-hook specifications handed to the external `Spawner`
    /// once this hook reaches `hook::started` (§4.5.4).
    pub hooks: Vec<ChildHookSpec>,
}

impl Default for HookOptions {
    fn default() -> Self {
        Self {
            name: "no-name".to_string(),
            r#type: "hook".to_string(),
            port: 5000,
            host: "127.0.0.1".to_string(),
            socket: None,
            version: "0.1.0".to_string(),
            debug: false,
            quiet: false,
            no_config: false,
            transports: Vec::new(),
            hooks: Vec::new(),
        }
    }
}

/// Builder for `HookOptions`, mirroring the `with_*` style of
/// `SocketOptions`.
#[derive(Debug, Clone, Default)]
pub struct HookOptionsBuilder {
    options: HookOptions,
}

impl HookOptionsBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.options.name = name.into();
        self
    }

    #[must_use]
    pub fn hook_type(mut self, r#type: impl Into<String>) -> Self {
        self.options.r#type = r#type.into();
        self
    }

    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.options.port = port;
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.options.host = host.into();
        self
    }

    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.options.version = version.into();
        self
    }

    #[must_use]
    pub const fn debug(mut self, debug: bool) -> Self {
        self.options.debug = debug;
        self
    }

    #[must_use]
    pub fn transport(mut self, spec: TransportSpec) -> Self {
        self.options.transports.push(spec);
        self
    }

    #[must_use]
    pub fn child_hook(mut self, spec: ChildHookSpec) -> Self {
        self.options.hooks.push(spec);
        self
    }

    #[must_use]
    pub fn build(self) -> HookOptions {
        self.options
    }
}
