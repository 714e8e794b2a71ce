//! Lifecycle topic constants (spec §6).
//!
//! `npm::*` are defined here only as string constants a consumer's
//! `Spawner`/installer could emit (§1: NPM-style installation is out of
//! scope); `hookbus` never emits them itself.

pub const HOOK_LISTENING: &str = "hook::listening";
pub const HOOK_STARTED: &str = "hook::started";
pub const HOOK_READY: &str = "hook::ready";
pub const HOOK_CONNECTED: &str = "hook::connected";
pub const HOOK_DISCONNECTED: &str = "hook::disconnected";
pub const CONNECTION_OPEN: &str = "connection::open";
pub const CONNECTION_END: &str = "connection::end";
pub const ERROR_BIND: &str = "error::bind";
pub const ERROR_RESOLVE: &str = "error::resolve";
pub const ERROR_UNKNOWN: &str = "error::unknown";
pub const CHILDREN_READY: &str = "children::ready";

/// Defined for CLI/spawn-protocol fidelity only; never emitted by this
/// crate (§1 Non-goals: NPM-style hook installation is external).
pub const NPM_INSTALLING: &str = "npm::installing";
pub const NPM_INSTALLED: &str = "npm::installed";
pub const NPM_INSTALL_ERROR: &str = "npm::install::error";

/// The `T::result` topic derived from a synthesized callback's success
/// (§4.5.5 step 3).
#[must_use]
pub fn result_topic(topic: &str) -> String {
    format!("{topic}::result")
}

/// The `T::error` topic derived from a synthesized callback's failure
/// (§4.5.5 step 3).
#[must_use]
pub fn error_topic(topic: &str) -> String {
    format!("{topic}::error")
}
