//! External spawner interface (§1, §4.5.4, §6 `hooks`).
//!
//! Child-process spawning and supervision are explicitly out of scope; this
//! module defines only the interface the hook runtime consumes, plus a
//! `NoopSpawner` for hooks that configure no children.

use crate::options::ChildHookSpec;
use hookbus_core::error::{HookError, Result};

/// The external collaborator that actually forks/execs child hook
/// processes and supervises them. Out of scope (§1) — only the contract
/// lives here.
#[async_trait::async_trait(?Send)]
pub trait Spawner {
    /// Spawns `spec` as a child process. Returns once the child has been
    /// launched, not once it is ready; readiness is signaled back via the
    /// `children::ready` protocol (§4.5.4).
    async fn spawn_child(&self, spec: &ChildHookSpec) -> Result<()>;

    /// Terminates a previously spawned child by name (§4.5.7 `kill`).
    async fn kill_child(&self, name: &str) -> Result<()>;
}

/// A `Spawner` for hooks configured with no children. Any call is a usage
/// error: there is nothing to spawn or kill.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSpawner;

#[async_trait::async_trait(?Send)]
impl Spawner for NoopSpawner {
    async fn spawn_child(&self, spec: &ChildHookSpec) -> Result<()> {
        Err(HookError::protocol(format!(
            "NoopSpawner cannot spawn child '{}': no spawner configured",
            spec.name
        )))
    }

    async fn kill_child(&self, name: &str) -> Result<()> {
        Err(HookError::NothingToKill(name.to_string()))
    }
}
