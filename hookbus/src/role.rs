//! Explicit role state machine (design note §9, "control-flow shape").
//!
//! `start`'s listen-then-fall-back-to-connect is modeled as a two-stage
//! future over this state machine rather than a loose enum swapped in
//! place; illegal transitions return an error instead of panicking, the
//! same discipline the teacher applies to its own connection states
//! (`monocoque-zmtp/src/session.rs`).

use hookbus_core::error::{HookError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Unstarted,
    Listening,
    Connecting,
    Server,
    Client,
    Stopped,
}

impl Role {
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Server | Self::Client)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unstarted => "unstarted",
            Self::Listening => "listening",
            Self::Connecting => "connecting",
            Self::Server => "server",
            Self::Client => "client",
            Self::Stopped => "stopped",
        }
    }
}

/// Tracks the current role and rejects transitions the lifecycle in §4.5
/// never takes (e.g. `Server` straight to `Connecting`).
#[derive(Debug)]
pub struct RoleState {
    current: Role,
}

impl Default for RoleState {
    fn default() -> Self {
        Self {
            current: Role::Unstarted,
        }
    }
}

impl RoleState {
    #[must_use]
    pub const fn get(&self) -> Role {
        self.current
    }

    /// `start` begins the listen attempt (§4.5.1).
    pub fn begin_listening(&mut self) -> Result<()> {
        self.guard(Role::Unstarted, Role::Listening)
    }

    /// Listen bound successfully; role is now immutably `Server`.
    pub fn commit_server(&mut self) -> Result<()> {
        self.guard(Role::Listening, Role::Server)
    }

    /// Listen failed with a bind conflict; fall back to `connect` (§4.5.1).
    pub fn begin_connecting(&mut self) -> Result<()> {
        self.guard(Role::Listening, Role::Connecting)
    }

    /// Connect succeeded and the server accepted our `report`; role is now
    /// immutably `Client`.
    pub fn commit_client(&mut self) -> Result<()> {
        self.guard(Role::Connecting, Role::Client)
    }

    /// `stop`/`kill` retires an established role.
    pub fn stop(&mut self) -> Result<()> {
        if !self.current.is_active() {
            return Err(HookError::NothingToStop);
        }
        self.current = Role::Stopped;
        Ok(())
    }

    fn guard(&mut self, expected: Role, next: Role) -> Result<()> {
        if self.current != expected {
            return Err(HookError::protocol(format!(
                "illegal role transition: {} -> {} (expected from {})",
                self.current.as_str(),
                next.as_str(),
                expected.as_str()
            )));
        }
        self.current = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_path_commits_in_order() {
        let mut role = RoleState::default();
        role.begin_listening().unwrap();
        role.commit_server().unwrap();
        assert_eq!(role.get(), Role::Server);
    }

    #[test]
    fn client_fallback_path_commits_in_order() {
        let mut role = RoleState::default();
        role.begin_listening().unwrap();
        role.begin_connecting().unwrap();
        role.commit_client().unwrap();
        assert_eq!(role.get(), Role::Client);
    }

    #[test]
    fn illegal_transition_is_rejected() {
        let mut role = RoleState::default();
        assert!(role.commit_server().is_err());
    }

    #[test]
    fn stop_requires_an_active_role() {
        let mut role = RoleState::default();
        assert!(matches!(role.stop(), Err(HookError::NothingToStop)));
    }
}
