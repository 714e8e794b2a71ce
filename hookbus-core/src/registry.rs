//! Server-side peer registry (spec §4.3).
//!
//! Maps each connected peer's session id to its metadata, and mirrors each
//! peer's subscription set as a multiset of topic pattern -> listener count
//! so that `add`/`remove` pairs are safe even under reordering or retries.
//! Grounded on the teacher's `RouterHub` peer table (`HashMap<Bytes,
//! Sender<PeerCmd>>` plus an LB rotation list) and `PubSubHub`'s
//! epoch-checked peer map in `monocoque-core/src/router.rs` and
//! `monocoque-core/src/pubsub/hub.rs`.

use hashbrown::HashMap;

/// Opaque RPC session identifier, assigned by the transport layer on
/// accept.
pub type SessionId = u64;

/// A connected peer's callback handles, as seen by the registry. The
/// registry doesn't know how to actually call a peer — that's the RPC
/// transport's job — it only needs a stable token to hand back to the
/// caller that owns the live connection.
pub type CallbackHandle = SessionId;

/// Metadata the server keeps about one connected peer (§3 `PeerRecord`).
#[derive(Debug, Clone)]
pub struct PeerRecord {
    pub name: String,
    pub r#type: String,
    pub session_id: SessionId,
    pub remote_address: String,
    pub remote_port: u16,
    /// Topic pattern -> listener count. Non-negative; a pattern is removed
    /// when its count reaches zero (§3 invariant).
    pub subscriptions: HashMap<String, u32>,
    pub callback_handle: CallbackHandle,
}

impl PeerRecord {
    #[must_use]
    pub fn has_subscription(&self, pattern: &str) -> bool {
        self.subscriptions.get(pattern).is_some_and(|&n| n > 0)
    }
}

/// A freshly accepted peer's self-reported descriptor (§4.4 `report`).
#[derive(Debug, Clone)]
pub struct PeerReport {
    pub name: String,
    pub r#type: String,
    pub initial_topics: Vec<String>,
}

/// The kind of subscription change a meta-event or initial report encodes
/// (§4.3 `adjust_subscription`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionChange {
    Add,
    Remove,
    RemoveAll,
}

/// Server-side peer registry: one per broker hook.
#[derive(Default)]
pub struct Registry {
    peers: HashMap<SessionId, PeerRecord>,
    /// Names currently in use, including the server's own reserved name.
    names_in_use: hashbrown::HashSet<String>,
    server_name: String,
}

impl Registry {
    #[must_use]
    pub fn new(server_name: impl Into<String>) -> Self {
        let server_name = server_name.into();
        let mut names_in_use = hashbrown::HashSet::new();
        names_in_use.insert(server_name.clone());
        Self {
            peers: HashMap::new(),
            names_in_use,
            server_name,
        }
    }

    #[must_use]
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// Suffixes `requested` with `-0`, `-1`, ... until the name is free and
    /// isn't the server's own reserved name (§4.3 `assign_name`).
    pub fn assign_name(&mut self, requested: &str) -> String {
        if !self.names_in_use.contains(requested) {
            self.names_in_use.insert(requested.to_string());
            return requested.to_string();
        }

        let mut suffix = 0u64;
        loop {
            let candidate = format!("{requested}-{suffix}");
            if !self.names_in_use.contains(&candidate) {
                self.names_in_use.insert(candidate.clone());
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Records a newly accepted peer. Returns the name actually assigned
    /// (possibly suffixed).
    pub fn upsert(
        &mut self,
        session_id: SessionId,
        remote_address: String,
        remote_port: u16,
        report: PeerReport,
    ) -> String {
        let assigned = self.assign_name(&report.name);

        let mut subscriptions = HashMap::new();
        for topic in report.initial_topics {
            *subscriptions.entry(topic).or_insert(0) += 1;
        }

        self.peers.insert(
            session_id,
            PeerRecord {
                name: assigned.clone(),
                r#type: report.r#type,
                session_id,
                remote_address,
                remote_port,
                subscriptions,
                callback_handle: session_id,
            },
        );

        assigned
    }

    /// Seeds the broker's own self-entry under its already-reserved name
    /// (§4.5.2 step 2), bypassing `assign_name` — the server's name must
    /// land exactly, never suffixed.
    pub fn upsert_self(&mut self, session_id: SessionId, remote_address: String, remote_port: u16, r#type: String) {
        self.peers.insert(
            session_id,
            PeerRecord {
                name: self.server_name.clone(),
                r#type,
                session_id,
                remote_address,
                remote_port,
                subscriptions: HashMap::new(),
                callback_handle: session_id,
            },
        );
    }

    #[must_use]
    pub fn by_session(&self, session_id: SessionId) -> Option<&PeerRecord> {
        self.peers.get(&session_id)
    }

    #[must_use]
    pub fn by_session_mut(&mut self, session_id: SessionId) -> Option<&mut PeerRecord> {
        self.peers.get_mut(&session_id)
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&PeerRecord> {
        self.peers.values().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerRecord> {
        self.peers.values()
    }

    /// Drops a peer's record and frees its name for reuse, on connection
    /// end (§3 PeerRecord lifecycle: "destroyed on connection end").
    pub fn remove(&mut self, session_id: SessionId) -> Option<PeerRecord> {
        let record = self.peers.remove(&session_id)?;
        self.names_in_use.remove(&record.name);
        Some(record)
    }

    /// Mutates `peer_name`'s subscription multiset per `kind` at `topic`.
    /// `Add` increments, `Remove` decrements and deletes the key at zero,
    /// `RemoveAll` deletes the key outright (§4.3).
    pub fn adjust_subscription(&mut self, peer_name: &str, kind: SubscriptionChange, topic: &str) {
        let Some(peer) = self.peers.values_mut().find(|p| p.name == peer_name) else {
            return;
        };

        match kind {
            SubscriptionChange::Add => {
                *peer.subscriptions.entry(topic.to_string()).or_insert(0) += 1;
            }
            SubscriptionChange::Remove => {
                if let Some(count) = peer.subscriptions.get_mut(topic) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        peer.subscriptions.remove(topic);
                    }
                }
            }
            SubscriptionChange::RemoveAll => {
                peer.subscriptions.remove(topic);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(name: &str) -> PeerReport {
        PeerReport {
            name: name.to_string(),
            r#type: "hook".to_string(),
            initial_topics: Vec::new(),
        }
    }

    #[test]
    fn assign_name_uniquifies_on_conflict() {
        let mut reg = Registry::new("broker");
        assert_eq!(reg.upsert(1, "127.0.0.1".into(), 1000, report("worker")), "worker");
        assert_eq!(reg.upsert(2, "127.0.0.1".into(), 1001, report("worker")), "worker-0");
        assert_eq!(reg.upsert(3, "127.0.0.1".into(), 1002, report("worker")), "worker-1");
    }

    #[test]
    fn server_name_is_reserved() {
        let mut reg = Registry::new("broker");
        assert_eq!(reg.upsert(1, "127.0.0.1".into(), 1000, report("broker")), "broker-0");
    }

    #[test]
    fn remove_frees_the_name() {
        let mut reg = Registry::new("broker");
        reg.upsert(1, "127.0.0.1".into(), 1000, report("worker"));
        reg.remove(1);
        assert_eq!(reg.upsert(2, "127.0.0.1".into(), 1001, report("worker")), "worker");
    }

    #[test]
    fn add_then_remove_restores_prior_count() {
        let mut reg = Registry::new("broker");
        reg.upsert(1, "127.0.0.1".into(), 1000, report("worker"));
        reg.adjust_subscription("worker", SubscriptionChange::Add, "alpha::*");
        reg.adjust_subscription("worker", SubscriptionChange::Add, "alpha::*");
        reg.adjust_subscription("worker", SubscriptionChange::Remove, "alpha::*");
        assert_eq!(
            reg.by_name("worker").unwrap().subscriptions.get("alpha::*"),
            Some(&1)
        );
    }

    #[test]
    fn remove_deletes_key_at_zero() {
        let mut reg = Registry::new("broker");
        reg.upsert(1, "127.0.0.1".into(), 1000, report("worker"));
        reg.adjust_subscription("worker", SubscriptionChange::Add, "alpha::*");
        reg.adjust_subscription("worker", SubscriptionChange::Remove, "alpha::*");
        assert!(!reg.by_name("worker").unwrap().has_subscription("alpha::*"));
    }
}
