//! Event emitter with hierarchical topic routing (spec §4.2).
//!
//! `Listener` is the callable capability design note §9 calls for: "a
//! `Listener` is a callable accepting `(data, reply?)`". Meta-events
//! (`listener-added`, `listener-removed`, `all-listeners-removed`) are
//! reserved: they are synthesized directly by `on`/`once`/`off`/`removeAll`
//! and never re-enter `emit`'s own dispatch, matching design note §9's
//! "Meta-event back-channels" — consumers subscribe to them through
//! `on_meta`, a plain channel, not through `onAny`.

use crate::topic::{ListenerId, TopicTree};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Topic emitted once, right after the first listener registers at a
/// pattern.
pub const LISTENER_ADDED: &str = "listener-added";
/// Topic emitted once per listener removed.
pub const LISTENER_REMOVED: &str = "listener-removed";
/// Topic emitted once per `remove_all` call.
pub const ALL_LISTENERS_REMOVED: &str = "all-listeners-removed";

/// Optional reply callback a listener may invoke exactly once.
///
/// Not `Send`: a hook's dispatcher is single-threaded (design note §9,
/// "control-flow shape"), so listeners are free to close over `Rc`/
/// `RefCell` state the way the rest of this workspace does.
pub type Reply = Box<dyn FnOnce(Option<Value>, Option<Value>)>;

/// A registered listener: `(data, reply)`.
pub type Listener = Box<dyn FnMut(&Value, Option<Reply>)>;

/// A global intercept invoked for every emission, topic bound explicitly
/// (Rust has no implicit `this`, so the bound topic is passed as the first
/// argument rather than through `self.event`).
pub type AnyListener = Box<dyn FnMut(&str, &Value)>;

/// Describes which kind of subscription-meta change occurred, mirroring
/// §4.3's `adjust_subscription` kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaKind {
    Add,
    Remove,
    RemoveAll,
}

/// A meta-event observed by the subscription-sync protocol (§4.5.6): which
/// kind of change, and at which pattern.
#[derive(Debug, Clone)]
pub struct MetaEvent {
    pub kind: MetaKind,
    pub pattern: String,
}

/// The embedded event emitter. One instance per hook.
#[derive(Default)]
pub struct EventEmitter {
    tree: TopicTree,
    listeners: HashMap<ListenerId, Listener>,
    /// Pattern a given listener id was registered under, needed to emit
    /// `listener-removed` with the right pattern on `off`.
    pattern_of: HashMap<ListenerId, String>,
    once_ids: HashSet<ListenerId>,
    any: Vec<AnyListener>,
    meta_sink: Option<Box<dyn FnMut(MetaEvent)>>,
}

impl EventEmitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the sink meta-events are routed to instead of the normal
    /// emit pipeline. A hook wires this to its subscription-sync logic
    /// (§4.5.6): client hooks forward to their broker, broker hooks apply
    /// `Registry::adjust_subscription` directly.
    pub fn on_meta(&mut self, sink: impl FnMut(MetaEvent) + 'static) {
        self.meta_sink = Some(Box::new(sink));
    }

    fn emit_meta(&mut self, kind: MetaKind, pattern: &str) {
        if let Some(sink) = &mut self.meta_sink {
            sink(MetaEvent {
                kind,
                pattern: pattern.to_string(),
            });
        }
    }

    /// Registers `listener` at `pattern`. Emits `listener-added` the first
    /// time this pattern gains a listener.
    pub fn on(&mut self, pattern: &str, listener: Listener) -> ListenerId {
        let was_empty = self.tree.at(pattern).is_empty();
        let id = self.tree.add(pattern);
        self.listeners.insert(id, listener);
        self.pattern_of.insert(id, pattern.to_string());

        if was_empty {
            self.emit_meta(MetaKind::Add, pattern);
        }
        id
    }

    /// Registers a listener that auto-removes itself after firing once.
    ///
    /// Implemented by wrapping the caller's closure; the wrapper can't
    /// remove itself directly (it doesn't know its own `ListenerId` until
    /// after registration), so a `once` flag is tracked alongside the
    /// pattern and checked by `emit` after dispatch.
    pub fn once(&mut self, pattern: &str, listener: Listener) -> ListenerId {
        let id = self.on(pattern, listener);
        self.once_ids.insert(id);
        id
    }

    /// Removes the specific listener `id` from `pattern`. Emits
    /// `listener-removed` if a listener was actually present.
    pub fn off(&mut self, pattern: &str, id: ListenerId) {
        if self.tree.remove(pattern, id) {
            self.listeners.remove(&id);
            self.pattern_of.remove(&id);
            self.once_ids.remove(&id);
            self.emit_meta(MetaKind::Remove, pattern);
        }
    }

    /// Removes every listener at `pattern` (or every listener at every
    /// pattern, if `pattern` is `None`). Emits `all-listeners-removed`.
    pub fn remove_all(&mut self, pattern: Option<&str>) {
        match pattern {
            Some(pattern) => {
                for id in self.tree.remove_all(pattern) {
                    self.listeners.remove(&id);
                    self.pattern_of.remove(&id);
                    self.once_ids.remove(&id);
                }
                self.emit_meta(MetaKind::RemoveAll, pattern);
            }
            None => {
                let patterns: Vec<String> = self.tree.enumerate();
                for pattern in patterns {
                    self.remove_all(Some(&pattern));
                }
            }
        }
    }

    /// Returns the listener ids bound at exactly `pattern` (§3
    /// `TopicTree.match` analogue exposed for introspection).
    #[must_use]
    pub fn listeners(&self, pattern: &str) -> Vec<ListenerId> {
        self.tree.at(pattern).to_vec()
    }

    /// Installs the global intercept (§4.2 `onAny`).
    pub fn on_any(&mut self, listener: AnyListener) {
        self.any.push(listener);
    }

    /// Every pattern with at least one registered listener (§3
    /// `TopicTree.enumerate`), used to seed `report`'s `initialTopics` and
    /// the broker's self `PeerRecord` (§4.5.2 step 6, §4.5.3 step 2).
    #[must_use]
    pub fn enumerate(&self) -> Vec<String> {
        self.tree.enumerate()
    }

    /// Whether any registered pattern matches the concrete `topic`, honoring
    /// wildcards. Backs the `hasEvent` RPC method (§4.4): the client's own
    /// tree is authoritative over whether it "has" a given event (§9 Open
    /// Questions).
    #[must_use]
    pub fn has_match(&self, topic: &str) -> bool {
        !self.tree.match_topic(topic).is_empty()
    }

    /// Delivers `topic` to its matching listeners only, skipping the
    /// `onAny` intercepts. Used exclusively for the reserved meta-topics,
    /// which fall through to local delivery but must never re-enter the
    /// cross-peer broadcast path (§4.5.5 step 1) that `onAny` backs.
    pub fn emit_reserved(&mut self, topic: &str, data: &Value) {
        let matches = self.tree.match_topic(topic);
        let mut fired_once = Vec::new();

        for id in matches {
            if let Some(listener) = self.listeners.get_mut(&id) {
                listener(data, None);
            }
            if self.once_ids.contains(&id) {
                fired_once.push(id);
            }
        }

        for id in fired_once {
            if let Some(pattern) = self.pattern_of.get(&id).cloned() {
                self.off(&pattern, id);
            }
        }
    }

    /// Invokes every listener matching `topic`, then every `onAny`
    /// intercept. Reserved meta-topics never reach this path (callers route
    /// them through `on_meta` before calling `emit`, per §4.5.5 step 1).
    pub fn emit(&mut self, topic: &str, data: &Value, reply: Option<Reply>) {
        debug_assert!(
            !matches!(
                topic,
                LISTENER_ADDED | LISTENER_REMOVED | ALL_LISTENERS_REMOVED
            ),
            "meta-topics must be routed through on_meta, not emit"
        );

        let matches = self.tree.match_topic(topic);
        let mut reply = reply;
        let mut fired_once = Vec::new();

        for id in matches {
            if let Some(listener) = self.listeners.get_mut(&id) {
                // Only the first matching listener gets the real reply
                // callback; `reply.take()` leaves `None` for the rest. A
                // single emit has a single reply contract (§4.4), so only
                // one handler can plausibly answer it — in practice emit's
                // callers bind one listener per topic.
                let this_reply = reply.take();
                listener(data, this_reply);
            }
            if self.once_ids.contains(&id) {
                fired_once.push(id);
            }
        }

        for id in fired_once {
            if let Some(pattern) = self.pattern_of.get(&id).cloned() {
                self.off(&pattern, id);
            }
        }

        for any in &mut self.any {
            any(topic, data);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn on_emit_invokes_matching_listener() {
        let mut emitter = EventEmitter::new();
        let received = Arc::new(Mutex::new(Vec::new()));
        let r = received.clone();
        emitter.on(
            "alpha::*",
            Box::new(move |data, _reply| {
                r.lock().unwrap().push(data.clone());
            }),
        );
        emitter.emit("alpha::one", &serde_json::json!({"v": 1}), None);
        assert_eq!(*received.lock().unwrap(), vec![serde_json::json!({"v": 1})]);
    }

    #[test]
    fn off_stops_further_delivery() {
        let mut emitter = EventEmitter::new();
        let count = Arc::new(Mutex::new(0));
        let c = count.clone();
        let id = emitter.on(
            "job",
            Box::new(move |_data, _reply| {
                *c.lock().unwrap() += 1;
            }),
        );
        emitter.emit("job", &Value::Null, None);
        emitter.off("job", id);
        emitter.emit("job", &Value::Null, None);
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn once_listener_fires_a_single_time() {
        let mut emitter = EventEmitter::new();
        let count = Arc::new(Mutex::new(0));
        let c = count.clone();
        emitter.once(
            "job",
            Box::new(move |_data, _reply| {
                *c.lock().unwrap() += 1;
            }),
        );
        emitter.emit("job", &Value::Null, None);
        emitter.emit("job", &Value::Null, None);
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn meta_events_fire_on_first_add_and_each_remove() {
        let mut emitter = EventEmitter::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let e = events.clone();
        emitter.on_meta(move |meta| e.lock().unwrap().push((meta.kind, meta.pattern)));

        let id1 = emitter.on("topic::a", Box::new(|_, _| {}));
        let id2 = emitter.on("topic::a", Box::new(|_, _| {}));
        emitter.off("topic::a", id1);
        emitter.off("topic::a", id2);

        let recorded = events.lock().unwrap();
        assert_eq!(recorded[0], (MetaKind::Add, "topic::a".to_string()));
        assert_eq!(recorded[1], (MetaKind::Remove, "topic::a".to_string()));
        assert_eq!(recorded[2], (MetaKind::Remove, "topic::a".to_string()));
    }

    #[test]
    fn remove_all_emits_single_meta_event() {
        let mut emitter = EventEmitter::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let e = events.clone();
        emitter.on_meta(move |meta| e.lock().unwrap().push((meta.kind, meta.pattern)));

        emitter.on("topic::a", Box::new(|_, _| {}));
        emitter.on("topic::a", Box::new(|_, _| {}));
        emitter.remove_all(Some("topic::a"));

        let recorded = events.lock().unwrap();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[1], (MetaKind::RemoveAll, "topic::a".to_string()));
    }

    #[test]
    fn on_any_observes_every_emission() {
        let mut emitter = EventEmitter::new();
        let topics = Arc::new(Mutex::new(Vec::new()));
        let t = topics.clone();
        emitter.on_any(Box::new(move |topic, _data| {
            t.lock().unwrap().push(topic.to_string());
        }));
        emitter.on("a::b", Box::new(|_, _| {}));
        emitter.emit("a::b", &Value::Null, None);
        emitter.emit("a::c", &Value::Null, None);
        assert_eq!(*topics.lock().unwrap(), vec!["a::b", "a::c"]);
    }
}
