//! The hook runtime: lifecycle, emit pipeline, broadcast intercept (spec
//! §4.5).
//!
//! `Hook` is `Rc<RefCell<HookState>>` plus three independent queues used to
//! cross the sync/async boundary between the embedded `EventEmitter`
//! (synchronous callbacks) and the RPC/aux-transport work they trigger
//! (async):
//! - `meta_queue` collects `listener-added`/`listener-removed`/
//!   `all-listeners-removed` events as they're synthesized by `on`/`off`/
//!   `removeAll`, drained synchronously right after (forwarding to the
//!   broker or the registry needs no suspension point, per §4.5.5 step 1).
//! - `broadcast_queue` collects every topic the broadcast intercept
//!   (`onAny`, broker only) observes; drained by `emit` after local
//!   delivery to run the actual async `hasEvent`/`message` fan-out
//!   (§4.5.6).
//! - `pending_emits` collects the derived `topic::result`/`topic::error`
//!   topics a synthesized reply produces; drained by `emit` to recurse.
//!
//! Each queue is its own `Rc<RefCell<..>>`, independent of `HookState`'s
//! own `RefCell` — the closures that push onto them fire while `HookState`
//! is already borrowed (from inside `EventEmitter::emit`/`on`/`off`), so
//! they must never try to re-borrow it.

use crate::logging::{LogSink, NullLogSink, TracingLogSink};
use crate::options::HookOptions;
use crate::role::{Role, RoleState};
use crate::spawn::{NoopSpawner, Spawner};
use crate::topics;
use crate::transport_adapter::{Transport, TransportRegistry};
use hookbus_core::emitter::{
    AnyListener, EventEmitter, Listener, MetaEvent, MetaKind, Reply, ALL_LISTENERS_REMOVED,
    LISTENER_ADDED, LISTENER_REMOVED,
};
use hookbus_core::error::{HookError, Result};
use hookbus_core::registry::{PeerReport, Registry, SessionId, SubscriptionChange};
use hookbus_core::resolve::resolve_host;
use hookbus_core::topic::{split_topic, ListenerId, DELIMITER};
use hookbus_rpc::connection::SessionHandle;
use hookbus_rpc::transport;
use hookbus_rpc::wire::{Frame, Outcome, ReportDescriptor};
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use crate::client::ClientHandler;
use crate::server::ServerHandler;

pub(crate) struct HookState {
    pub(crate) options: HookOptions,
    pub(crate) role: RoleState,
    pub(crate) assigned_name: String,
    pub(crate) emitter: EventEmitter,
    pub(crate) aux_transports: TransportRegistry,
    pub(crate) log_sink: Box<dyn LogSink>,
    pub(crate) spawner: Rc<dyn Spawner>,
    pub(crate) registry: Option<Registry>,
    pub(crate) sessions: HashMap<SessionId, SessionHandle>,
    pub(crate) broker: Option<SessionHandle>,
    pub(crate) listener_alive: Option<Rc<Cell<bool>>>,
    pub(crate) killed: bool,
}

/// A session id reserved for the broker's own self-entry in its registry —
/// real peers are numbered from 1 by the RPC transport (§4.5.2 step 2).
const SELF_SESSION_ID: SessionId = 0;

/// A hook instance: the process-local singleton the spec's §3 data model
/// describes. Cloning shares state (`Rc`) rather than duplicating it.
#[derive(Clone)]
pub struct Hook {
    pub(crate) inner: Rc<RefCell<HookState>>,
    broadcast_queue: Rc<RefCell<VecDeque<(String, Value)>>>,
    pending_emits: Rc<RefCell<VecDeque<(String, Value)>>>,
    meta_queue: Rc<RefCell<VecDeque<MetaEvent>>>,
}

impl Hook {
    #[must_use]
    pub fn new(options: HookOptions) -> Self {
        Self::with_spawner(options, Rc::new(NoopSpawner), Vec::new())
    }

    #[must_use]
    pub fn with_event_map(options: HookOptions, event_map: Vec<(String, Listener)>) -> Self {
        Self::with_spawner(options, Rc::new(NoopSpawner), event_map)
    }

    /// Full constructor. `event_map` is §6's `eventMap`: patterns installed
    /// via `on` at construction, taken as a constructor argument rather
    /// than a `HookOptions` field since a `Listener` closure can't live in
    /// a struct that must stay `Clone`/`Debug` (`HookOptions` is embedded
    /// in `ChildHookSpec`).
    #[must_use]
    pub fn with_spawner(
        options: HookOptions,
        spawner: Rc<dyn Spawner>,
        event_map: Vec<(String, Listener)>,
    ) -> Self {
        let meta_queue = Rc::new(RefCell::new(VecDeque::new()));
        let mut emitter = EventEmitter::new();
        {
            let queue = Rc::clone(&meta_queue);
            emitter.on_meta(move |meta| queue.borrow_mut().push_back(meta));
        }
        for (pattern, listener) in event_map {
            emitter.on(&pattern, listener);
        }

        let log_sink: Box<dyn LogSink> = if options.quiet {
            Box::new(NullLogSink)
        } else {
            Box::new(TracingLogSink)
        };
        let assigned_name = options.name.clone();

        let state = HookState {
            options,
            role: RoleState::default(),
            assigned_name,
            emitter,
            aux_transports: TransportRegistry::new(),
            log_sink,
            spawner,
            registry: None,
            sessions: HashMap::new(),
            broker: None,
            listener_alive: None,
            killed: false,
        };

        let hook = Self {
            inner: Rc::new(RefCell::new(state)),
            broadcast_queue: Rc::new(RefCell::new(VecDeque::new())),
            pending_emits: Rc::new(RefCell::new(VecDeque::new())),
            meta_queue,
        };
        hook.drain_meta();
        hook
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.inner.borrow().assigned_name.clone()
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.inner.borrow().role.get()
    }

    #[must_use]
    pub fn options(&self) -> HookOptions {
        self.inner.borrow().options.clone()
    }

    /// Registers a driver for `type_key`, usable by any `TransportSpec` in
    /// `HookOptions::transports` naming it (§4.6).
    pub fn register_transport(&self, type_key: impl Into<String>, driver: Rc<dyn Transport>) {
        self.inner.borrow_mut().aux_transports.register(type_key, driver);
    }

    // --- Embedded emitter surface (§4.2) ---

    pub fn on(&self, pattern: &str, listener: Listener) -> ListenerId {
        let id = self.inner.borrow_mut().emitter.on(pattern, listener);
        self.drain_meta();
        id
    }

    pub fn once(&self, pattern: &str, listener: Listener) -> ListenerId {
        let id = self.inner.borrow_mut().emitter.once(pattern, listener);
        self.drain_meta();
        id
    }

    pub fn off(&self, pattern: &str, id: ListenerId) {
        self.inner.borrow_mut().emitter.off(pattern, id);
        self.drain_meta();
    }

    pub fn remove_all(&self, pattern: Option<&str>) {
        self.inner.borrow_mut().emitter.remove_all(pattern);
        self.drain_meta();
    }

    #[must_use]
    pub fn listeners(&self, pattern: &str) -> Vec<ListenerId> {
        self.inner.borrow().emitter.listeners(pattern)
    }

    pub fn on_any(&self, listener: AnyListener) {
        self.inner.borrow_mut().emitter.on_any(listener);
    }

    /// Forwards queued meta-events: to the broker if this hook is a
    /// client, into the registry directly if it's the broker. Runs
    /// entirely synchronously (a `SessionHandle::send` only pushes onto an
    /// outgoing channel) so ordering relative to a subsequent `emit`'s own
    /// sends on the same connection is preserved without needing to await
    /// anything here (§5 "meta and user messages ... same connection").
    fn drain_meta(&self) {
        let events: Vec<MetaEvent> = self.meta_queue.borrow_mut().drain(..).collect();
        for meta in events {
            let topic = meta_topic_name(meta.kind);
            let mut state = self.inner.borrow_mut();

            match state.role.get() {
                Role::Client => {
                    if let Some(broker) = state.broker.clone() {
                        broker.send(Frame::Message {
                            call_id: None,
                            topic: topic.to_string(),
                            data: json!(meta.pattern),
                        });
                    }
                }
                Role::Server => {
                    let self_name = state.assigned_name.clone();
                    if let Some(registry) = &mut state.registry {
                        registry.adjust_subscription(&self_name, kind_to_change(meta.kind), &meta.pattern);
                    }
                }
                _ => {}
            }

            state.log_sink.log(topic, &json!(meta.pattern));
            state.emitter.emit_reserved(topic, &json!(meta.pattern));
        }
    }

    // --- Lifecycle (§4.5.1 - §4.5.4, §4.5.7) ---

    /// `start`: attempt `listen`; on a bind conflict, fall back to
    /// `connect` with the same options (§4.5.1).
    pub async fn start(&self) -> Result<()> {
        self.inner.borrow_mut().role.begin_listening()?;

        match self.listen().await {
            Ok(()) => Ok(()),
            Err(e) if e.is_bind_conflict() => {
                self.inner.borrow_mut().role.begin_connecting()?;
                match self.connect().await {
                    Ok(()) => Ok(()),
                    Err(e) => {
                        self.emit(topics::ERROR_UNKNOWN, json!(e.to_string()), None).await?;
                        Err(e)
                    }
                }
            }
            Err(e) => {
                let error_topic = if matches!(e, HookError::Resolve(_)) {
                    topics::ERROR_RESOLVE
                } else {
                    topics::ERROR_BIND
                };
                self.emit(error_topic, json!(e.to_string()), None).await?;
                Err(e)
            }
        }
    }

    async fn listen(&self) -> Result<()> {
        let (host, port, r#type, name) = {
            let state = self.inner.borrow();
            (
                state.options.host.clone(),
                state.options.port,
                state.options.r#type.clone(),
                state.assigned_name.clone(),
            )
        };

        let addrs = resolve_host(&host, port)?;
        let addr = addrs[0];
        let listener = transport::bind(addr).await?;

        {
            let mut registry = Registry::new(name);
            registry.upsert_self(SELF_SESSION_ID, addr.ip().to_string(), addr.port(), r#type);
            self.inner.borrow_mut().registry = Some(registry);
        }

        self.inner.borrow_mut().role.commit_server()?;
        self.install_broadcast_intercept();

        let alive = Rc::new(Cell::new(true));
        self.inner.borrow_mut().listener_alive = Some(Rc::clone(&alive));

        let (handler, on_accept) = ServerHandler::new(self.clone());
        compio::runtime::spawn(async move {
            if let Err(e) = transport::serve(listener, handler, on_accept, alive).await {
                tracing::debug!(error = %e, "server accept loop ended");
            }
        })
        .detach();

        {
            let mut state = self.inner.borrow_mut();
            let patterns = state.emitter.enumerate();
            let self_name = state.assigned_name.clone();
            if let Some(registry) = &mut state.registry {
                for pattern in patterns {
                    registry.adjust_subscription(&self_name, SubscriptionChange::Add, &pattern);
                }
            }
        }

        self.emit(topics::HOOK_LISTENING, json!(port), None).await?;
        self.emit(topics::HOOK_STARTED, json!(port), None).await?;
        self.after_started().await
    }

    async fn connect(&self) -> Result<()> {
        let (host, port, r#type, name, version) = {
            let state = self.inner.borrow();
            (
                state.options.host.clone(),
                state.options.port,
                state.options.r#type.clone(),
                state.assigned_name.clone(),
                state.options.version.clone(),
            )
        };

        let addrs = resolve_host(&host, port)?;
        let addr = addrs[0];
        let conn = transport::connect(addr).await?;
        let handle = conn.handle();
        self.inner.borrow_mut().broker = Some(handle.clone());

        let handler = Rc::new(ClientHandler::new(self.clone()));
        compio::runtime::spawn(async move {
            if let Err(e) = conn.run(handler).await {
                tracing::debug!(error = %e, "broker connection ended");
            }
        })
        .detach();

        let initial_topics = self.inner.borrow().emitter.enumerate();
        let descriptor = ReportDescriptor {
            name,
            r#type,
            version: version.clone(),
            initial_topics,
        };
        let rx = handle.call(move |call_id| Frame::Report { call_id, descriptor });
        let frame = rx
            .await
            .map_err(|_| HookError::transport("report reply channel closed"))?;

        let Frame::ReportReply {
            assigned_name,
            server_version,
            ..
        } = frame
        else {
            return Err(HookError::protocol("expected a ReportReply frame"));
        };

        if strict_neq(&server_version, &version) {
            self.inner.borrow_mut().broker = None;
            return Err(HookError::VersionMismatch {
                local: version,
                remote: server_version,
            });
        }

        self.inner.borrow_mut().assigned_name = assigned_name;
        self.inner.borrow_mut().role.commit_client()?;

        self.emit(topics::HOOK_CONNECTED, json!(port), None).await?;
        self.emit(topics::HOOK_STARTED, json!(port), None).await?;
        self.after_started().await
    }

    /// `hook::started` handoff to the external spawner (§4.5.4).
    async fn after_started(&self) -> Result<()> {
        let (children, spawner) = {
            let state = self.inner.borrow();
            (state.options.hooks.clone(), Rc::clone(&state.spawner))
        };

        if children.is_empty() {
            self.emit(topics::HOOK_READY, Value::Null, None).await
        } else {
            for spec in &children {
                spawner.spawn_child(spec).await?;
            }
            self.emit(topics::CHILDREN_READY, Value::Null, None).await?;
            self.emit(topics::HOOK_READY, Value::Null, None).await
        }
    }

    /// `stop` (§4.5.7): close whichever side is active; error if neither.
    pub async fn stop(&self) -> Result<()> {
        let role = self.inner.borrow().role.get();
        self.inner.borrow_mut().role.stop()?;

        match role {
            Role::Server => {
                let mut state = self.inner.borrow_mut();
                if let Some(alive) = state.listener_alive.take() {
                    alive.set(false);
                }
                state.registry = None;
                state.sessions.clear();
            }
            Role::Client => {
                self.inner.borrow_mut().broker = None;
            }
            _ => {}
        }
        Ok(())
    }

    /// `kill` (§4.5.7): named target goes to the external spawner;
    /// otherwise the broker refuses and a client quiesces into a silent
    /// husk.
    pub async fn kill(&self, target: Option<&str>) -> Result<()> {
        if let Some(name) = target {
            let spawner = Rc::clone(&self.inner.borrow().spawner);
            return spawner.kill_child(name).await;
        }

        match self.inner.borrow().role.get() {
            Role::Server => Err(HookError::CannotKillServer),
            Role::Client => {
                self.stop().await?;
                let mut state = self.inner.borrow_mut();
                state.emitter.remove_all(None);
                state.killed = true;
                Ok(())
            }
            _ => Err(HookError::NothingToStop),
        }
    }

    // --- Emit pipeline (§4.5.5) ---

    /// Boxed because the derived `topic::result`/`topic::error` step
    /// recurses into `emit` itself, and `async fn` can't express an
    /// infinitely-sized recursive future.
    pub fn emit<'a>(
        &'a self,
        topic: &'a str,
        data: Value,
        reply: Option<Reply>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + 'a>> {
        Box::pin(async move {
            if self.inner.borrow().killed {
                return Ok(());
            }
            if matches!(topic, LISTENER_ADDED | LISTENER_REMOVED | ALL_LISTENERS_REMOVED) {
                return Ok(());
            }

            {
                let state = self.inner.borrow();
                state.log_sink.log(topic, &data);
            }

            let reply = reply.unwrap_or_else(|| self.synthesize_reply(topic.to_string(), data.clone()));
            let shared_reply = Rc::new(RefCell::new(Some(reply)));

            let (self_name, transports, broker) = {
                let state = self.inner.borrow();
                (
                    state.assigned_name.clone(),
                    state.options.transports.clone(),
                    state.broker.clone(),
                )
            };
            let qualified = format!("{self_name}{DELIMITER}{topic}");

            for spec in &transports {
                let driver = self.inner.borrow().aux_transports.get(&spec.type_key);
                let Some(driver) = driver else { continue };
                let result = driver.message(&spec.options, &qualified, &data).await;
                Self::settle_result(&shared_reply, result);
            }

            if let Some(broker) = broker {
                let rx = broker.call(|call_id| Frame::Message {
                    call_id: Some(call_id),
                    topic: qualified.clone(),
                    data: data.clone(),
                });
                if let Ok(Frame::MessageReply { outcome, .. }) = rx.await {
                    Self::settle_outcome(&shared_reply, outcome);
                }
            }

            self.deliver_local(topic, &data, &shared_reply);

            self.run_broadcast_intercept().await?;

            // Nothing upstream, local, or cross-peer claimed the reply slot
            // (e.g. a broadcast-only topic with no listener on this process)
            // — settle it with an empty success so the original caller's
            // pending call resolves instead of hanging forever.
            Self::settle_result(&shared_reply, Ok(None));

            self.drain_pending_emits().await?;

            Ok(())
        })
    }

    fn deliver_local(&self, topic: &str, data: &Value, shared_reply: &Rc<RefCell<Option<Reply>>>) {
        let reply = Self::proxy_reply(shared_reply);
        self.inner.borrow_mut().emitter.emit(topic, data, Some(reply));
    }

    /// Used by a client's inbound `message` RPC handler: the spec
    /// delegates straight to the emitter, bypassing aux transports,
    /// upstream forwarding, and the broker-only broadcast intercept
    /// entirely (§4.5.3 step 1).
    pub(crate) fn deliver_local_from_remote(&self, topic: &str, data: &Value, reply: Option<Reply>) {
        let mut state = self.inner.borrow_mut();
        state.log_sink.log(topic, data);
        state.emitter.emit(topic, data, reply);
    }

    fn synthesize_reply(&self, topic: String, original_data: Value) -> Reply {
        let pending = Rc::clone(&self.pending_emits);
        Box::new(move |error: Option<Value>, result: Option<Value>| {
            let mut queue = pending.borrow_mut();
            match error {
                Some(err) => queue.push_back((
                    topics::error_topic(&topic),
                    json!({ "error": err, "ctx": original_data }),
                )),
                None => queue.push_back((
                    topics::result_topic(&topic),
                    json!({ "result": result, "ctx": original_data }),
                )),
            }
        })
    }

    fn proxy_reply(shared: &Rc<RefCell<Option<Reply>>>) -> Reply {
        let shared = Rc::clone(shared);
        Box::new(move |error: Option<Value>, result: Option<Value>| {
            if let Some(reply) = shared.borrow_mut().take() {
                reply(error, result);
            }
        })
    }

    fn settle_result(shared: &Rc<RefCell<Option<Reply>>>, result: Result<Option<Value>>) {
        if let Some(reply) = shared.borrow_mut().take() {
            match result {
                Ok(value) => reply(None, value),
                Err(e) => reply(Some(json!(e.to_string())), None),
            }
        }
    }

    fn settle_outcome(shared: &Rc<RefCell<Option<Reply>>>, outcome: Outcome) {
        if let Some(reply) = shared.borrow_mut().take() {
            match outcome {
                Outcome::Ok { result } => reply(None, result),
                Outcome::Err { error } => reply(Some(error), None),
            }
        }
    }

    /// Emits each derived `topic::result`/`topic::error` with a no-op
    /// reply, not `None` — passing `None` would let `emit` synthesize
    /// *another* reply for this already-derived topic, generating
    /// `topic::result::result` and so on without end.
    async fn drain_pending_emits(&self) -> Result<()> {
        let derived: Vec<(String, Value)> = self.pending_emits.borrow_mut().drain(..).collect();
        for (topic, data) in derived {
            let noop: Reply = Box::new(|_error: Option<Value>, _result: Option<Value>| {});
            self.emit(&topic, data, Some(noop)).await?;
        }
        Ok(())
    }

    // --- Broadcast intercept (§4.5.6, broker only) ---

    fn install_broadcast_intercept(&self) {
        let queue = Rc::clone(&self.broadcast_queue);
        self.inner.borrow_mut().emitter.on_any(Box::new(move |topic: &str, data: &Value| {
            queue.borrow_mut().push_back((topic.to_string(), data.clone()));
        }));
    }

    async fn run_broadcast_intercept(&self) -> Result<()> {
        let queued: Vec<(String, Value)> = self.broadcast_queue.borrow_mut().drain(..).collect();
        for (topic, data) in queued {
            self.broadcast_one(&topic, &data).await?;
        }
        Ok(())
    }

    /// For every connected peer other than the origin, ask whether it has
    /// a matching listener and forward only if so (§4.5.6, "no
    /// undeliverable traffic" §8).
    async fn broadcast_one(&self, topic: &str, data: &Value) -> Result<()> {
        let segments = split_topic(topic);

        let (origin, wire_topic) = {
            let state = self.inner.borrow();
            let Some(registry) = &state.registry else {
                return Ok(());
            };
            if segments.len() >= 2 && registry.by_name(segments[0]).is_some() {
                (Some(segments[0].to_string()), topic.to_string())
            } else {
                (None, format!("{}{}{}", state.assigned_name, DELIMITER, topic))
            }
        };

        // Queried and later delivered using the same segments as `wire_topic`
        // (origin name included) — a remote peer matches a forwarded event
        // against whatever pattern it actually registered, which may itself
        // be origin-qualified (`"publisher::orders::placed"`) or a wildcard
        // spanning the origin (`"*::orders::placed"`). Stripping the origin
        // here would desync the `hasEvent` probe from what `deliver_local_
        // from_remote` later matches against.
        let has_event_parts: Vec<String> = split_topic(&wire_topic).into_iter().map(String::from).collect();

        let peers: Vec<(String, SessionId)> = {
            let state = self.inner.borrow();
            state
                .registry
                .as_ref()
                .map(|r| r.iter().map(|p| (p.name.clone(), p.session_id)).collect())
                .unwrap_or_default()
        };

        let transports = self.inner.borrow().options.transports.clone();

        for (peer_name, session_id) in peers {
            if session_id == SELF_SESSION_ID {
                continue;
            }
            if origin.as_deref() == Some(peer_name.as_str()) {
                continue;
            }

            let session = { self.inner.borrow().sessions.get(&session_id).cloned() };
            let Some(session) = session else { continue };

            let rx = session.call(|call_id| Frame::HasEvent {
                call_id,
                topic_parts: has_event_parts.clone(),
                opaque_remote: None,
            });
            let matched = matches!(rx.await, Ok(Frame::HasEventReply { matches: true, .. }));
            if !matched {
                continue;
            }

            for spec in &transports {
                let driver = self.inner.borrow().aux_transports.get(&spec.type_key);
                if let Some(driver) = driver {
                    let _ = driver.message(&spec.options, &wire_topic, data).await;
                }
            }

            session.send(Frame::Message {
                call_id: None,
                topic: wire_topic.clone(),
                data: data.clone(),
            });
        }

        Ok(())
    }

    // --- Collaborator hooks for ServerHandler / ClientHandler ---

    pub(crate) fn accept_report(
        &self,
        session: SessionHandle,
        remote_address: String,
        remote_port: u16,
        report: PeerReport,
    ) -> (String, String) {
        let mut state = self.inner.borrow_mut();
        let assigned = match &mut state.registry {
            Some(registry) => registry.upsert(session.id, remote_address, remote_port, report),
            None => report.name,
        };
        let version = state.options.version.clone();
        state.sessions.insert(session.id, session);
        (assigned, version)
    }

    pub(crate) fn drop_session(&self, session_id: SessionId) -> Option<String> {
        let mut state = self.inner.borrow_mut();
        state.sessions.remove(&session_id);
        state.registry.as_mut().and_then(|r| r.remove(session_id)).map(|p| p.name)
    }

    pub(crate) fn apply_remote_subscription(&self, session_id: SessionId, kind: MetaKind, pattern: &str) {
        let mut state = self.inner.borrow_mut();
        let peer_name = state
            .registry
            .as_ref()
            .and_then(|r| r.by_session(session_id))
            .map(|p| p.name.clone());
        if let (Some(name), Some(registry)) = (peer_name, state.registry.as_mut()) {
            registry.adjust_subscription(&name, kind_to_change(kind), pattern);
        }
    }

    pub(crate) fn has_local_match(&self, topic: &str) -> bool {
        self.inner.borrow().emitter.has_match(topic)
    }

    pub(crate) fn clear_broker(&self) {
        self.inner.borrow_mut().broker = None;
    }
}

/// Maps a reserved meta-topic's name to the `SubscriptionChange` kind the
/// registry applies (§4.3 `adjustSubscription`).
pub(crate) fn meta_kind_for_topic(topic: &str) -> Option<MetaKind> {
    match topic {
        LISTENER_ADDED => Some(MetaKind::Add),
        LISTENER_REMOVED => Some(MetaKind::Remove),
        ALL_LISTENERS_REMOVED => Some(MetaKind::RemoveAll),
        _ => None,
    }
}

fn meta_topic_name(kind: MetaKind) -> &'static str {
    match kind {
        MetaKind::Add => LISTENER_ADDED,
        MetaKind::Remove => LISTENER_REMOVED,
        MetaKind::RemoveAll => ALL_LISTENERS_REMOVED,
    }
}

fn kind_to_change(kind: MetaKind) -> SubscriptionChange {
    match kind {
        MetaKind::Add => SubscriptionChange::Add,
        MetaKind::Remove => SubscriptionChange::Remove,
        MetaKind::RemoveAll => SubscriptionChange::RemoveAll,
    }
}

/// Strict semver inequality (§4.5.3 step 3). Falls back to a plain string
/// compare if either side isn't valid semver, rather than failing open or
/// panicking on a malformed version string.
fn strict_neq(a: &str, b: &str) -> bool {
    match (semver::Version::parse(a), semver::Version::parse(b)) {
        (Ok(x), Ok(y)) => x != y,
        _ => a != b,
    }
}
