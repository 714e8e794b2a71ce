//! Broker-side RPC handler (spec §4.4, §4.5.2, §4.5.3 step 4 "the server
//! side").
//!
//! Grounded on the teacher's `RouterHub`/`ProxySocket` split
//! (`monocoque-core/src/router.rs`): one handler instance shared across
//! every accepted connection, driving the registry rather than owning any
//! per-peer state itself.

use crate::hook::{meta_kind_for_topic, Hook};
use crate::topics;
use hookbus_core::emitter::Reply;
use hookbus_core::registry::PeerReport;
use hookbus_core::topic::join_topic;
use hookbus_rpc::connection::{RpcHandler, SessionHandle};
use hookbus_rpc::wire::{CallId, Frame, Outcome, ReportDescriptor};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::rc::Rc;

/// Handles every inbound frame on a broker's accepted connections.
pub(crate) struct ServerHandler {
    hook: Hook,
    /// Remote address recorded at accept time, consumed once the peer's
    /// `report` frame arrives (accept and report are separate frames; the
    /// registry entry needs both).
    pending_addrs: RefCell<HashMap<u64, (String, u16)>>,
}

impl ServerHandler {
    /// Returns the handler plus an `on_accept` callback for
    /// `hookbus_rpc::transport::serve` to record each peer's address ahead
    /// of its first frame.
    pub(crate) fn new(hook: Hook) -> (Rc<Self>, impl FnMut(u64, SocketAddr)) {
        let handler = Rc::new(Self {
            hook,
            pending_addrs: RefCell::new(HashMap::new()),
        });
        let recorder = Rc::clone(&handler);
        let on_accept = move |session_id: u64, addr: SocketAddr| {
            recorder
                .pending_addrs
                .borrow_mut()
                .insert(session_id, (addr.ip().to_string(), addr.port()));
        };
        (handler, on_accept)
    }
}

#[async_trait::async_trait(?Send)]
impl RpcHandler for ServerHandler {
    async fn on_report(&self, session: SessionHandle, call_id: CallId, descriptor: ReportDescriptor) {
        let (remote_address, remote_port) = self
            .pending_addrs
            .borrow_mut()
            .remove(&session.id)
            .unwrap_or_default();

        let report = PeerReport {
            name: descriptor.name,
            r#type: descriptor.r#type,
            initial_topics: descriptor.initial_topics,
        };
        let session_id = session.id;
        let (assigned_name, server_version) =
            self.hook.accept_report(session.clone(), remote_address, remote_port, report);

        session.reply(Frame::ReportReply {
            call_id,
            assigned_name: assigned_name.clone(),
            assigned_id: session_id,
            server_version,
        });

        let _ = self
            .hook
            .emit(topics::CONNECTION_OPEN, json!({ "name": assigned_name }), None)
            .await;
    }

    async fn on_message(&self, session: SessionHandle, call_id: Option<CallId>, topic: String, data: Value) {
        if let Some(kind) = meta_kind_for_topic(&topic) {
            if let Some(pattern) = data.as_str() {
                self.hook.apply_remote_subscription(session.id, kind, pattern);
            }
            if let Some(call_id) = call_id {
                session.reply(Frame::MessageReply {
                    call_id,
                    outcome: Outcome::Ok { result: None },
                });
            }
            return;
        }

        let reply: Option<Reply> = call_id.map(|call_id| {
            let session = session.clone();
            Box::new(move |error: Option<Value>, result: Option<Value>| {
                let outcome = match error {
                    Some(error) => Outcome::Err { error },
                    None => Outcome::Ok { result },
                };
                session.reply(Frame::MessageReply { call_id, outcome });
            }) as Reply
        });

        let _ = self.hook.emit(&topic, data, reply).await;
    }

    async fn on_has_event(
        &self,
        session: SessionHandle,
        call_id: CallId,
        topic_parts: Vec<String>,
        _opaque_remote: Option<Value>,
    ) {
        let topic_refs: Vec<&str> = topic_parts.iter().map(String::as_str).collect();
        let topic = join_topic(&topic_refs);
        let matches = self.hook.has_local_match(&topic);
        session.reply(Frame::HasEventReply { call_id, matches });
    }

    async fn on_disconnect(&self, session: SessionHandle) {
        self.pending_addrs.borrow_mut().remove(&session.id);
        if let Some(name) = self.hook.drop_session(session.id) {
            let _ = self
                .hook
                .emit(topics::CONNECTION_END, json!({ "name": name.clone() }), None)
                .await;
            let _ = self
                .hook
                .emit(topics::HOOK_DISCONNECTED, json!({ "name": name }), None)
                .await;
        }
    }
}
