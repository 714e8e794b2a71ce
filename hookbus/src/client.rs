//! Client-side RPC handler (spec §4.4, §4.5.3).
//!
//! Inbound `message` frames from the broker delegate straight to the local
//! emitter (§4.5.3 step 1) rather than re-entering `Hook::emit`'s full
//! pipeline — a client never re-broadcasts what its broker already fanned
//! out to it.

use crate::hook::Hook;
use crate::topics;
use hookbus_core::emitter::Reply;
use hookbus_core::topic::join_topic;
use hookbus_rpc::connection::{RpcHandler, SessionHandle};
use hookbus_rpc::wire::{CallId, Frame, Outcome, ReportDescriptor};
use serde_json::Value;

pub(crate) struct ClientHandler {
    hook: Hook,
}

impl ClientHandler {
    pub(crate) fn new(hook: Hook) -> Self {
        Self { hook }
    }
}

#[async_trait::async_trait(?Send)]
impl RpcHandler for ClientHandler {
    /// A broker never sends `report`; clients don't expect this frame.
    async fn on_report(&self, _session: SessionHandle, _call_id: CallId, _descriptor: ReportDescriptor) {}

    async fn on_message(&self, session: SessionHandle, call_id: Option<CallId>, topic: String, data: Value) {
        let reply: Option<Reply> = call_id.map(|call_id| {
            Box::new(move |error: Option<Value>, result: Option<Value>| {
                let outcome = match error {
                    Some(error) => Outcome::Err { error },
                    None => Outcome::Ok { result },
                };
                session.reply(Frame::MessageReply { call_id, outcome });
            }) as Reply
        });

        self.hook.deliver_local_from_remote(&topic, &data, reply);
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

    async fn on_disconnect(&self, _session: SessionHandle) {
        self.hook.clear_broker();
        let _ = self.hook.emit(topics::HOOK_DISCONNECTED, Value::Null, None).await;
    }
}
