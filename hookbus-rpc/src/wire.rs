//! Wire messages for the hookbus RPC transport (spec §4.4, §6).
//!
//! Every frame is JSON (grounded in `lighthouse`/`mothra`'s use of
//! `serde`/`serde_json` for structured inter-process messages — the teacher
//! crate itself doesn't need a wire serde format since ZMTP frames are raw
//! bytes, but our payloads are opaque application data, so a JSON envelope
//! is the idiomatic fit here). `call_id` correlates a request with its
//! single reply (§4.4: "a single pending reply per outgoing call").

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Correlates an outgoing call with its (at most one) reply.
pub type CallId = u64;

/// `report`'s self-descriptor (§4.4): sent by a client to its broker
/// immediately after connecting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDescriptor {
    pub name: String,
    pub r#type: String,
    pub version: String,
    pub initial_topics: Vec<String>,
}

/// The outcome of a `message` call, as seen by the caller's reply callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Ok { result: Option<Value> },
    Err { error: Value },
}

/// A single frame on the wire. Exactly one of the three remote methods
/// (`report`, `message`, `has_event`) per request frame, each with a
/// matching reply frame carrying the same `call_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Frame {
    /// client -> server, once, immediately after connect.
    Report {
        call_id: CallId,
        descriptor: ReportDescriptor,
    },
    ReportReply {
        call_id: CallId,
        assigned_name: String,
        assigned_id: u64,
        server_version: String,
    },

    /// Either direction. `call_id` is present only when the sender supplied
    /// a reply callback.
    Message {
        call_id: Option<CallId>,
        topic: String,
        data: Value,
    },
    MessageReply {
        call_id: CallId,
        outcome: Outcome,
    },

    /// server -> client: does this client match `topic_parts`?
    HasEvent {
        call_id: CallId,
        topic_parts: Vec<String>,
        opaque_remote: Option<Value>,
    },
    HasEventReply {
        call_id: CallId,
        matches: bool,
    },
}

impl Frame {
    /// The `call_id` a reply frame answers, if this is a reply frame.
    #[must_use]
    pub const fn reply_call_id(&self) -> Option<CallId> {
        match self {
            Self::ReportReply { call_id, .. }
            | Self::MessageReply { call_id, .. }
            | Self::HasEventReply { call_id, .. } => Some(*call_id),
            Self::Report { .. } | Self::Message { .. } | Self::HasEvent { .. } => None,
        }
    }
}
