//! A distributed, hierarchical, wildcard-capable event bus for cooperating
//! hook processes (spec §1-§9).
//!
//! A [`Hook`] starts by trying to listen on a configured address; if that
//! address is already taken by a sibling hook, it falls back to connecting
//! to it as a client instead (§4.5.1) — there is no separate "broker"
//! binary, any hook can end up playing either role. Once started, a hook's
//! embedded [`hookbus_core::emitter::EventEmitter`] is the single place
//! local listeners are registered; `emit` additionally fans a topic out
//! over the RPC connection (§4.4) to every other peer whose own listener
//! tree matches it (§4.5.6), and to any configured auxiliary transport
//! (§4.6).

#![deny(unsafe_code)]

pub mod cli;
mod client;
pub mod error;
pub mod hook;
pub mod logging;
pub mod options;
pub mod role;
mod server;
pub mod spawn;
pub mod topics;
pub mod transport_adapter;

pub use error::{HookError, Result};
pub use hook::Hook;
pub use logging::{init_tracing, LogSink, NullLogSink, TracingLogSink};
pub use options::{ChildHookSpec, HookOptions, HookOptionsBuilder, TransportSpec};
pub use role::Role;
pub use spawn::{NoopSpawner, Spawner};
pub use transport_adapter::{RecordingTransport, Transport, TransportRegistry};

pub use hookbus_core::emitter::{Listener, MetaEvent, MetaKind, Reply};
pub use hookbus_core::topic::ListenerId;
