//! Hookbus RPC
//!
//! The wire protocol and connection machinery underneath a hook's three
//! remote methods (`report`, `message`, `has_event`). Internal crate: the
//! public `hookbus` crate is the one downstream code should depend on.

#![deny(unsafe_code)]

pub mod codec;
pub mod connection;
pub mod transport;
pub mod wire;

pub mod prelude {
    pub use crate::codec::{CodecError, FrameDecoder, MAX_FRAME_SIZE};
    pub use crate::connection::{Connection, RpcHandler, SessionHandle, SessionId};
    pub use crate::transport::{bind, connect, serve};
    pub use crate::wire::{CallId, Frame, Outcome, ReportDescriptor};
}
