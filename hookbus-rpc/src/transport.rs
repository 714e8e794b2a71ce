//! RPC transport: binds a listener or connects out, handing each accepted
//! or established socket to a fresh `Connection` (spec §4.4, §4.5.2,
//! §4.5.3).
//!
//! Grounded on the teacher's endpoint/bind-or-connect split
//! (`monocoque-core/src/endpoint.rs`, `tcp.rs`): a listen failure here is
//! surfaced as `HookError::Bind` so the hook runtime can treat an
//! address-in-use error as "fall back to connect" per §4.5.1.

use crate::connection::{Connection, RpcHandler, SessionId};
use compio::net::{TcpListener, TcpStream};
use hookbus_core::error::{HookError, Result};
use std::cell::Cell;
use std::net::SocketAddr;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed)
}

/// Binds a listener on `addr`. A bind conflict (address in use) is the one
/// error the hook runtime treats as recoverable (§4.5.1).
pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| HookError::bind(format!("{addr}: {e}")))
}

/// Accepts connections from `listener` until `alive` is cleared, spawning a
/// `Connection` actor per peer. `on_accept` receives each `Connection`
/// before it starts running so the caller can register the session in its
/// own bookkeeping (e.g. the server's `Registry`) ahead of the first frame.
///
/// `alive` is checked once per loop iteration, not polled alongside
/// `accept()` — `Hook::stop()` flips it to stop admitting new peers, but an
/// `accept()` already in flight still completes; the accepted stream is
/// then immediately dropped instead of spawned.
pub async fn serve<H, F>(
    listener: TcpListener,
    handler: Rc<H>,
    mut on_accept: F,
    alive: Rc<Cell<bool>>,
) -> Result<()>
where
    H: RpcHandler + 'static,
    F: FnMut(SessionId, SocketAddr),
{
    while alive.get() {
        let (stream, peer_addr) = listener
            .accept()
            .await
            .map_err(|e| HookError::transport(e.to_string()))?;

        if !alive.get() {
            drop(stream);
            break;
        }

        let session_id = next_session_id();
        on_accept(session_id, peer_addr);

        let conn = Connection::new(stream, session_id);
        let handler = Rc::clone(&handler);
        compio::runtime::spawn(async move {
            if let Err(e) = conn.run(handler).await {
                tracing::debug!(session = session_id, error = %e, "connection ended");
            }
        })
        .detach();
    }

    Ok(())
}

/// Connects out to `addr` and returns a fresh `Connection` (not yet
/// running — the caller drives it with `.run(handler)`, same as an
/// accepted connection).
pub async fn connect(addr: SocketAddr) -> Result<Connection> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|e| HookError::transport(format!("connect {addr}: {e}")))?;
    Ok(Connection::new(stream, next_session_id()))
}
