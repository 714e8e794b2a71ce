//! Connection actor: one per RPC peer (spec §4.4).
//!
//! Split-pump design grounded on `SocketActor`
//! (`monocoque-core/src/actor.rs`): a read pump decodes frames off the wire
//! and dispatches them to an `RpcHandler`, a write pump drains an outgoing
//! queue onto the socket. Unlike the teacher's fixed-size slab reads, frames
//! here are variable-length JSON, so the read side feeds a `FrameDecoder`
//! instead of handing raw slabs to the application.
//!
//! Each hook is single-threaded (design note: "control flow shape"), so the
//! pending-reply table is `Rc<RefCell<..>>` rather than `Arc<Mutex<..>>` —
//! every task spawned for a connection runs on the same compio executor
//! thread as its owner.

use crate::codec::{self, FrameDecoder};
use crate::wire::{CallId, Frame};
use compio::buf::BufResult;
use compio::io::{AsyncReadExt, AsyncWriteExt};
use compio::net::TcpStream;
use flume::{Receiver, Sender};
use futures::channel::oneshot;
use hookbus_core::error::{HookError, Result};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Callbacks a `Connection` invokes for each inbound request frame. One
/// implementation on the broker side, a different one on the client side —
/// mirrors the teacher's `ProxySocket` trait (`proxy.rs`), which is also
/// `?Send` because it's only ever driven from a single compio task.
#[async_trait::async_trait(?Send)]
pub trait RpcHandler {
    async fn on_report(
        &self,
        session: SessionHandle,
        call_id: CallId,
        descriptor: crate::wire::ReportDescriptor,
    );

    async fn on_message(
        &self,
        session: SessionHandle,
        call_id: Option<CallId>,
        topic: String,
        data: serde_json::Value,
    );

    async fn on_has_event(
        &self,
        session: SessionHandle,
        call_id: CallId,
        topic_parts: Vec<String>,
        opaque_remote: Option<serde_json::Value>,
    );

    /// The peer disconnected (EOF or a read/write error).
    async fn on_disconnect(&self, session: SessionHandle);
}

/// An opaque per-connection token, analogous to the teacher's `PeerKey`.
pub type SessionId = u64;

type PendingReplies = Rc<RefCell<HashMap<CallId, oneshot::Sender<Frame>>>>;

/// A cheap, cloneable handle to a live connection's outgoing half. Handlers
/// receive this instead of the `Connection` itself so they can reply or
/// push unsolicited frames without borrowing the actor.
#[derive(Clone)]
pub struct SessionHandle {
    pub id: SessionId,
    outgoing: Sender<Frame>,
    pending: PendingReplies,
    next_call_id: Rc<Cell<CallId>>,
}

impl SessionHandle {
    /// Sends a reply frame for a call this peer made to us. No correlation
    /// bookkeeping needed: replies don't expect a reply.
    pub fn reply(&self, frame: Frame) {
        let _ = self.outgoing.send(frame);
    }

    /// Sends a frame that expects exactly one reply, and returns a future
    /// that resolves when it arrives (§4.4: "a single pending reply per
    /// outgoing call").
    pub fn call(&self, build: impl FnOnce(CallId) -> Frame) -> oneshot::Receiver<Frame> {
        let call_id = self.next_call_id.get();
        self.next_call_id.set(call_id + 1);

        let (tx, rx) = oneshot::channel();
        self.pending.borrow_mut().insert(call_id, tx);
        let _ = self.outgoing.send(build(call_id));
        rx
    }

    /// Sends a fire-and-forget frame (no reply expected), e.g. a `message`
    /// call with no callback.
    pub fn send(&self, frame: Frame) {
        let _ = self.outgoing.send(frame);
    }
}

/// One live RPC connection. Owns the socket; drives read + write pumps
/// until the peer disconnects.
pub struct Connection {
    stream: TcpStream,
    id: SessionId,
    outgoing_tx: Sender<Frame>,
    outgoing_rx: Receiver<Frame>,
    pending: PendingReplies,
    next_call_id: Rc<Cell<CallId>>,
}

impl Connection {
    #[must_use]
    pub fn new(stream: TcpStream, id: SessionId) -> Self {
        let (outgoing_tx, outgoing_rx) = flume::unbounded();
        Self {
            stream,
            id,
            outgoing_tx,
            outgoing_rx,
            pending: Rc::new(RefCell::new(HashMap::new())),
            next_call_id: Rc::new(Cell::new(1)),
        }
    }

    /// A handle for issuing calls/replies on this connection before or
    /// during `run`.
    #[must_use]
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            id: self.id,
            outgoing: self.outgoing_tx.clone(),
            pending: Rc::clone(&self.pending),
            next_call_id: Rc::clone(&self.next_call_id),
        }
    }

    /// Drives the connection until the peer disconnects or the socket
    /// errors. Every inbound request frame is dispatched to `handler`;
    /// every inbound reply frame resolves its matching pending call.
    ///
    /// Read and write race each other every iteration via `futures::select!`
    /// — the same channel-multiplexing idiom as the teacher's
    /// `RouterHub::run` (`monocoque-core/src/router.rs`) and
    /// `proxy::run_proxy` (`monocoque-zmtp/src/proxy.rs`), extended here to
    /// race a raw socket read alongside a channel recv rather than two
    /// channel recvs. A plain alternating loop (drain writes, then block on
    /// read) would let a queued frame sit in `outgoing` until the peer next
    /// sends something, which stalls the broker pushing unsolicited
    /// `Message`/`HasEvent` frames to an otherwise-idle peer.
    pub async fn run<H: RpcHandler>(mut self, handler: Rc<H>) -> Result<()> {
        use futures::{select, FutureExt};

        let handle = self.handle();
        let mut decoder = FrameDecoder::new();

        'outer: loop {
            // Flush anything already queued before waiting, so a burst of
            // writes doesn't trickle out one select iteration at a time.
            while let Ok(frame) = self.outgoing_rx.try_recv() {
                if !Self::write_one(&mut self.stream, &handler, &handle, frame).await {
                    return Ok(());
                }
            }

            let read_buf = vec![0u8; 64 * 1024];
            select! {
                frame = self.outgoing_rx.recv_async().fuse() => {
                    match frame {
                        Ok(frame) => {
                            if !Self::write_one(&mut self.stream, &handler, &handle, frame).await {
                                return Ok(());
                            }
                        }
                        // All senders dropped (the owning `Connection`'s
                        // handles are gone); nothing more will ever be
                        // queued, so just keep reading until EOF.
                        Err(_) => {}
                    }
                }
                result = self.stream.read(read_buf).fuse() => {
                    let BufResult(res, read_buf) = result;
                    match res {
                        Ok(0) | Err(_) => break 'outer,
                        Ok(n) => {
                            decoder.feed(&read_buf[..n]);
                            loop {
                                match decoder.decode_next() {
                                    Ok(Some(frame)) => {
                                        Self::dispatch(&handle, &self.pending, &handler, frame).await;
                                    }
                                    Ok(None) => break,
                                    Err(e) => {
                                        tracing::warn!(session = self.id, error = %e, "malformed frame, closing connection");
                                        handler.on_disconnect(handle).await;
                                        return Err(HookError::protocol(e.to_string()));
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }

        handler.on_disconnect(handle).await;
        Ok(())
    }

    /// Encodes and writes a single frame. Returns `false` (having already
    /// notified `handler`) if the write failed and the connection should
    /// close.
    async fn write_one<H: RpcHandler>(
        stream: &mut TcpStream,
        handler: &Rc<H>,
        handle: &SessionHandle,
        frame: Frame,
    ) -> bool {
        let Ok(bytes) = codec::encode(&frame) else {
            return true;
        };
        let BufResult(res, _) = stream.write_all(bytes.to_vec()).await;
        if res.is_err() {
            handler.on_disconnect(handle.clone()).await;
            return false;
        }
        true
    }

    async fn dispatch<H: RpcHandler>(
        handle: &SessionHandle,
        pending: &PendingReplies,
        handler: &Rc<H>,
        frame: Frame,
    ) {
        if let Some(call_id) = frame.reply_call_id() {
            if let Some(tx) = pending.borrow_mut().remove(&call_id) {
                let _ = tx.send(frame);
            }
            return;
        }

        match frame {
            Frame::Report { call_id, descriptor } => {
                handler.on_report(handle.clone(), call_id, descriptor).await;
            }
            Frame::Message { call_id, topic, data } => {
                handler.on_message(handle.clone(), call_id, topic, data).await;
            }
            Frame::HasEvent {
                call_id,
                topic_parts,
                opaque_remote,
            } => {
                handler
                    .on_has_event(handle.clone(), call_id, topic_parts, opaque_remote)
                    .await;
            }
            Frame::ReportReply { .. } | Frame::MessageReply { .. } | Frame::HasEventReply { .. } => {
                unreachable!("reply frames are handled by reply_call_id above")
            }
        }
    }
}
