//! PUSH socket implementation
//!
//! PUSH is the send-only end of the pipeline pattern. The socket binds, a
//! background task accepts PULL peers and completes their handshake, and each
//! message goes to the next connected peer in round-robin order.
//!
//! # Characteristics
//!
//! - **Send-only**: never reads application data
//! - **Load balancing**: one whole message per peer, round-robin
//! - **Blocking when idle**: `send` waits until at least one peer is connected,
//!   as libzmq does at the high water mark
//! - **Peer failure**: a peer whose write fails is dropped and the message
//!   goes to the next peer. A peer that closes its end is noticed by a
//!   watcher task and leaves the round-robin set before the next send.
//! - **Release on drop**: dropping the socket stops the accept task, so the
//!   port can be bound again at once

use bytes::{Bytes, BytesMut};
use compio::buf::BufResult;
use compio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use compio::net::{TcpListener, TcpStream};
use std::cell::Cell;
use std::io;
use std::net::SocketAddr;
use std::rc::Rc;
use tracing::{debug, info, trace, warn};
use zpipe_core::endpoint::Endpoint;
use zpipe_core::options::SocketOptions;
use zpipe_core::poison::PoisonGuard;

use crate::codec::{put_frame_header, FLAG_MORE};
use crate::handshake::perform_handshake_with_timeout;
use crate::signal::{close_signal, CloseGuard, OnClose};
use crate::socket_type::SocketType;

/// A PULL peer that completed the handshake.
struct PushPeer {
    /// Shared with the watcher task, which only reads.
    stream: Rc<TcpStream>,
    addr: SocketAddr,
    /// Set while a message is partially written; see `PoisonGuard`.
    poisoned: bool,
    /// Set by the watcher once the peer has closed its end.
    gone: Rc<Cell<bool>>,
}

/// PUSH socket bound to a TCP endpoint.
pub struct PushSocket {
    endpoint: Endpoint,
    peers: Vec<PushPeer>,
    incoming: flume::Receiver<PushPeer>,
    next_peer: usize,
    write_buf: BytesMut,
    options: SocketOptions,
    /// Stops the accept task and the peer watchers when the socket is dropped.
    _guard: CloseGuard,
}

impl PushSocket {
    /// Bind to `endpoint` with default options and start accepting peers.
    ///
    /// Must be called from inside a `compio` runtime.
    pub async fn bind(endpoint: Endpoint) -> io::Result<Self> {
        Self::bind_with_options(endpoint, SocketOptions::default()).await
    }

    /// Bind to `endpoint` with custom socket options.
    pub async fn bind_with_options(endpoint: Endpoint, options: SocketOptions) -> io::Result<Self> {
        let listener = TcpListener::bind(endpoint.socket_addr()).await?;
        let local = Endpoint::from(listener.local_addr()?);
        debug!("[PUSH] Bound to {}", local);

        let (tx, incoming) = flume::unbounded();
        let (guard, on_close) = close_signal();
        compio::runtime::spawn(accept_loop(listener, tx, on_close, options.clone())).detach();

        Ok(Self {
            endpoint: local,
            peers: Vec::new(),
            incoming,
            next_peer: 0,
            write_buf: BytesMut::with_capacity(options.write_buffer_size),
            options,
            _guard: guard,
        })
    }

    /// The endpoint actually bound (port 0 resolved).
    #[inline]
    pub const fn local_endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// Number of peers that completed the handshake and are still healthy.
    pub fn peer_count(&mut self) -> usize {
        self.collect_peers();
        self.peers.len()
    }

    /// Wait until at least `n` peers are connected.
    pub async fn wait_for_peers(&mut self, n: usize) -> io::Result<()> {
        while self.peer_count() < n {
            self.wait_for_peer().await?;
        }
        Ok(())
    }

    /// Send one multipart message to the next peer.
    ///
    /// Blocks while no peer is connected. With `send_timeout` set, fails with
    /// `TimedOut` once it elapses; a peer interrupted mid-message is dropped.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an empty message, `TimedOut` on send timeout,
    /// `BrokenPipe` if the accept task has stopped.
    pub async fn send(&mut self, msg: Vec<Bytes>) -> io::Result<()> {
        if msg.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot send a message with zero frames",
            ));
        }

        match self.options.send_timeout {
            None => self.send_round_robin(&msg).await,
            Some(dur) => compio::time::timeout(dur, self.send_round_robin(&msg))
                .await
                .map_err(|_| {
                    io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("send timed out after {dur:?}"),
                    )
                })?,
        }
    }

    async fn send_round_robin(&mut self, msg: &[Bytes]) -> io::Result<()> {
        loop {
            self.collect_peers();
            if self.peers.is_empty() {
                self.wait_for_peer().await?;
                continue;
            }

            let idx = self.next_peer % self.peers.len();
            let peer = &mut self.peers[idx];
            match write_message(peer, msg, &mut self.write_buf, self.options.write_buffer_size)
                .await
            {
                Ok(()) => {
                    trace!("[PUSH] Sent {} frames to {}", msg.len(), peer.addr);
                    self.next_peer = idx + 1;
                    return Ok(());
                }
                Err(e) => {
                    warn!(peer = %peer.addr, error = %e, "[PUSH] Dropping peer after failed send");
                    self.peers.remove(idx);
                    self.write_buf.clear();
                }
            }
        }
    }

    /// Move freshly accepted peers into the round-robin set and drop
    /// peers that disconnected or were left poisoned by a cancelled send.
    fn collect_peers(&mut self) {
        self.peers.retain(|peer| {
            if peer.poisoned {
                warn!(peer = %peer.addr, "[PUSH] Dropping peer with a half-written message");
            } else if peer.gone.get() {
                info!("[PUSH] Peer {} disconnected", peer.addr);
            }
            !peer.poisoned && !peer.gone.get()
        });
        while let Ok(peer) = self.incoming.try_recv() {
            info!("[PUSH] Peer {} connected", peer.addr);
            self.peers.push(peer);
        }
    }

    async fn wait_for_peer(&mut self) -> io::Result<()> {
        let peer = self.incoming.recv_async().await.map_err(|_| {
            io::Error::new(io::ErrorKind::BrokenPipe, "PUSH accept task stopped")
        })?;
        info!("[PUSH] Peer {} connected", peer.addr);
        self.peers.push(peer);
        Ok(())
    }
}

/// Write every frame of `msg` to `peer`.
///
/// Headers and small bodies are coalesced in `write_buf`; bodies larger
/// than `coalesce_limit` go to the socket straight from their `Bytes`.
async fn write_message(
    peer: &mut PushPeer,
    msg: &[Bytes],
    write_buf: &mut BytesMut,
    coalesce_limit: usize,
) -> io::Result<()> {
    let PushPeer {
        stream, poisoned, ..
    } = peer;
    let mut stream: &TcpStream = stream;
    let guard = PoisonGuard::new(poisoned);
    // A cancelled send can leave a partial message behind.
    write_buf.clear();

    let last = msg.len() - 1;
    for (i, frame) in msg.iter().enumerate() {
        let flags = if i < last { FLAG_MORE } else { 0 };
        put_frame_header(write_buf, flags, frame.len());

        if frame.len() <= coalesce_limit {
            write_buf.extend_from_slice(frame);
            continue;
        }

        flush(&mut stream, write_buf).await?;
        let BufResult(res, _) = stream.write_all(frame.clone()).await;
        res?;
    }
    flush(&mut stream, write_buf).await?;

    guard.disarm();
    Ok(())
}

async fn flush<W: AsyncWrite>(stream: &mut W, write_buf: &mut BytesMut) -> io::Result<()> {
    if write_buf.is_empty() {
        return Ok(());
    }
    let BufResult(res, _) = stream.write_all(write_buf.split().freeze()).await;
    res
}

/// Accept connections until the socket is dropped. Each connection is
/// handshaken in its own task so a stalled peer cannot block the others.
async fn accept_loop(
    listener: TcpListener,
    peers: flume::Sender<PushPeer>,
    on_close: OnClose,
    options: SocketOptions,
) {
    while let Some(accepted) = on_close.run(listener.accept()).await {
        let (stream, addr) = match accepted {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "[PUSH] Accept failed");
                continue;
            }
        };

        let peers = peers.clone();
        let on_close = on_close.clone();
        let options = options.clone();
        compio::runtime::spawn(async move {
            let handshake = on_close.run(handshake_peer(stream, addr, &options)).await;
            match handshake {
                Some(Ok(peer)) => {
                    let watch = watch_peer(Rc::clone(&peer.stream), Rc::clone(&peer.gone), addr);
                    compio::runtime::spawn(async move { on_close.run(watch).await }).detach();
                    let _ = peers.send_async(peer).await;
                }
                Some(Err(e)) => warn!(peer = %addr, error = %e, "[PUSH] Handshake failed"),
                None => {}
            }
        })
        .detach();
    }
    debug!("[PUSH] Socket dropped, accept loop exiting");
}

async fn handshake_peer(
    mut stream: TcpStream,
    addr: SocketAddr,
    options: &SocketOptions,
) -> io::Result<PushPeer> {
    zpipe_core::tcp::enable_tcp_nodelay(&stream)?;
    let handshake =
        perform_handshake_with_timeout(&mut stream, SocketType::Push, options.handshake_deadline())
            .await?;
    debug!(
        peer = %addr,
        identity = ?handshake.peer_identity,
        "[PUSH] Handshake done, peer is {}",
        handshake.peer_socket_type
    );
    Ok(PushPeer {
        stream: Rc::new(stream),
        addr,
        poisoned: false,
        gone: Rc::new(Cell::new(false)),
    })
}

/// Wait for a peer to close its end.
///
/// PULL peers send nothing after the handshake, so anything read is
/// discarded and end-of-stream or a read error marks the peer gone.
async fn watch_peer(stream: Rc<TcpStream>, gone: Rc<Cell<bool>>, addr: SocketAddr) {
    let mut reader: &TcpStream = &stream;
    loop {
        let BufResult(res, _) = reader.read(Vec::with_capacity(64)).await;
        match res {
            Ok(0) => break,
            Ok(n) => trace!(peer = %addr, "[PUSH] Discarding {} bytes from peer", n),
            Err(e) => {
                debug!(peer = %addr, error = %e, "[PUSH] Peer read failed");
                break;
            }
        }
    }
    gone.set(true);
}

#[async_trait::async_trait(?Send)]
impl crate::SendSocket for PushSocket {
    async fn send(&mut self, msg: Vec<Bytes>) -> io::Result<()> {
        PushSocket::send(self, msg).await
    }
}
