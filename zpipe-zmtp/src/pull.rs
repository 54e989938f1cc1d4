//! PULL socket implementation
//!
//! PULL is the receive-only end of the pipeline pattern. The socket connects
//! to a PUSH endpoint from a background task which owns the TCP stream, runs
//! the handshake, decodes frames and queues them on a bounded channel.
//!
//! # Characteristics
//!
//! - **Receive-only**: never sends application data
//! - **Lazy connect**: `connect` returns at once; the peer may come up later
//! - **Reconnect**: lost or refused connections are retried with exponential
//!   backoff (`reconnect_ivl` doubling up to `reconnect_ivl_max`)
//! - **Bounded queue**: at most `recv_hwm` frames are buffered, after which
//!   the connection task stops reading and TCP flow control pushes back
//! - **Prompt close**: dropping the socket stops the connection task and
//!   closes the stream, even while it is parked in a read

use bytes::{Bytes, BytesMut};
use compio::buf::BufResult;
use compio::io::AsyncRead;
use compio::net::TcpStream;
use flume::TryRecvError;
use std::io;
use std::time::Duration;
use tracing::{debug, info, trace, warn};
use zpipe_core::buffer::SegmentedBuffer;
use zpipe_core::endpoint::Endpoint;
use zpipe_core::options::SocketOptions;
use zpipe_core::reconnect::ReconnectState;

use crate::codec::{ZmtpDecoder, ZmtpFrame};
use crate::handshake::perform_handshake_with_timeout;
use crate::signal::{close_signal, CloseGuard, OnClose};
use crate::socket_type::SocketType;

type FrameResult = io::Result<ZmtpFrame>;

/// PULL socket connected to a PUSH endpoint.
pub struct PullSocket {
    endpoint: Endpoint,
    frames: flume::Receiver<FrameResult>,
    /// Frame taken off the channel by `poll` but not yet by `recv_frame`.
    pending: Option<ZmtpFrame>,
    more: bool,
    /// Stops the connection task when the socket is dropped.
    _guard: CloseGuard,
}

impl PullSocket {
    /// Connect to `endpoint` with default options.
    ///
    /// Must be called from inside a `compio` runtime; the connection task is
    /// spawned on it.
    pub fn connect(endpoint: Endpoint) -> Self {
        Self::connect_with_options(endpoint, SocketOptions::default())
    }

    /// Connect to `endpoint` with custom socket options.
    pub fn connect_with_options(endpoint: Endpoint, options: SocketOptions) -> Self {
        let (tx, frames) = flume::bounded(options.recv_hwm);
        let (guard, on_close) = close_signal();
        debug!("[PULL] Connecting to {}", endpoint);
        compio::runtime::spawn(connection_loop(endpoint, tx, on_close, options)).detach();

        Self {
            endpoint,
            frames,
            pending: None,
            more: false,
            _guard: guard,
        }
    }

    /// The endpoint this socket connects to.
    #[inline]
    pub const fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// Wait up to `timeout` for a frame to become available.
    ///
    /// A zero timeout checks without waiting. Returns `Ok(false)` when the
    /// timeout elapses; a frame that arrives later is not lost.
    ///
    /// # Errors
    ///
    /// The error of a lost connection (reported once per connection), or
    /// `BrokenPipe` if the connection task has stopped.
    pub async fn poll(&mut self, timeout: Duration) -> io::Result<bool> {
        if self.pending.is_some() {
            return Ok(true);
        }

        // Only arm a timer when nothing is queued.
        let next = match self.frames.try_recv() {
            Ok(next) => next,
            Err(TryRecvError::Disconnected) => return Err(task_stopped()),
            Err(TryRecvError::Empty) if timeout.is_zero() => return Ok(false),
            Err(TryRecvError::Empty) => {
                match compio::time::timeout(timeout, self.frames.recv_async()).await {
                    Err(_) => return Ok(false),
                    Ok(Ok(next)) => next,
                    Ok(Err(_)) => return Err(task_stopped()),
                }
            }
        };

        self.pending = Some(next?);
        Ok(true)
    }

    /// Receive the next frame, waiting until one arrives.
    pub async fn recv_frame(&mut self) -> io::Result<Bytes> {
        let frame = match self.pending.take() {
            Some(frame) => Ok(frame),
            None => self
                .frames
                .recv_async()
                .await
                .map_err(|_| task_stopped())
                .and_then(|next| next),
        };

        match frame {
            Ok(frame) => {
                self.more = frame.more();
                Ok(frame.payload)
            }
            Err(e) => {
                self.more = false;
                Err(e)
            }
        }
    }

    /// Whether the last frame from `recv_frame` had the MORE flag set.
    #[inline]
    pub const fn has_more(&self) -> bool {
        self.more
    }
}

fn task_stopped() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "PULL connection task stopped")
}

/// Keep a connection to `endpoint` alive until the socket is dropped.
async fn connection_loop(
    endpoint: Endpoint,
    tx: flume::Sender<FrameResult>,
    on_close: OnClose,
    options: SocketOptions,
) {
    let mut backoff = ReconnectState::new(&options);

    loop {
        let Some(connected) = on_close.run(establish(endpoint, &options)).await else {
            break;
        };
        match connected {
            Ok(stream) => {
                backoff.reset();
                info!("[PULL] Connected to {}", endpoint);

                let Err(e) = pump(stream, &tx, &on_close, &options).await else {
                    break;
                };
                warn!(endpoint = %endpoint, error = %e, "[PULL] Connection lost");
                if tx.send_async(Err(e)).await.is_err() {
                    break;
                }
            }
            Err(e) => debug!(
                endpoint = %endpoint,
                error = %e,
                attempt = backoff.attempt(),
                "[PULL] Connect failed"
            ),
        }

        let delay = backoff.next_delay();
        if on_close.run(compio::time::sleep(delay)).await.is_none() {
            break;
        }
    }
    debug!("[PULL] Socket dropped, connection task exiting");
}

async fn establish(endpoint: Endpoint, options: &SocketOptions) -> io::Result<TcpStream> {
    let mut stream = TcpStream::connect(endpoint.socket_addr()).await?;
    zpipe_core::tcp::enable_tcp_nodelay(&stream)?;

    match perform_handshake_with_timeout(&mut stream, SocketType::Pull, options.handshake_deadline())
        .await
    {
        Ok(peer) => {
            debug!(
                endpoint = %endpoint,
                identity = ?peer.peer_identity,
                "[PULL] Handshake done, peer is {}",
                peer.peer_socket_type
            );
            Ok(stream)
        }
        Err(e) => {
            warn!(endpoint = %endpoint, error = %e, "[PULL] Handshake failed");
            Err(e)
        }
    }
}

/// Read, decode and forward frames until the connection fails.
///
/// Returns `Ok(())` only when the receiving socket has been dropped.
async fn pump(
    mut stream: TcpStream,
    tx: &flume::Sender<FrameResult>,
    on_close: &OnClose,
    options: &SocketOptions,
) -> io::Result<()> {
    let mut decoder = ZmtpDecoder::new();
    let mut recv = SegmentedBuffer::new();

    loop {
        while let Some(frame) = decoder.decode(&mut recv)? {
            if frame.is_command() {
                trace!("[PULL] Ignoring command frame ({} bytes)", frame.payload.len());
                continue;
            }
            if tx.send_async(Ok(frame)).await.is_err() {
                return Ok(());
            }
        }

        let buf = BytesMut::with_capacity(options.read_buffer_size);
        let Some(BufResult(res, buf)) = on_close.run(stream.read(buf)).await else {
            return Ok(());
        };
        match res? {
            0 if decoder.mid_frame() => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "peer closed the connection mid-frame",
                ))
            }
            0 => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "peer closed the connection",
                ))
            }
            n => {
                trace!("[PULL] Read {} bytes", n);
                recv.push(buf.freeze());
            }
        }
    }
}

#[async_trait::async_trait(?Send)]
impl crate::RecvSocket for PullSocket {
    async fn poll(&mut self, timeout: Duration) -> io::Result<bool> {
        PullSocket::poll(self, timeout).await
    }

    async fn recv_frame(&mut self) -> io::Result<Bytes> {
        PullSocket::recv_frame(self).await
    }

    fn has_more(&self) -> bool {
        PullSocket::has_more(self)
    }
}
