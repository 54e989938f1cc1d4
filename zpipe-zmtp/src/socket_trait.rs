//! Trait-based socket API.
//!
//! The sender and worker loops are written against these traits rather than
//! the concrete sockets, so they can be driven by in-memory mocks in tests.

use bytes::Bytes;
use std::io;
use std::time::Duration;

/// Socket that sends whole multipart messages.
///
/// # Examples
///
/// ```no_run
/// use zpipe_zmtp::SendSocket;
/// use bytes::Bytes;
/// use std::io;
///
/// async fn greet<S: SendSocket>(socket: &mut S) -> io::Result<()> {
///     socket.send(vec![Bytes::from_static(b"hello")]).await
/// }
/// ```
#[async_trait::async_trait(?Send)]
pub trait SendSocket {
    /// Send a multipart message.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Message handed to a peer
    /// - `Err(io::Error)` - Send failed (timeout, no accept task, etc.)
    async fn send(&mut self, msg: Vec<Bytes>) -> io::Result<()>;
}

/// Socket that receives one frame at a time.
///
/// Mirrors the libzmq receive model: `poll` waits (bounded) for readability,
/// `recv_frame` takes one frame and `has_more` reports the MORE flag of the
/// frame just taken (ZMQ_RCVMORE).
#[async_trait::async_trait(?Send)]
pub trait RecvSocket {
    /// Wait up to `timeout` for a frame.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` - A frame is ready for `recv_frame`
    /// - `Ok(false)` - Timeout elapsed with nothing to read
    /// - `Err(io::Error)` - The connection failed
    async fn poll(&mut self, timeout: Duration) -> io::Result<bool>;

    /// Receive the next frame, waiting if none is buffered.
    async fn recv_frame(&mut self) -> io::Result<Bytes>;

    /// Whether the frame last returned by `recv_frame` had the MORE flag.
    fn has_more(&self) -> bool;
}
