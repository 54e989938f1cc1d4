//! Socket configuration options
//!
//! The subset of libzmq socket options (zmq_setsockopt) that the PUSH/PULL
//! transport honours.

use std::time::Duration;

/// Default read buffer size (64KB).
///
/// The benchmark payload is megabytes per message, so reads are sized for
/// throughput rather than latency.
pub const DEFAULT_READ_BUF_SIZE: usize = 64 * 1024;

/// Default write buffer size (8KB).
///
/// Frames up to this size are coalesced into one write; larger bodies are
/// written directly from their `Bytes` without copying.
pub const DEFAULT_WRITE_BUF_SIZE: usize = 8 * 1024;

/// Socket configuration options.
///
/// # Examples
///
/// ```
/// use zpipe_core::options::SocketOptions;
/// use std::time::Duration;
///
/// let opts = SocketOptions::default()
///     .with_handshake_timeout(Duration::from_secs(5))
///     .with_reconnect_ivl(Duration::from_millis(50));
/// ```
#[derive(Debug, Clone)]
pub struct SocketOptions {
    /// Send timeout (ZMQ_SNDTIMEO)
    ///
    /// - `None`: Block indefinitely (default)
    /// - `Some(duration)`: Fail the send with `TimedOut` after duration
    pub send_timeout: Option<Duration>,

    /// Handshake timeout (ZMQ_HANDSHAKE_IVL)
    ///
    /// Maximum time to complete the ZMTP handshake after connection.
    /// `Duration::ZERO` disables the timeout.
    pub handshake_timeout: Duration,

    /// Reconnect interval (ZMQ_RECONNECT_IVL)
    ///
    /// Initial delay between connection attempts. Default: 100ms
    pub reconnect_ivl: Duration,

    /// Maximum reconnect interval (ZMQ_RECONNECT_IVL_MAX)
    ///
    /// Upper bound for exponential backoff. Default: 5s
    pub reconnect_ivl_max: Duration,

    /// Receive high water mark (ZMQ_RCVHWM)
    ///
    /// Maximum number of decoded frames queued between the connection task
    /// and the application. The connection task stops reading when full.
    pub recv_hwm: usize,

    /// Read buffer size (bytes)
    pub read_buffer_size: usize,

    /// Write buffer size (bytes)
    pub write_buffer_size: usize,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            send_timeout: None,
            handshake_timeout: Duration::from_secs(30),
            reconnect_ivl: Duration::from_millis(100),
            reconnect_ivl_max: Duration::from_secs(5),
            recv_hwm: 1000,
            read_buffer_size: DEFAULT_READ_BUF_SIZE,
            write_buffer_size: DEFAULT_WRITE_BUF_SIZE,
        }
    }
}

impl SocketOptions {
    /// Create new socket options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set send timeout.
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    /// Set handshake timeout.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set reconnection interval.
    pub fn with_reconnect_ivl(mut self, ivl: Duration) -> Self {
        self.reconnect_ivl = ivl;
        self
    }

    /// Set maximum reconnection interval for exponential backoff.
    pub fn with_reconnect_ivl_max(mut self, max: Duration) -> Self {
        self.reconnect_ivl_max = max;
        self
    }

    /// Set receive high water mark (minimum 1).
    pub fn with_recv_hwm(mut self, hwm: usize) -> Self {
        self.recv_hwm = hwm.max(1);
        self
    }

    /// Set both read and write buffer sizes.
    pub fn with_buffer_sizes(mut self, read: usize, write: usize) -> Self {
        self.read_buffer_size = read;
        self.write_buffer_size = write;
        self
    }

    /// Handshake timeout as an `Option`, `None` when disabled.
    #[inline]
    pub fn handshake_deadline(&self) -> Option<Duration> {
        (!self.handshake_timeout.is_zero()).then_some(self.handshake_timeout)
    }
}
