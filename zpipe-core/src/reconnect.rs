//! Reconnection backoff, following libzmq's reconnect_ivl / reconnect_ivl_max.

use crate::options::SocketOptions;
use std::time::Duration;

/// Tracks connection attempts and computes the delay before the next one.
///
/// # Example
///
/// ```rust
/// use zpipe_core::reconnect::ReconnectState;
/// use zpipe_core::options::SocketOptions;
/// use std::time::Duration;
///
/// let options = SocketOptions::default()
///     .with_reconnect_ivl(Duration::from_millis(100))
///     .with_reconnect_ivl_max(Duration::from_secs(10));
///
/// let mut reconnect = ReconnectState::new(&options);
/// assert_eq!(reconnect.next_delay(), Duration::from_millis(100));
/// assert_eq!(reconnect.next_delay(), Duration::from_millis(200));
///
/// reconnect.reset();
/// assert_eq!(reconnect.next_delay(), Duration::from_millis(100));
/// ```
#[derive(Debug, Clone)]
pub struct ReconnectState {
    base_interval: Duration,
    max_interval: Duration,
    attempt: u32,
    current_interval: Duration,
}

impl ReconnectState {
    /// Create a tracker from socket options.
    ///
    /// A `reconnect_ivl_max` below `reconnect_ivl` disables the backoff and
    /// every attempt waits `reconnect_ivl`.
    pub fn new(options: &SocketOptions) -> Self {
        let base = options.reconnect_ivl;
        Self {
            base_interval: base,
            max_interval: options.reconnect_ivl_max.max(base),
            attempt: 0,
            current_interval: base,
        }
    }

    /// Delay to wait before the next attempt; doubles up to the maximum.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current_interval;

        self.attempt = self.attempt.saturating_add(1);
        self.current_interval = self
            .base_interval
            .saturating_mul(1_u32 << self.attempt.min(10))
            .min(self.max_interval);

        delay
    }

    /// Reset after a successful connection.
    pub fn reset(&mut self) {
        self.attempt = 0;
        self.current_interval = self.base_interval;
    }

    /// Number of attempts since the last reset.
    #[inline]
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }
}
