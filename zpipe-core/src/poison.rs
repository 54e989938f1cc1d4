//! RAII guard against half-written messages.
//!
//! A multipart message is written as several `write_all` calls. If the future
//! driving them is dropped (send timeout, task cancellation) the peer sees a
//! truncated frame and the stream can no longer be framed. The guard marks
//! the connection poisoned for the whole critical section; only `disarm()`
//! after the last write clears it.
//!
//! ```rust
//! use zpipe_core::poison::PoisonGuard;
//!
//! let mut poisoned = false;
//! {
//!     let guard = PoisonGuard::new(&mut poisoned);
//!     // ... write every frame of the message ...
//!     guard.disarm();
//! }
//! assert!(!poisoned);
//! ```
//!
//! A poisoned connection must be dropped, never reused.

/// Marks a connection poisoned unless disarmed before drop.
pub struct PoisonGuard<'a> {
    flag: &'a mut bool,
}

impl<'a> PoisonGuard<'a> {
    /// Arm the guard; the flag is set immediately.
    #[inline]
    pub fn new(flag: &'a mut bool) -> Self {
        *flag = true;
        Self { flag }
    }

    /// Clear the flag. Call only once the whole message is on the wire.
    #[inline]
    pub fn disarm(self) {
        *self.flag = false;
    }
}
