//! Drop-to-stop signal shared by a socket and its background tasks.
//!
//! The socket owns the [`CloseGuard`]; every task it spawns holds an
//! [`OnClose`] and races its awaits against it. Nothing is ever sent on the
//! channel, so the receiving side resolves exactly when the guard is dropped.

use futures::future::{select, Either};
use std::future::Future;
use std::pin::pin;

/// Held by the socket. Dropping it stops the tasks.
#[derive(Debug)]
pub(crate) struct CloseGuard(#[allow(dead_code)] flume::Sender<()>);

/// Held by background tasks.
#[derive(Debug, Clone)]
pub(crate) struct OnClose(flume::Receiver<()>);

pub(crate) fn close_signal() -> (CloseGuard, OnClose) {
    let (tx, rx) = flume::bounded(1);
    (CloseGuard(tx), OnClose(rx))
}

impl OnClose {
    /// Run `fut` to completion, or return `None` as soon as the socket is
    /// dropped. `fut` is dropped (and its I/O cancelled) in that case.
    pub(crate) async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        match select(pin!(fut), pin!(self.0.recv_async())).await {
            Either::Left((out, _)) => Some(out),
            Either::Right(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use futures::future::{pending, ready};

    #[test]
    fn test_completes_while_open() {
        let (_guard, on_close) = close_signal();
        assert_eq!(block_on(on_close.run(ready(7))), Some(7));
    }

    #[test]
    fn test_dropping_guard_interrupts_pending_work() {
        let (guard, on_close) = close_signal();
        let task = on_close.clone();
        drop(guard);
        assert_eq!(block_on(task.run(pending::<()>())), None);
    }
}
