//! Worker polling loop.
//!
//! A worker has one state, polling. When a poll reports data the whole
//! message is drained with [`receive_multipart`], counted, optionally
//! written to the dump directory, and polling resumes.

use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use zpipe_zmtp::{PullSocket, RecvSocket};

use crate::config::WorkerConfig;
use crate::dump::FrameDump;
use crate::reassembly::{message_len, receive_multipart};

/// Per-worker message counter.
///
/// Owned by its worker; the count is mirrored into an atomic so other
/// threads can read it.
#[derive(Debug)]
pub struct FrameCounter {
    total: u64,
    print_every: u64,
    mirror: Arc<AtomicU64>,
}

impl FrameCounter {
    pub fn new(print_every: u64) -> Self {
        Self::with_mirror(print_every, Arc::new(AtomicU64::new(0)))
    }

    pub fn with_mirror(print_every: u64, mirror: Arc<AtomicU64>) -> Self {
        mirror.store(0, Ordering::Relaxed);
        Self {
            total: 0,
            print_every: print_every.max(1),
            mirror,
        }
    }

    /// Count one message. Returns the new total when it is a multiple of
    /// the print interval.
    pub fn record(&mut self) -> Option<u64> {
        self.total += 1;
        self.mirror.store(self.total, Ordering::Relaxed);
        (self.total % self.print_every == 0).then_some(self.total)
    }

    #[inline]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Shared read-only view of the count.
    pub fn handle(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.mirror)
    }
}

/// What one iteration of the polling loop did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Poll timed out.
    Idle,
    /// A whole message was received and counted.
    Received,
    /// Poll or receive failed; the error was logged.
    Failed,
}

/// A single worker: one receive socket, one counter.
pub struct Worker<S> {
    id: usize,
    socket: S,
    config: WorkerConfig,
    counter: FrameCounter,
    dump: Option<FrameDump>,
}

impl Worker<PullSocket> {
    /// Connect a PULL socket to the configured endpoint.
    ///
    /// Must be called from inside a `compio` runtime.
    pub fn connect(id: usize, config: WorkerConfig) -> Self {
        let socket = PullSocket::connect_with_options(config.endpoint, config.options.clone());
        Self::new(id, socket, config)
    }
}

impl<S: RecvSocket> Worker<S> {
    pub fn new(id: usize, socket: S, config: WorkerConfig) -> Self {
        let counter = FrameCounter::new(config.print_every);
        let dump = config.dump_dir.as_ref().map(|dir| FrameDump::new(dir, id));
        Self {
            id,
            socket,
            config,
            counter,
            dump,
        }
    }

    /// Publish the count through `mirror` instead of a private atomic.
    #[must_use]
    pub fn with_mirror(mut self, mirror: Arc<AtomicU64>) -> Self {
        self.counter = FrameCounter::with_mirror(self.config.print_every, mirror);
        self
    }

    /// Messages received so far.
    #[inline]
    pub const fn received(&self) -> u64 {
        self.counter.total()
    }

    pub fn counter_handle(&self) -> Arc<AtomicU64> {
        self.counter.handle()
    }

    /// Poll once and, if data is ready, receive and count one message.
    pub async fn step(&mut self) -> Step {
        match self.socket.poll(self.config.poll_timeout).await {
            Ok(true) => {}
            Ok(false) => return Step::Idle,
            Err(e) => {
                warn!(worker = self.id, error = %e, "poll failed");
                return Step::Failed;
            }
        }

        match receive_multipart(&mut self.socket).await {
            Ok(frames) => {
                self.on_message(&frames);
                Step::Received
            }
            Err(e) => {
                warn!(worker = self.id, error = %e, "receive failed");
                Step::Failed
            }
        }
    }

    fn on_message(&mut self, frames: &[Bytes]) {
        let total = self.counter.record();
        if self.config.verbose {
            info!(
                frames = frames.len(),
                "worker {} received new message with length {}",
                self.id,
                message_len(frames)
            );
        }
        if let Some(total) = total {
            info!("worker {} received total {} messages", self.id, total);
        }
        if let Some(dump) = &self.dump {
            if let Err(e) = dump.write(self.counter.total(), frames) {
                warn!(worker = self.id, error = %e, "dump failed");
            }
        }
    }

    /// Poll forever.
    pub async fn run(&mut self) {
        info!(
            "worker {} printing after {} messages",
            self.id, self.counter.print_every
        );
        loop {
            self.step().await;
        }
    }

    /// Poll until `target` messages have been received in total.
    pub async fn run_until(&mut self, target: u64) {
        while self.received() < target {
            self.step().await;
        }
    }

    pub fn into_socket(self) -> S {
        self.socket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::collections::VecDeque;
    use std::io;
    use std::sync::Mutex;
    use std::time::Duration;

    enum Event {
        Timeout,
        PollError,
        Message(Vec<Bytes>),
    }

    /// Replays a list of poll outcomes; a `Message` is delivered frame by
    /// frame with MORE set on all but the last.
    #[derive(Default)]
    struct FakePull {
        events: VecDeque<Event>,
        frames: VecDeque<Bytes>,
        more: bool,
    }

    impl FakePull {
        fn push(&mut self, event: Event) {
            self.events.push_back(event);
        }

        fn push_messages(&mut self, n: usize, frames: usize) {
            for _ in 0..n {
                let msg = (0..frames).map(|_| Bytes::from_static(b"0123")).collect();
                self.push(Event::Message(msg));
            }
        }
    }

    #[async_trait::async_trait(?Send)]
    impl RecvSocket for FakePull {
        async fn poll(&mut self, _timeout: Duration) -> io::Result<bool> {
            if !self.frames.is_empty() {
                return Ok(true);
            }
            match self.events.pop_front() {
                None | Some(Event::Timeout) => Ok(false),
                Some(Event::PollError) => Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "connection lost",
                )),
                Some(Event::Message(frames)) => {
                    self.frames.extend(frames);
                    Ok(true)
                }
            }
        }

        async fn recv_frame(&mut self) -> io::Result<Bytes> {
            let frame = self
                .frames
                .pop_front()
                .ok_or_else(|| io::Error::from(io::ErrorKind::WouldBlock))?;
            self.more = !self.frames.is_empty();
            Ok(frame)
        }

        fn has_more(&self) -> bool {
            self.more
        }
    }

    fn worker(socket: FakePull) -> Worker<FakePull> {
        Worker::new(0, socket, WorkerConfig::default())
    }

    /// Run `f` with an INFO-level fmt subscriber and return what it logged.
    fn capture_logs(f: impl FnOnce()) -> String {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buf);
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || LogSink(Arc::clone(&sink)))
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buf.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    struct LogSink(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogSink {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_counter_progress_points() {
        let mut counter = FrameCounter::new(100);
        let points: Vec<u64> = (0..1000).filter_map(|_| counter.record()).collect();
        assert_eq!(points, (1..=10).map(|i| i * 100).collect::<Vec<_>>());
        assert_eq!(counter.total(), 1000);
        assert_eq!(counter.handle().load(Ordering::Relaxed), 1000);
    }

    #[test]
    fn test_counter_every_message() {
        let mut counter = FrameCounter::new(1);
        assert_eq!(counter.record(), Some(1));
        assert_eq!(counter.record(), Some(2));
    }

    #[test]
    fn test_step_outcomes() {
        let mut socket = FakePull::default();
        socket.push(Event::Timeout);
        socket.push_messages(1, 3);
        socket.push(Event::PollError);

        let mut worker = worker(socket);
        assert_eq!(block_on(worker.step()), Step::Idle);
        assert_eq!(block_on(worker.step()), Step::Received);
        assert_eq!(block_on(worker.step()), Step::Failed);
        assert_eq!(worker.received(), 1);
    }

    #[test]
    fn test_counter_is_monotonic_across_errors() {
        let mut socket = FakePull::default();
        for _ in 0..5 {
            socket.push_messages(2, 3);
            socket.push(Event::PollError);
            socket.push(Event::Timeout);
        }

        let mut worker = worker(socket);
        let handle = worker.counter_handle();
        let mut last = 0;
        for _ in 0..20 {
            block_on(worker.step());
            let now = handle.load(Ordering::Relaxed);
            assert!(now == last || now == last + 1);
            last = now;
        }
        assert_eq!(worker.received(), 10);
    }

    #[test]
    fn test_run_until_target() {
        let mut socket = FakePull::default();
        socket.push_messages(1000, 3);

        let mirror = Arc::new(AtomicU64::new(0));
        let mut worker = worker(socket).with_mirror(Arc::clone(&mirror));
        block_on(worker.run_until(1000));

        assert_eq!(worker.received(), 1000);
        assert_eq!(mirror.load(Ordering::Relaxed), 1000);
        assert!(worker.into_socket().events.is_empty());
    }

    #[test]
    fn test_progress_logged_every_hundred_messages() {
        let mut socket = FakePull::default();
        socket.push_messages(1000, 3);
        let mut worker = worker(socket);

        let logs = capture_logs(|| block_on(worker.run_until(1000)));

        let totals: Vec<&str> = logs
            .lines()
            .filter(|line| line.contains("received total"))
            .collect();
        assert_eq!(totals.len(), 10, "{logs}");
        for (i, k) in (100..=1000).step_by(100).enumerate() {
            assert!(
                totals[i].contains(&format!("worker 0 received total {k} messages")),
                "line {i}: {}",
                totals[i]
            );
        }
        assert!(!logs.contains("received new message"));
    }

    #[test]
    fn test_verbose_logs_message_length() {
        let mut socket = FakePull::default();
        socket.push_messages(3, 3);
        let config = WorkerConfig::default().with_verbose(true);
        let mut worker = Worker::new(2, socket, config);

        let logs = capture_logs(|| block_on(worker.run_until(3)));

        let lines: Vec<&str> = logs
            .lines()
            .filter(|line| line.contains("received new message"))
            .collect();
        assert_eq!(lines.len(), 3, "{logs}");
        for line in lines {
            // Three 4-byte frames.
            assert!(line.contains("worker 2 received new message with length 12"), "{line}");
            assert!(line.contains("frames=3"), "{line}");
        }
    }

    #[test]
    fn test_messages_dumped_per_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut socket = FakePull::default();
        socket.push_messages(2, 3);
        let config = WorkerConfig::default().with_dump_dir(dir.path());
        let mut worker = Worker::new(1, socket, config);

        block_on(worker.run_until(2));

        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(
            names,
            [
                "1_000001.000",
                "1_000001.001",
                "1_000001.002",
                "1_000002.000",
                "1_000002.001",
                "1_000002.002"
            ]
        );
        let body = std::fs::read(dir.path().join("1_000002.001")).unwrap();
        assert_eq!(body, b"0123");
    }

    #[test]
    fn test_dump_failure_does_not_stop_counting() {
        let dir = tempfile::tempdir().unwrap();
        let mut socket = FakePull::default();
        socket.push_messages(2, 1);
        let config = WorkerConfig::default().with_dump_dir(dir.path().join("absent"));
        let mut worker = Worker::new(0, socket, config);

        let logs = capture_logs(|| block_on(worker.run_until(2)));

        assert_eq!(worker.received(), 2);
        assert_eq!(logs.matches("dump failed").count(), 2, "{logs}");
    }
}
