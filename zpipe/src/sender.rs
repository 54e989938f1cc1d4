//! Sender loop: stamp the template with each index and push it.

use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use zpipe_core::error::Result;
use zpipe_zmtp::{PushSocket, SendSocket};

use crate::config::SenderConfig;
use crate::message::MessageTemplate;
use crate::replay;

const MIB: f64 = 1024.0 * 1024.0;

/// Outcome of a sender run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendReport {
    pub sent: u64,
    pub failed: u64,
    /// Frame body bytes of the messages that were sent.
    pub bytes: u64,
    pub elapsed: Duration,
}

impl SendReport {
    fn record(&mut self, bytes: usize) {
        self.sent += 1;
        self.bytes += bytes as u64;
    }

    pub fn messages_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.sent as f64 / secs
        } else {
            0.0
        }
    }

    pub fn mib_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.bytes as f64 / MIB / secs
        } else {
            0.0
        }
    }

    fn log(&self) {
        info!(
            sent = self.sent,
            failed = self.failed,
            "sender finished in {:.3} seconds ({:.1} msg/s, {:.1} MiB/s)",
            self.elapsed.as_secs_f64(),
            self.messages_per_sec(),
            self.mib_per_sec()
        );
    }
}

/// Drives a [`SendSocket`] according to a [`SenderConfig`].
pub struct Sender<S> {
    socket: S,
    config: SenderConfig,
}

impl<S: SendSocket> Sender<S> {
    pub fn new(socket: S, config: SenderConfig) -> Self {
        Self { socket, config }
    }

    /// Send the configured messages: replayed files when a replay directory
    /// is set, otherwise `count` synthetic messages.
    pub async fn run(&mut self) -> Result<SendReport> {
        let report = match self.config.replay_dir.clone() {
            Some(dir) => self.replay(&dir).await?,
            None => self.send_synthetic().await,
        };
        report.log();
        Ok(report)
    }

    /// Send `count` messages with sequence numbers `0..count`.
    ///
    /// A failed send is logged and skipped; the loop always runs to the end.
    pub async fn send_synthetic(&mut self) -> SendReport {
        let mut template = MessageTemplate::new(self.config.sender_id, self.config.payload_size);
        let mut report = SendReport::default();
        let start = Instant::now();

        for seq in 0..self.config.count {
            template.set_sequence(seq);
            match self.socket.send(template.frames()).await {
                Ok(()) => {
                    report.record(template.wire_size());
                    info!("sender sent message {}", seq);
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(seq, error = %e, "send failed");
                }
            }
        }

        report.elapsed = start.elapsed();
        report
    }

    /// Send each file in `dir`, in file-name order, as a one-frame message.
    pub async fn replay(&mut self, dir: &Path) -> Result<SendReport> {
        let files = replay::list_files(dir)?;
        let mut report = SendReport::default();
        let start = Instant::now();

        for (i, path) in files.iter().enumerate() {
            let frame = replay::load(path)?;
            let len = frame.len();
            match self.socket.send(vec![frame]).await {
                Ok(()) => {
                    report.record(len);
                    info!("sender sent message {} ({})", i, path.display());
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(seq = i, path = %path.display(), error = %e, "send failed");
                }
            }
        }

        report.elapsed = start.elapsed();
        Ok(report)
    }

    pub fn into_socket(self) -> S {
        self.socket
    }
}

/// Bind a PUSH socket for `config` and run the sender to completion.
pub async fn run(config: SenderConfig) -> Result<SendReport> {
    config.validate()?;

    let socket = PushSocket::bind_with_options(config.endpoint, config.options.clone()).await?;
    info!("serving {}", socket.local_endpoint());

    Sender::new(socket, config).run().await
}
