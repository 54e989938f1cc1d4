//! Explicit configuration for the sender, a worker and the worker pool.
//!
//! Each component takes its config at construction; nothing is read from
//! globals after startup.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;
use zpipe_core::endpoint::Endpoint;
use zpipe_core::error::{Result, ZpipeError};
use zpipe_core::options::SocketOptions;

pub const DEFAULT_PORT: u16 = 9999;
pub const DEFAULT_SENDER_IP: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
/// Link-local address of the detector control unit.
pub const DEFAULT_WORKER_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(169, 254, 254, 1));
pub const DEFAULT_COUNT: u64 = 1000;
/// 10 MiB blob.
pub const DEFAULT_PAYLOAD_SIZE: usize = 10 * 1024 * 1024;
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_PRINT_EVERY: u64 = 100;
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(1);

/// Sender configuration.
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Endpoint the PUSH socket binds to.
    pub endpoint: Endpoint,
    /// Number of synthetic messages to send.
    pub count: u64,
    /// Size of the zero-filled blob frame.
    pub payload_size: usize,
    /// Value of the identifier frame.
    pub sender_id: u64,
    /// Replay every file in this directory instead of sending synthetic
    /// messages; `count` is ignored.
    pub replay_dir: Option<PathBuf>,
    pub options: SocketOptions,
}

impl SenderConfig {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            count: DEFAULT_COUNT,
            payload_size: DEFAULT_PAYLOAD_SIZE,
            sender_id: 0,
            replay_dir: None,
            options: SocketOptions::default(),
        }
    }

    #[must_use]
    pub fn with_count(mut self, count: u64) -> Self {
        self.count = count;
        self
    }

    #[must_use]
    pub fn with_payload_size(mut self, size: usize) -> Self {
        self.payload_size = size;
        self
    }

    #[must_use]
    pub fn with_sender_id(mut self, id: u64) -> Self {
        self.sender_id = id;
        self
    }

    #[must_use]
    pub fn with_replay_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.replay_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: SocketOptions) -> Self {
        self.options = options;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.replay_dir.is_none() && self.count == 0 {
            return Err(ZpipeError::config("message count must be at least 1"));
        }
        Ok(())
    }
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self::new(Endpoint::tcp(DEFAULT_SENDER_IP, DEFAULT_PORT))
    }
}

/// Configuration of one worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Endpoint the PULL socket connects to.
    pub endpoint: Endpoint,
    /// Log the byte length of every reassembled message.
    pub verbose: bool,
    /// Log the running total every `print_every` messages.
    pub print_every: u64,
    /// Upper bound on a single poll.
    pub poll_timeout: Duration,
    /// Write every received frame to this directory.
    pub dump_dir: Option<PathBuf>,
    pub options: SocketOptions,
}

impl WorkerConfig {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            verbose: false,
            print_every: DEFAULT_PRINT_EVERY,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            dump_dir: None,
            options: SocketOptions::default(),
        }
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_print_every(mut self, n: u64) -> Self {
        self.print_every = n;
        self
    }

    #[must_use]
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dump_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: SocketOptions) -> Self {
        self.options = options;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.print_every == 0 {
            return Err(ZpipeError::config("print interval must be at least 1"));
        }
        Ok(())
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::new(Endpoint::tcp(DEFAULT_WORKER_IP, DEFAULT_PORT))
    }
}

/// Worker pool configuration: `workers` copies of the same worker config.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub workers: usize,
    pub worker: WorkerConfig,
}

impl PoolConfig {
    pub fn new(workers: usize, worker: WorkerConfig) -> Self {
        Self { workers, worker }
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(ZpipeError::config("worker count must be at least 1"));
        }
        self.worker.validate()
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS, WorkerConfig::default())
    }
}
