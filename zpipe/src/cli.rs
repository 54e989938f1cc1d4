//! Command line flags for `zpipe-sender` and `zpipe-worker`.

use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;
use zpipe_core::endpoint::Endpoint;
use zpipe_core::error::Result;

use crate::config::{PoolConfig, SenderConfig, WorkerConfig};

/// Push fixed-size multipart messages to a pool of PULL workers
#[derive(Debug, Parser)]
#[command(name = "zpipe-sender", version)]
pub struct SenderArgs {
    /// Address to bind
    #[arg(short, long, default_value = "127.0.0.1")]
    pub ip: IpAddr,

    /// TCP port
    #[arg(short, long, default_value_t = 9999)]
    pub port: u16,

    /// Number of messages to send
    #[arg(short = 'n', long, default_value_t = 1000)]
    pub count: u64,

    /// Size of the blob frame in bytes
    #[arg(short = 's', long, default_value_t = 10 * 1024 * 1024)]
    pub payload_size: usize,

    /// Value of the sender identifier frame
    #[arg(long, default_value_t = 0)]
    pub sender_id: u64,

    /// Send every file in this directory (sorted) instead of synthetic messages
    #[arg(long)]
    pub replay_dir: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl SenderArgs {
    pub fn into_config(self) -> Result<SenderConfig> {
        let mut config = SenderConfig::new(Endpoint::tcp(self.ip, self.port))
            .with_count(self.count)
            .with_payload_size(self.payload_size)
            .with_sender_id(self.sender_id);
        if let Some(dir) = self.replay_dir {
            config = config.with_replay_dir(dir);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Pull messages with a pool of workers and count them
#[derive(Debug, Parser)]
#[command(name = "zpipe-worker", version)]
pub struct WorkerArgs {
    /// Address of the sender
    #[arg(short, long, default_value = "169.254.254.1")]
    pub ip: IpAddr,

    /// TCP port
    #[arg(short, long, default_value_t = 9999)]
    pub port: u16,

    /// Number of workers
    #[arg(short = 'n', long, default_value_t = 4)]
    pub workers: usize,

    /// Log the length of every received message
    #[arg(short, long)]
    pub verbose: bool,

    /// Log the running total every N messages
    #[arg(short = 'x', long, default_value_t = 100)]
    pub print_every: u64,

    /// Poll timeout in milliseconds
    #[arg(long, default_value_t = 1)]
    pub poll_ms: u64,

    /// Write every received frame to this directory (created if missing)
    #[arg(short = 'd', long)]
    pub dump_dir: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl WorkerArgs {
    pub fn into_config(self) -> Result<PoolConfig> {
        let mut worker = WorkerConfig::new(Endpoint::tcp(self.ip, self.port))
            .with_verbose(self.verbose)
            .with_print_every(self.print_every)
            .with_poll_timeout(Duration::from_millis(self.poll_ms));
        if let Some(dir) = self.dump_dir {
            worker = worker.with_dump_dir(dir);
        }
        let config = PoolConfig::new(self.workers, worker);
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zpipe_core::error::ZpipeError;

    #[test]
    fn test_sender_defaults() {
        let args = SenderArgs::try_parse_from(["zpipe-sender"]).unwrap();
        assert_eq!(args.log_level, "info");
        let config = args.into_config().unwrap();
        assert_eq!(config.endpoint.to_string(), "tcp://127.0.0.1:9999");
        assert_eq!(config.count, 1000);
        assert_eq!(config.payload_size, 10_485_760);
        assert_eq!(config.sender_id, 0);
        assert!(config.replay_dir.is_none());
    }

    #[test]
    fn test_sender_flags() {
        let args = SenderArgs::try_parse_from([
            "zpipe-sender",
            "-i",
            "0.0.0.0",
            "-p",
            "5555",
            "-n",
            "10",
            "-s",
            "1024",
            "--sender-id",
            "2",
            "--replay-dir",
            "/data/stream",
        ])
        .unwrap();
        let config = args.into_config().unwrap();
        assert_eq!(config.endpoint.to_string(), "tcp://0.0.0.0:5555");
        assert_eq!(config.count, 10);
        assert_eq!(config.payload_size, 1024);
        assert_eq!(config.sender_id, 2);
        assert_eq!(config.replay_dir, Some(PathBuf::from("/data/stream")));
    }

    #[test]
    fn test_sender_rejects_zero_count() {
        let args = SenderArgs::try_parse_from(["zpipe-sender", "-n", "0"]).unwrap();
        assert!(matches!(args.into_config(), Err(ZpipeError::Config(_))));
    }

    #[test]
    fn test_sender_rejects_bad_ip() {
        assert!(SenderArgs::try_parse_from(["zpipe-sender", "-i", "localhost:1"]).is_err());
    }

    #[test]
    fn test_worker_defaults() {
        let config = WorkerArgs::try_parse_from(["zpipe-worker"])
            .unwrap()
            .into_config()
            .unwrap();
        assert_eq!(config.workers, 4);
        assert_eq!(config.worker.endpoint.to_string(), "tcp://169.254.254.1:9999");
        assert_eq!(config.worker.print_every, 100);
        assert_eq!(config.worker.poll_timeout, Duration::from_millis(1));
        assert!(!config.worker.verbose);
        assert!(config.worker.dump_dir.is_none());
    }

    #[test]
    fn test_worker_flags() {
        let config = WorkerArgs::try_parse_from([
            "zpipe-worker",
            "-i",
            "127.0.0.1",
            "-n",
            "8",
            "-v",
            "-x",
            "10",
            "--poll-ms",
            "5",
            "-d",
            "/data/dump",
        ])
        .unwrap()
        .into_config()
        .unwrap();
        assert_eq!(config.workers, 8);
        assert!(config.worker.verbose);
        assert_eq!(config.worker.print_every, 10);
        assert_eq!(config.worker.poll_timeout, Duration::from_millis(5));
        assert_eq!(config.worker.dump_dir, Some(PathBuf::from("/data/dump")));
    }

    #[test]
    fn test_worker_rejects_zero_interval_and_pool() {
        let x0 = WorkerArgs::try_parse_from(["zpipe-worker", "-x", "0"]).unwrap();
        assert!(x0.into_config().is_err());
        let n0 = WorkerArgs::try_parse_from(["zpipe-worker", "-n", "0"]).unwrap();
        assert!(n0.into_config().is_err());
    }
}
