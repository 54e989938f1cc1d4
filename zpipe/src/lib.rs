//! # zpipe
//!
//! A PUSH/PULL load generator speaking the `ZeroMQ` wire protocol (ZMTP 3.x)
//! on top of `io_uring`.
//!
//! ## Architecture
//!
//! - **`zpipe-core`**: endpoints, socket options, reconnect backoff, buffers
//! - **`zpipe-zmtp`**: ZMTP codec, handshake, PUSH and PULL sockets
//! - **`zpipe`**: the benchmark itself (this crate)
//!
//! The sender builds one message `[sender id, sequence, blob]`, re-stamps
//! the sequence number for every send and pushes it to whichever workers are
//! connected. Each worker runs on its own thread and runtime, polls its PULL
//! socket, reassembles the multipart message and counts it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use zpipe::prelude::*;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoint = Endpoint::parse("tcp://127.0.0.1:9999")?;
//!
//! // Four workers, each on its own thread
//! let pool = WorkerPool::spawn(PoolConfig::new(4, WorkerConfig::new(endpoint)))?;
//!
//! // Sender on the current thread
//! compio::runtime::Runtime::new()?.block_on(async {
//!     let config = SenderConfig::new(endpoint).with_count(1000);
//!     zpipe::sender::run(config).await
//! })?;
//!
//! println!("received per worker: {:?}", pool.totals());
//! # Ok(())
//! # }
//! ```

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod cli;
pub mod config;
pub mod dump;
pub mod logging;
pub mod message;
pub mod pool;
pub mod reassembly;
pub mod replay;
pub mod sender;
pub mod worker;

pub use zpipe_core::endpoint::Endpoint;
pub use zpipe_core::error::{Result, ZpipeError};
pub use zpipe_core::options::SocketOptions;

/// ZMTP sockets, re-exported for callers that drive them directly.
pub mod zmq {
    pub use zpipe_zmtp::{PullSocket, PushSocket, RecvSocket, SendSocket, SocketType};
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::config::{PoolConfig, SenderConfig, WorkerConfig};
    pub use crate::pool::WorkerPool;
    pub use crate::sender::{SendReport, Sender};
    pub use crate::worker::Worker;
    pub use crate::zmq::{PullSocket, PushSocket, RecvSocket, SendSocket};
    pub use crate::{Endpoint, Result, SocketOptions, ZpipeError};
}
