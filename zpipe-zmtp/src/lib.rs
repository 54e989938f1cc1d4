//! # zpipe ZMTP
//!
//! `ZeroMQ` (ZMTP 3.x) PUSH/PULL sockets on top of `compio`.
//!
//! ## Overview
//!
//! - **PUSH**: binds, accepts PULL peers and round-robins whole messages
//! - **PULL**: connects lazily, reconnects with backoff, hands out frames
//!   one at a time with a MORE flag like `zmq_recv`
//!
//! Only the NULL security mechanism is spoken, which is what a libzmq peer
//! uses unless PLAIN or CURVE is configured.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use zpipe_zmtp::{PullSocket, PushSocket};
//! use zpipe_core::endpoint::Endpoint;
//! use bytes::Bytes;
//!
//! #[compio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let endpoint: Endpoint = "tcp://127.0.0.1:9999".parse()?;
//!     let mut push = PushSocket::bind(endpoint).await?;
//!     let mut pull = PullSocket::connect(push.local_endpoint());
//!
//!     push.send(vec![Bytes::from("hello")]).await?;
//!     let frame = pull.recv_frame().await?;
//!     assert!(!pull.has_more());
//!     Ok(())
//! }
//! ```

// Allow some pedantic lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]

// Internal modules (not part of public API)
mod command;
mod greeting;
mod handshake;
mod signal;

// Public protocol types
pub mod codec;
pub mod socket_type;

// Socket implementations
pub mod pull;
pub mod push;
mod socket_trait;

pub use codec::{ZmtpError, ZmtpFrame};
pub use pull::PullSocket;
pub use push::PushSocket;
pub use socket_trait::{RecvSocket, SendSocket};
pub use socket_type::SocketType;
