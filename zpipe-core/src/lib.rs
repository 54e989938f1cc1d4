//! zpipe core
//!
//! Runtime-level building blocks shared by the ZMTP layer and the benchmark:
//! - Endpoint parsing (`endpoint`)
//! - Socket options (`options`)
//! - Reconnect backoff (`reconnect`)
//! - Zero-copy segmented receive buffer (`buffer`)
//! - Cancellation guard for multi-step writes (`poison`)
//! - TCP tuning (`tcp`)
//! - Error types (`error`)

// The tcp module needs raw fd/socket access for socket configuration
#![cfg_attr(not(test), deny(unsafe_code))]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]

pub mod buffer;
pub mod endpoint;
pub mod error;
pub mod options;
pub mod poison;
pub mod reconnect;
pub mod tcp;
