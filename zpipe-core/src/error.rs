//! Error types shared across the zpipe crates.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::endpoint::EndpointError;

/// Main error type for zpipe operations
#[derive(Error, Debug)]
pub enum ZpipeError {
    /// IO error during socket operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Endpoint could not be parsed
    #[error("Invalid endpoint: {0}")]
    Endpoint(#[from] EndpointError),

    /// Rejected configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Replay directory could not be read
    #[error("Replay directory {}: {source}", .path.display())]
    Replay {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Replay directory contained no regular files
    #[error("Replay directory {} contains no files", .0.display())]
    EmptyReplay(PathBuf),

    /// Received frame could not be written to the dump directory
    #[error("Dump file {}: {source}", .path.display())]
    Dump {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type alias for zpipe operations
pub type Result<T> = std::result::Result<T, ZpipeError>;

impl ZpipeError {
    /// Create a configuration error with a message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
