//! Received frames written to disk, one file per frame.
//!
//! Files are named `<worker>_<seq>.<frame>` with the sequence and frame
//! numbers zero-padded, so a sorted listing is arrival order within each
//! worker. A dump directory can be handed straight to `--replay-dir`.

use bytes::Bytes;
use std::fs;
use std::path::{Path, PathBuf};
use zpipe_core::error::{Result, ZpipeError};

/// Frame writer for one worker.
#[derive(Debug, Clone)]
pub struct FrameDump {
    dir: PathBuf,
    worker: usize,
}

impl FrameDump {
    pub fn new(dir: impl Into<PathBuf>, worker: usize) -> Self {
        Self {
            dir: dir.into(),
            worker,
        }
    }

    /// Create `dir` and its parents if they do not exist.
    pub fn prepare(dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).map_err(|source| ZpipeError::Dump {
            path: dir.to_path_buf(),
            source,
        })
    }

    pub fn path_for(&self, seq: u64, frame: usize) -> PathBuf {
        self.dir
            .join(format!("{}_{:06}.{:03}", self.worker, seq, frame))
    }

    /// Write every frame of message `seq`. Returns the bytes written.
    pub fn write(&self, seq: u64, frames: &[Bytes]) -> Result<usize> {
        let mut written = 0;
        for (i, frame) in frames.iter().enumerate() {
            let path = self.path_for(seq, i);
            fs::write(&path, frame).map_err(|source| ZpipeError::Dump { path, source })?;
            written += frame.len();
        }
        Ok(written)
    }
}
