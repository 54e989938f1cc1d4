//! Recorded frames replayed from a directory, one file per message.

use bytes::Bytes;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use zpipe_core::error::{Result, ZpipeError};

/// List the regular files in `dir`, sorted by file name.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let replay_err = |source: std::io::Error| ZpipeError::Replay {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(replay_err)? {
        let entry = entry.map_err(replay_err)?;
        if entry.file_type().map_err(replay_err)?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(ZpipeError::EmptyReplay(dir.to_path_buf()));
    }
    debug!("Replaying {} files from {}", files.len(), dir.display());
    Ok(files)
}

/// Read one recorded message.
pub fn load(path: &Path) -> Result<Bytes> {
    fs::read(path)
        .map(Bytes::from)
        .map_err(|source| ZpipeError::Replay {
            path: path.to_path_buf(),
            source,
        })
}
