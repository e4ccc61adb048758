//! Durable cursor: the last block whose transfers were all handled.
//!
//! The checkpoint is a single decimal integer in `<state_dir>/checkpoint`, replaced via
//! write-to-temp, fsync, rename so a reader never sees a partial value.

use crate::error::StoreError;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const CHECKPOINT_FILE: &str = "checkpoint";

/// Cursor: last processed block. Advanced in memory, then persisted through [CheckpointStore].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub last_processed_block: u64,
}

impl Cursor {
    pub fn new(last_processed_block: u64) -> Self {
        Self {
            last_processed_block,
        }
    }

    /// Next block to process.
    pub fn next_block(&self) -> u64 {
        self.last_processed_block + 1
    }

    /// True while `tip` is ahead of the cursor.
    pub fn is_behind(&self, tip: u64) -> bool {
        tip > self.last_processed_block
    }
}

/// File-backed checkpoint.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            path: state_dir.as_ref().join(CHECKPOINT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored checkpoint, or `fallback` (persisted first) when nothing is stored yet.
    pub fn load(&self, fallback: u64) -> Result<u64, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => content
                .trim()
                .parse()
                .map_err(|_| StoreError::CorruptCheckpoint {
                    path: self.path.clone(),
                    content,
                }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(block = fallback, path = %self.path.display(), "no checkpoint, seeding");
                self.save(fallback)?;
                Ok(fallback)
            }
            Err(e) => Err(StoreError::io("read", &self.path)(e)),
        }
    }

    /// Replace the stored checkpoint. The containing directory is synced after the rename so
    /// the new entry survives power loss.
    pub fn save(&self, block: u64) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(StoreError::io("create", dir))?;
        let tmp = self.path.with_extension("tmp");
        {
            let mut f = fs::File::create(&tmp).map_err(StoreError::io("create", &tmp))?;
            writeln!(f, "{block}").map_err(StoreError::io("write", &tmp))?;
            f.sync_all().map_err(StoreError::io("sync", &tmp))?;
        }
        fs::rename(&tmp, &self.path).map_err(StoreError::io("rename", &self.path))?;
        fs::File::open(dir)
            .and_then(|d| d.sync_all())
            .map_err(StoreError::io("sync", dir))?;
        Ok(())
    }
}
