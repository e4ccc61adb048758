//! Append-only record of refunds already sent.
//!
//! This is the only de-duplication in the bot: votes have no ledger, refunds move value and
//! must happen at most once per request. Keys are written one per line and never removed.

use crate::block::Amount;
use crate::error::StoreError;
use sha3::{Digest, Sha3_256};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

pub const REFUNDS_FILE: &str = "refunds";

/// Fingerprint of a refund request: sha3-256 over length-prefixed `(from, memo, amount)`,
/// hex-encoded. Stable across restarts and free of newlines whatever the memo holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RefundKey(String);

impl RefundKey {
    pub fn new(from: &str, memo: &str, amount: &Amount) -> Self {
        let amount = amount.to_string();
        let mut hasher = Sha3_256::new();
        for part in [from, memo, amount.as_str()] {
            hasher.update((part.len() as u64).to_be_bytes());
            hasher.update(part.as_bytes());
        }
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RefundKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// File-backed refund ledger. Every membership check reads the file, so it always reflects
/// prior writes.
#[derive(Debug, Clone)]
pub struct RefundLedger {
    path: PathBuf,
}

impl RefundLedger {
    /// Open the ledger, creating the state directory and an empty file if absent.
    pub fn open(state_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = state_dir.as_ref();
        fs::create_dir_all(dir).map_err(StoreError::io("create", dir))?;
        let path = dir.join(REFUNDS_FILE);
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(StoreError::io("create", &path))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn already_refunded(&self, key: &RefundKey) -> Result<bool, StoreError> {
        let file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(StoreError::io("read", &self.path)(e)),
        };
        for line in BufReader::new(file).lines() {
            let line = line.map_err(StoreError::io("read", &self.path))?;
            if line.trim_end() == key.as_str() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Append `key` durably. Recording the same key twice is harmless.
    ///
    /// A line torn by a crash mid-append is terminated first so the new key stays on its own line.
    pub fn record(&self, key: &RefundKey) -> Result<(), StoreError> {
        let mut f = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(StoreError::io("open", &self.path))?;
        if !ends_with_newline(&mut f).map_err(StoreError::io("read", &self.path))? {
            f.write_all(b"\n").map_err(StoreError::io("append", &self.path))?;
        }
        writeln!(f, "{key}").map_err(StoreError::io("append", &self.path))?;
        f.sync_data().map_err(StoreError::io("sync", &self.path))?;
        Ok(())
    }
}

/// True for an empty file or one whose last byte is `\n`.
fn ends_with_newline(f: &mut fs::File) -> std::io::Result<bool> {
    if f.metadata()?.len() == 0 {
        return Ok(true);
    }
    f.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    f.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
