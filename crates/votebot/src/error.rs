//! Error types shared across the bot.

use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Durable state failures. Always fatal for the current iteration.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt checkpoint {}: {content:?}", .path.display())]
    CorruptCheckpoint { path: PathBuf, content: String },
}

impl StoreError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| StoreError::Io { op, path, source }
    }
}

/// JSON-RPC transport and decoding failures.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("RPC error: {0}")]
    Rpc(String),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Errors that stop the poll loop.
#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("latest irreversible block unavailable after {attempts} attempts")]
    HeadUnavailable { attempts: u32 },
    #[error("{0} required")]
    MissingPart(&'static str),
}
