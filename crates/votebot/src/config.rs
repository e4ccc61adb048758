//! Bot configuration.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Bot configuration. Passed explicitly to each component at construction.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Account whose incoming transfers are watched; also the voter and refund sender.
    pub watched_account: String,
    /// Native currency code accepted for votes (exact, case-sensitive match).
    pub accepted_currency: String,
    /// Smallest transfer that buys a vote. Anything strictly below is refunded.
    pub minimum_for_reward: Decimal,
    /// Vote weight range in percent, drawn uniformly per vote.
    pub reward_weights: WeightBounds,
    /// Largest amount the bot refunds on its own.
    pub refund_cap: Decimal,
    /// Extra fetch attempts per block before it is skipped.
    #[serde(default = "default_block_retry_budget")]
    pub block_retry_budget: u32,
    /// Attempts for the latest-irreversible query per poll. None retries until stopped.
    #[serde(default)]
    pub head_query_attempts: Option<u32>,
    /// Pause between latest-irreversible query attempts, in milliseconds.
    #[serde(default = "default_head_retry_delay_ms")]
    pub head_retry_delay_ms: u64,
    /// Directory holding the checkpoint and refund ledger. None lets the caller pick.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
    /// JSON-RPC endpoints.
    #[serde(default)]
    pub rpc: RpcConfig,
}

/// Inclusive vote weight range in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WeightBounds {
    pub min: u8,
    pub max: u8,
}

/// Node and wallet endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    /// Read node for blocks and chain parameters.
    pub node_url: String,
    /// Signing wallet daemon for transfers and votes.
    pub wallet_url: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            node_url: "https://api.steemit.com".to_string(),
            wallet_url: "http://127.0.0.1:8093".to_string(),
        }
    }
}

fn default_block_retry_budget() -> u32 {
    3
}

fn default_head_retry_delay_ms() -> u64 {
    1000
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl BotConfig {
    /// Read a JSON config file and validate it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: BotConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.watched_account.is_empty() {
            return Err(ConfigError::Invalid("watched_account is empty".into()));
        }
        if self.accepted_currency.is_empty() {
            return Err(ConfigError::Invalid("accepted_currency is empty".into()));
        }
        let WeightBounds { min, max } = self.reward_weights;
        if min == 0 || max > 100 || min > max {
            return Err(ConfigError::Invalid(format!(
                "reward_weights must satisfy 1 <= min <= max <= 100, got [{min}, {max}]"
            )));
        }
        if self.minimum_for_reward.is_sign_negative() {
            return Err(ConfigError::Invalid("minimum_for_reward is negative".into()));
        }
        if self.refund_cap.is_sign_negative() {
            return Err(ConfigError::Invalid("refund_cap is negative".into()));
        }
        if self.head_query_attempts == Some(0) {
            return Err(ConfigError::Invalid("head_query_attempts must be at least 1".into()));
        }
        Ok(())
    }
}
