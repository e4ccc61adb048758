//! External capabilities the bot drives: chain reads, value transfers, and votes.
//!
//! [NodeClient](crate::rpc::NodeClient) and [WalletClient](crate::wallet::WalletClient) are
//! the JSON-RPC implementations; tests substitute in-memory fakes.

use crate::block::{Amount, BlockData};
use crate::error::RpcError;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Read access to the chain.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Latest irreversible block number. `Ok(None)` when the node answered without one.
    async fn last_irreversible_block_num(&self) -> Result<Option<u64>, RpcError>;

    /// Time between blocks.
    async fn block_interval(&self) -> Result<Duration, RpcError>;

    /// Block by number. `Ok(None)` when the node does not have it (yet).
    async fn get_block(&self, block_number: u64) -> Result<Option<BlockData>, RpcError>;
}

/// Sends value from an account the caller controls.
#[async_trait]
pub trait TransferSubmitter: Send + Sync {
    async fn transfer(&self, from: &str, to: &str, amount: &Amount, memo: &str) -> Result<(), TransferError>;
}

/// Applies the rewarding action (a weighted vote) to a referenced post.
#[async_trait]
pub trait RewardCapability: Send + Sync {
    /// `weight` is in percent.
    async fn apply_reward(&self, content_ref: &str, weight: u8, actor: &str) -> Result<(), RewardError>;
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("transfer rejected: {0}")]
    Rejected(String),
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// Reward failure kinds. Every kind except [RewardError::Other] turns into a refund.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewardError {
    /// The reference does not resolve to a post.
    #[error("invalid reference: {0}")]
    InvalidReference(String),
    /// The post exists but can no longer be voted on (e.g. payout window closed).
    #[error("target not eligible: {0}")]
    TargetNotEligible(String),
    /// The actor already voted on this post.
    #[error("already actioned: {0}")]
    AlreadyActioned(String),
    #[error("reward failed: {0}")]
    Other(String),
}
