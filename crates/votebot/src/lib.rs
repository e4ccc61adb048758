//! Off-chain vote bot runtime: follows irreversible blocks, classifies incoming transfers,
//! votes or refunds.
//!
//! - **PollLoop**: resumes from the persisted [CheckpointStore], walks every newly irreversible
//!   block in order, and commits the checkpoint only after a block is fully handled.
//! - **BlockProcessor**: fetches one block with a bounded retry budget, then routes each
//!   transfer to the watched account through [decide] and the [ActionExecutor].
//! - **RefundLedger**: append-only record that makes refunds happen at most once per
//!   `(from, memo, amount)`, across restarts.

pub mod block;
pub mod bot;
pub mod capability;
pub mod checkpoint;
pub mod config;
pub mod decision;
pub mod error;
pub mod executor;
pub mod poller;
pub mod processor;
pub mod refunds;
pub mod rpc;
pub mod wallet;

pub use block::{Amount, BlockData, TransferOperation};
pub use bot::BotBuilder;
pub use capability::{ChainReader, RewardCapability, RewardError, TransferError, TransferSubmitter};
pub use checkpoint::{CheckpointStore, Cursor};
pub use config::{BotConfig, ConfigError, RpcConfig, WeightBounds};
pub use decision::{decide, Decision, IgnoreReason, RefundReason};
pub use error::{BotError, RpcError, StoreError};
pub use executor::{ActionExecutor, ActionOutcome};
pub use poller::PollLoop;
pub use processor::{BlockOutcome, BlockProcessor};
pub use refunds::{RefundKey, RefundLedger};
pub use rpc::NodeClient;
pub use wallet::{ContentRef, WalletClient};
