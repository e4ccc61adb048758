//! Block processor: fetch one block (bounded retry), route its transfers in order.

use crate::block::{payload_recipient, BlockData, TransferOperation};
use crate::capability::ChainReader;
use crate::config::BotConfig;
use crate::decision::decide;
use crate::error::StoreError;
use crate::executor::{ActionExecutor, ActionOutcome};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockOutcome {
    /// One outcome per transfer addressed to the watched account, in block order.
    Processed { outcomes: Vec<ActionOutcome> },
    /// Every fetch attempt failed. The block's transfers are lost; the cursor still advances.
    Skipped { attempts: u32 },
}

pub struct BlockProcessor {
    config: Arc<BotConfig>,
    chain: Arc<dyn ChainReader>,
    executor: ActionExecutor,
}

impl BlockProcessor {
    pub fn new(config: Arc<BotConfig>, chain: Arc<dyn ChainReader>, executor: ActionExecutor) -> Self {
        Self {
            config,
            chain,
            executor,
        }
    }

    /// Process block `block_number`. Errors only on refund ledger failure.
    pub async fn process_block(&self, block_number: u64) -> Result<BlockOutcome, StoreError> {
        let attempts = self.config.block_retry_budget.saturating_add(1);
        let Some(block) = self.fetch(block_number, attempts).await else {
            tracing::error!(block = block_number, attempts, "could not read block, skipping");
            return Ok(BlockOutcome::Skipped { attempts });
        };
        tracing::info!(block = block_number, "processing block");

        let mut outcomes = Vec::new();
        for payload in block.transfer_payloads() {
            if payload_recipient(payload) != Some(self.config.watched_account.as_str()) {
                continue;
            }
            let op = match TransferOperation::decode(payload, block_number, &block.timestamp) {
                Ok(op) => op,
                Err(e) => {
                    tracing::warn!(block = block_number, reason = %e, %payload, "undecodable transfer, skipping");
                    continue;
                }
            };
            tracing::info!(
                block = block_number,
                timestamp = %op.block_timestamp,
                from = %op.from,
                to = %op.to,
                amount = %op.amount,
                memo = %op.memo,
                "incoming transfer"
            );
            let decision = decide(&op, &self.config);
            outcomes.push(self.executor.execute(&op, decision).await?);
        }
        Ok(BlockOutcome::Processed { outcomes })
    }

    /// Up to `attempts` immediate fetches of the same block.
    async fn fetch(&self, block_number: u64, attempts: u32) -> Option<BlockData> {
        for attempt in 1..=attempts {
            match self.chain.get_block(block_number).await {
                Ok(Some(block)) => return Some(block),
                Ok(None) => {
                    tracing::warn!(block = block_number, attempt, "block not available, retrying");
                }
                Err(e) => {
                    tracing::warn!(block = block_number, attempt, reason = %e, "couldn't read block, retrying");
                }
            }
        }
        None
    }
}
