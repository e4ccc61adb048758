//! Action executor: carries out a [Decision] against the wallet and the refund ledger.

use crate::block::TransferOperation;
use crate::capability::{RewardCapability, RewardError, TransferSubmitter};
use crate::config::{BotConfig, WeightBounds};
use crate::decision::{Decision, RefundReason};
use crate::error::StoreError;
use crate::refunds::{RefundKey, RefundLedger};
use rand::Rng;
use std::sync::Arc;

/// What happened to one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Rewarded { weight: u8 },
    /// Vote failed for a reason that does not warrant a refund.
    RewardAbandoned,
    Refunded { reason: RefundReason },
    AlreadyRefunded,
    /// Amount above the refund cap; left for the operator.
    OverCap,
    /// Transfer call failed; nothing recorded, so a later pass may retry.
    RefundFailed,
    Ignored,
}

pub struct ActionExecutor {
    config: Arc<BotConfig>,
    transfers: Arc<dyn TransferSubmitter>,
    rewards: Arc<dyn RewardCapability>,
    ledger: RefundLedger,
}

impl ActionExecutor {
    pub fn new(
        config: Arc<BotConfig>,
        transfers: Arc<dyn TransferSubmitter>,
        rewards: Arc<dyn RewardCapability>,
        ledger: RefundLedger,
    ) -> Self {
        Self {
            config,
            transfers,
            rewards,
            ledger,
        }
    }

    /// Only ledger failures are errors; every capability failure is resolved into an outcome.
    pub async fn execute(
        &self,
        op: &TransferOperation,
        decision: Decision,
    ) -> Result<ActionOutcome, StoreError> {
        match decision {
            Decision::Reward(bounds) => self.reward(op, bounds).await,
            Decision::Refund(reason) => self.refund(op, reason).await,
            Decision::Ignore(reason) => {
                tracing::info!(from = %op.from, amount = %op.amount, %reason, "ignoring transfer");
                Ok(ActionOutcome::Ignored)
            }
        }
    }

    async fn reward(
        &self,
        op: &TransferOperation,
        bounds: WeightBounds,
    ) -> Result<ActionOutcome, StoreError> {
        let weight = rand::thread_rng().gen_range(bounds.min..=bounds.max);
        let reason = match self
            .rewards
            .apply_reward(&op.memo, weight, &self.config.watched_account)
            .await
        {
            Ok(()) => {
                tracing::info!(memo = %op.memo, weight, "upvoted");
                return Ok(ActionOutcome::Rewarded { weight });
            }
            Err(RewardError::InvalidReference(e)) => {
                tracing::info!(memo = %op.memo, reason = %e, "invalid post reference");
                RefundReason::InvalidReference
            }
            Err(RewardError::TargetNotEligible(e)) => {
                tracing::info!(memo = %op.memo, reason = %e, "post not eligible for votes");
                RefundReason::TargetNotEligible {
                    memo: op.memo.clone(),
                }
            }
            Err(RewardError::AlreadyActioned(e)) => {
                tracing::info!(memo = %op.memo, reason = %e, "already voted");
                RefundReason::AlreadyRewarded
            }
            Err(RewardError::Other(e)) => {
                tracing::warn!(memo = %op.memo, reason = %e, "vote failed, abandoning");
                return Ok(ActionOutcome::RewardAbandoned);
            }
        };
        self.refund(op, reason).await
    }

    async fn refund(
        &self,
        op: &TransferOperation,
        reason: RefundReason,
    ) -> Result<ActionOutcome, StoreError> {
        let key = RefundKey::new(&op.from, &op.memo, &op.amount);
        if self.ledger.already_refunded(&key)? {
            tracing::info!(%key, from = %op.from, memo = %op.memo, "already refunded, skipping");
            return Ok(ActionOutcome::AlreadyRefunded);
        }
        if op.amount.value > self.config.refund_cap {
            tracing::error!(
                from = %op.from,
                amount = %op.amount,
                cap = %self.config.refund_cap,
                "too much for an auto-refund, skipping"
            );
            return Ok(ActionOutcome::OverCap);
        }
        let memo = reason.to_string();
        if let Err(e) = self
            .transfers
            .transfer(&self.config.watched_account, &op.from, &op.amount, &memo)
            .await
        {
            tracing::error!(from = %op.from, amount = %op.amount, reason = %e, "refund transfer failed");
            return Ok(ActionOutcome::RefundFailed);
        }
        self.ledger.record(&key)?;
        tracing::info!(to = %op.from, amount = %op.amount, label = reason.label(), "refunded");
        Ok(ActionOutcome::Refunded { reason })
    }
}
