//! Decision engine: what to do with one incoming transfer. Pure; no I/O.

use crate::block::TransferOperation;
use crate::config::{BotConfig, WeightBounds};
use rust_decimal::Decimal;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Vote on the memo's post with a weight drawn from the bounds.
    Reward(WeightBounds),
    Refund(RefundReason),
    Ignore(IgnoreReason),
}

/// Why a transfer is sent back. [fmt::Display] yields the memo attached to the refund.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefundReason {
    BelowMinimum { currency: String, minimum: Decimal },
    InvalidReference,
    TargetNotEligible { memo: String },
    AlreadyRewarded,
}

impl RefundReason {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            RefundReason::BelowMinimum { .. } => "below minimum",
            RefundReason::InvalidReference => "invalid reference",
            RefundReason::TargetNotEligible { .. } => "target not eligible",
            RefundReason::AlreadyRewarded => "already rewarded",
        }
    }
}

impl fmt::Display for RefundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefundReason::BelowMinimum { currency, minimum } => {
                write!(f, "Minimum {currency} for upvote: {minimum}")
            }
            RefundReason::InvalidReference => f.write_str("invalid reference"),
            RefundReason::TargetNotEligible { memo } => write!(f, "target not eligible: {memo}"),
            RefundReason::AlreadyRewarded => f.write_str("already rewarded"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    UnsupportedCurrency { currency: String },
    OtherRecipient,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::UnsupportedCurrency { currency } => {
                write!(f, "unsupported currency: {currency}")
            }
            IgnoreReason::OtherRecipient => f.write_str("not addressed to the watched account"),
        }
    }
}

/// Classify one transfer.
///
/// Currency is matched exactly (case-sensitive). The minimum is inclusive: a transfer of
/// exactly `minimum_for_reward` is rewarded.
pub fn decide(op: &TransferOperation, config: &BotConfig) -> Decision {
    if op.to != config.watched_account {
        return Decision::Ignore(IgnoreReason::OtherRecipient);
    }
    if op.amount.currency != config.accepted_currency {
        return Decision::Ignore(IgnoreReason::UnsupportedCurrency {
            currency: op.amount.currency.clone(),
        });
    }
    if op.amount.value < config.minimum_for_reward {
        return Decision::Refund(RefundReason::BelowMinimum {
            currency: config.accepted_currency.clone(),
            minimum: config.minimum_for_reward,
        });
    }
    Decision::Reward(config.reward_weights)
}
