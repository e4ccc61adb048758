//! Signing wallet client: transfers and votes through a wallet daemon's JSON-RPC.
//!
//! The daemon holds the keys and broadcasts. Its errors arrive as free-form messages; they are
//! sorted into [RewardError] kinds here and nowhere else.

use crate::block::Amount;
use crate::capability::{RewardCapability, RewardError, TransferError, TransferSubmitter};
use crate::error::RpcError;
use crate::rpc::{http_client, http_json_rpc};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// A post reference: `@author/permlink`, optionally behind a URL prefix such as
/// `https://steemit.com/tag/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRef {
    pub author: String,
    pub permlink: String,
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}/{}", self.author, self.permlink)
    }
}

impl FromStr for ContentRef {
    type Err = RewardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RewardError::InvalidReference(s.to_string());
        let (_, tail) = s.trim().rsplit_once('@').ok_or_else(invalid)?;
        let tail = tail.split(['?', '#']).next().unwrap_or_default();
        let (author, permlink) = tail.split_once('/').ok_or_else(invalid)?;
        let permlink = permlink.trim_end_matches('/');
        if !valid_account(author) || !valid_permlink(permlink) {
            return Err(invalid());
        }
        Ok(Self {
            author: author.to_string(),
            permlink: permlink.to_string(),
        })
    }
}

fn valid_account(name: &str) -> bool {
    (3..=16).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
}

fn valid_permlink(permlink: &str) -> bool {
    !permlink.is_empty()
        && permlink.len() <= 256
        && permlink
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Sort a vote failure message into a [RewardError] kind.
pub fn classify_vote_error(message: &str) -> RewardError {
    let lower = message.to_ascii_lowercase();
    let kind: fn(String) -> RewardError = if ["already voted", "same vote", "identical to your current vote"]
        .iter()
        .any(|m| lower.contains(m))
    {
        RewardError::AlreadyActioned
    } else if ["cashout", "archived", "payout", "voting window"]
        .iter()
        .any(|m| lower.contains(m))
    {
        RewardError::TargetNotEligible
    } else if ["could not find comment", "does not exist", "unknown comment"]
        .iter()
        .any(|m| lower.contains(m))
    {
        RewardError::InvalidReference
    } else {
        RewardError::Other
    };
    kind(message.to_string())
}

/// Percent to the chain's basis points.
pub fn weight_to_basis_points(weight: u8) -> i16 {
    i16::from(weight.min(100)) * 100
}

pub struct WalletClient {
    http_client: reqwest::Client,
    url: String,
}

impl WalletClient {
    pub fn new(url: impl Into<String>) -> Result<Self, RpcError> {
        Ok(Self {
            http_client: http_client()?,
            url: url.into(),
        })
    }

    async fn call(&self, method: &str, params: Value, id: u64) -> Result<Value, RpcError> {
        http_json_rpc(&self.http_client, &self.url, method, params, id).await
    }
}

#[async_trait]
impl TransferSubmitter for WalletClient {
    async fn transfer(&self, from: &str, to: &str, amount: &Amount, memo: &str) -> Result<(), TransferError> {
        let params = json!([from, to, amount.to_string(), memo, true]);
        match self.call("transfer", params, 10).await {
            Ok(_) => Ok(()),
            Err(RpcError::Rpc(msg)) => Err(TransferError::Rejected(msg)),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl RewardCapability for WalletClient {
    async fn apply_reward(&self, content_ref: &str, weight: u8, actor: &str) -> Result<(), RewardError> {
        let post: ContentRef = content_ref.parse()?;
        let params = json!([
            actor,
            post.author,
            post.permlink,
            weight_to_basis_points(weight),
            true
        ]);
        match self.call("vote", params, 11).await {
            Ok(_) => Ok(()),
            Err(RpcError::Rpc(msg)) => Err(classify_vote_error(&msg)),
            Err(e) => Err(RewardError::Other(e.to_string())),
        }
    }
}
