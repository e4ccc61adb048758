//! Block and transfer types as returned by the node's `condenser_api`.
//!
//! Blocks decode straight from JSON; transfer payloads stay raw until the processor has checked
//! the recipient, so malformed transfers to other accounts never surface as errors.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Operation type name for value transfers.
pub const TRANSFER_OP: &str = "transfer";

/// One block as returned by `get_block`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockData {
    #[serde(default)]
    pub timestamp: String,
    /// Absent on some node versions for empty blocks.
    #[serde(default)]
    pub transactions: Option<Vec<Transaction>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub operations: Vec<Operation>,
}

/// `[type, payload]` pair.
#[derive(Debug, Clone, Deserialize)]
pub struct Operation(pub String, pub Value);

impl BlockData {
    /// Payloads of transfer operations, in block order.
    pub fn transfer_payloads(&self) -> impl Iterator<Item = &Value> + '_ {
        self.transactions
            .iter()
            .flatten()
            .flat_map(|tx| tx.operations.iter())
            .filter(|op| op.0 == TRANSFER_OP)
            .map(|op| &op.1)
    }
}

/// Quantity plus currency code, e.g. `0.100 SBD`.
///
/// Display keeps the scale the ledger sent, so `0.100 SBD` prints back unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amount {
    pub value: Decimal,
    pub currency: String,
}

impl Amount {
    pub fn new(value: Decimal, currency: impl Into<String>) -> Self {
        Self {
            value,
            currency: currency.into(),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.currency)
    }
}

impl FromStr for Amount {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (value, currency) = s
            .trim()
            .split_once(' ')
            .ok_or_else(|| DecodeError::InvalidAmount(s.to_string()))?;
        let value = Decimal::from_str(value).map_err(|_| DecodeError::InvalidAmount(s.to_string()))?;
        let currency = currency.trim();
        if currency.is_empty() || value.is_sign_negative() {
            return Err(DecodeError::InvalidAmount(s.to_string()));
        }
        Ok(Amount::new(value, currency))
    }
}

/// A decoded transfer with its block metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOperation {
    pub from: String,
    pub to: String,
    pub amount: Amount,
    pub memo: String,
    pub block_number: u64,
    pub block_timestamp: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("invalid amount: {0:?}")]
    InvalidAmount(String),
}

impl TransferOperation {
    /// Decode a transfer payload (`{from, to, amount, memo}`).
    pub fn decode(payload: &Value, block_number: u64, block_timestamp: &str) -> Result<Self, DecodeError> {
        let field = |name: &'static str| {
            payload
                .get(name)
                .and_then(|v| v.as_str())
                .ok_or(DecodeError::MissingField(name))
        };
        Ok(Self {
            from: field("from")?.to_string(),
            to: field("to")?.to_string(),
            amount: field("amount")?.parse::<Amount>()?,
            // Empty memos are sometimes omitted entirely.
            memo: payload.get("memo").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
            block_number,
            block_timestamp: block_timestamp.to_string(),
        })
    }
}

/// Recipient of a raw transfer payload, if present.
pub fn payload_recipient(payload: &Value) -> Option<&str> {
    payload.get("to").and_then(|v| v.as_str())
}
