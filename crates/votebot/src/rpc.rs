//! JSON-RPC chain reader backed by a node's `condenser_api`.

use crate::block::BlockData;
use crate::capability::ChainReader;
use crate::error::RpcError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Reqwest client without system proxy lookup, with a per-request timeout.
pub(crate) fn http_client() -> Result<reqwest::Client, RpcError> {
    Ok(reqwest::Client::builder()
        .no_proxy()
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}

pub(crate) async fn http_json_rpc(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: Value,
    id: u64,
) -> Result<Value, RpcError> {
    let body = json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    });
    let resp = client.post(url).json(&body).send().await?;
    let json: Value = resp.json().await?;
    if let Some(err) = json.get("error") {
        return Err(RpcError::Rpc(err.to_string()));
    }
    let result = json
        .get("result")
        .cloned()
        .ok_or_else(|| RpcError::Decode("Missing result".into()))?;
    Ok(result)
}

/// `last_irreversible_block_num` from dynamic global properties; None if absent.
pub fn decode_last_irreversible(props: &Value) -> Option<u64> {
    props.get("last_irreversible_block_num").and_then(|n| n.as_u64())
}

/// Block interval from chain config. Older nodes use the `STEEMIT_` prefix.
pub fn decode_block_interval(config: &Value) -> Result<Duration, RpcError> {
    ["STEEM_BLOCK_INTERVAL", "STEEMIT_BLOCK_INTERVAL"]
        .iter()
        .find_map(|key| config.get(*key).and_then(|v| v.as_u64()))
        .map(Duration::from_secs)
        .ok_or_else(|| RpcError::Decode("block interval missing from config".into()))
}

/// `get_block` result; `null` means the block is not available.
pub fn decode_block(result: Value) -> Result<Option<BlockData>, RpcError> {
    if result.is_null() {
        return Ok(None);
    }
    serde_json::from_value(result)
        .map(Some)
        .map_err(|e| RpcError::Decode(e.to_string()))
}

/// Read-only node client.
pub struct NodeClient {
    http_client: reqwest::Client,
    url: String,
}

impl NodeClient {
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
impl ChainReader for NodeClient {
    async fn last_irreversible_block_num(&self) -> Result<Option<u64>, RpcError> {
        let props = self
            .call("condenser_api.get_dynamic_global_properties", json!([]), 1)
            .await?;
        Ok(decode_last_irreversible(&props))
    }

    async fn block_interval(&self) -> Result<Duration, RpcError> {
        let config = self.call("condenser_api.get_config", json!([]), 2).await?;
        decode_block_interval(&config)
    }

    async fn get_block(&self, block_number: u64) -> Result<Option<BlockData>, RpcError> {
        let result = self
            .call("condenser_api.get_block", json!([block_number]), 3)
            .await?;
        decode_block(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_irreversible_present_and_absent() {
        assert_eq!(
            decode_last_irreversible(&json!({ "head_block_number": 120, "last_irreversible_block_num": 100 })),
            Some(100)
        );
        assert_eq!(decode_last_irreversible(&json!({})), None);
        assert_eq!(decode_last_irreversible(&Value::Null), None);
    }

    #[test]
    fn block_interval_accepts_both_prefixes() {
        assert_eq!(
            decode_block_interval(&json!({ "STEEM_BLOCK_INTERVAL": 3 })).unwrap(),
            Duration::from_secs(3)
        );
        assert_eq!(
            decode_block_interval(&json!({ "STEEMIT_BLOCK_INTERVAL": 3 })).unwrap(),
            Duration::from_secs(3)
        );
        assert!(decode_block_interval(&json!({})).is_err());
    }

    #[test]
    fn null_block_is_absent() {
        assert!(decode_block(Value::Null).unwrap().is_none());
    }

    #[test]
    fn block_decodes() {
        let block = decode_block(json!({
            "timestamp": "2018-01-01T00:00:00",
            "transactions": [{ "operations": [["transfer", { "from": "a", "to": "b", "amount": "1.000 SBD", "memo": "" }]] }]
        }))
        .unwrap()
        .unwrap();
        assert_eq!(block.timestamp, "2018-01-01T00:00:00");
        assert_eq!(block.transfer_payloads().count(), 1);
    }

    #[test]
    fn malformed_block_is_decode_error() {
        assert!(matches!(
            decode_block(json!({ "transactions": "nope" })),
            Err(RpcError::Decode(_))
        ));
    }
}
