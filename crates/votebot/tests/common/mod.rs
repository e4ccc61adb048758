//! Common helpers for integration tests: in-memory chain and wallet fakes, a one-shot JSON-RPC
//! server, and config/block builders.
//! Some helpers are only used by specific test binaries; allow dead_code to avoid per-binary warnings.
#![allow(dead_code)]

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use votebot::{
    Amount, BlockData, BotConfig, ChainReader, RewardCapability, RewardError, RpcError,
    TransferError, TransferSubmitter,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("votebot=debug"))
        .with_test_writer()
        .try_init();
}

/// Watched account "bot", currency "X", minimum 0.5, cap 0.5, weights 10..=20, fast retries.
pub fn config() -> BotConfig {
    BotConfig::from_json(
        r#"{
            "watched_account": "bot",
            "accepted_currency": "X",
            "minimum_for_reward": "0.5",
            "reward_weights": { "min": 10, "max": 20 },
            "refund_cap": "0.5",
            "block_retry_budget": 3,
            "head_retry_delay_ms": 5
        }"#,
    )
    .expect("test config")
}

/// Transfer payload as found inside a block.
pub fn transfer(from: &str, to: &str, amount: &str, memo: &str) -> Value {
    json!(["transfer", { "from": from, "to": to, "amount": amount, "memo": memo }])
}

/// Block with one transaction per operation, in order.
pub fn block(operations: Vec<Value>) -> BlockData {
    let transactions: Vec<Value> = operations
        .into_iter()
        .map(|op| json!({ "operations": [op] }))
        .collect();
    serde_json::from_value(json!({
        "timestamp": "2018-01-01T00:00:00",
        "transactions": transactions
    }))
    .expect("test block")
}

/// In-memory chain. Blocks not inserted are served as empty blocks.
pub struct FakeChain {
    tip: Mutex<Option<u64>>,
    blocks: Mutex<HashMap<u64, BlockData>>,
    /// Remaining failed fetches per block; `u32::MAX` means always fail.
    failures: Mutex<HashMap<u64, u32>>,
    fetches: Mutex<Vec<u64>>,
    tip_queries: Mutex<u32>,
}

impl FakeChain {
    pub fn new(tip: u64) -> Self {
        Self {
            tip: Mutex::new(Some(tip)),
            blocks: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            fetches: Mutex::new(Vec::new()),
            tip_queries: Mutex::new(0),
        }
    }

    pub fn set_tip(&self, tip: Option<u64>) {
        *self.tip.lock().unwrap() = tip;
    }

    pub fn insert_block(&self, number: u64, block: BlockData) {
        self.blocks.lock().unwrap().insert(number, block);
    }

    pub fn fail_block(&self, number: u64, times: u32) {
        self.failures.lock().unwrap().insert(number, times);
    }

    pub fn fetches(&self) -> Vec<u64> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn fetch_count(&self, number: u64) -> usize {
        self.fetches().iter().filter(|n| **n == number).count()
    }

    pub fn tip_queries(&self) -> u32 {
        *self.tip_queries.lock().unwrap()
    }
}

#[async_trait]
impl ChainReader for FakeChain {
    async fn last_irreversible_block_num(&self) -> Result<Option<u64>, RpcError> {
        *self.tip_queries.lock().unwrap() += 1;
        Ok(*self.tip.lock().unwrap())
    }

    async fn block_interval(&self) -> Result<Duration, RpcError> {
        Ok(Duration::from_millis(10))
    }

    async fn get_block(&self, block_number: u64) -> Result<Option<BlockData>, RpcError> {
        self.fetches.lock().unwrap().push(block_number);
        let mut failures = self.failures.lock().unwrap();
        if let Some(left) = failures.get_mut(&block_number) {
            if *left > 0 {
                if *left != u32::MAX {
                    *left -= 1;
                }
                return if block_number % 2 == 0 {
                    Ok(None)
                } else {
                    Err(RpcError::Rpc("node unavailable".into()))
                };
            }
        }
        Ok(Some(
            self.blocks
                .lock()
                .unwrap()
                .get(&block_number)
                .cloned()
                .unwrap_or_default(),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTransfer {
    pub from: String,
    pub to: String,
    pub amount: String,
    pub memo: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastVote {
    pub content_ref: String,
    pub weight: u8,
    pub actor: String,
}

/// In-memory wallet recording every call. Vote results are scripted per call; the default is success.
#[derive(Default)]
pub struct FakeWallet {
    transfers: Mutex<Vec<SentTransfer>>,
    votes: Mutex<Vec<CastVote>>,
    vote_results: Mutex<VecDeque<Result<(), RewardError>>>,
    failing_transfers: Mutex<u32>,
    /// Replaced by a directory right after the next accepted transfer.
    clobber_after_transfer: Mutex<Option<PathBuf>>,
}

impl FakeWallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_vote(&self, result: Result<(), RewardError>) {
        self.vote_results.lock().unwrap().push_back(result);
    }

    pub fn fail_next_transfers(&self, n: u32) {
        *self.failing_transfers.lock().unwrap() = n;
    }

    /// After the next successful transfer, swap `path` for a directory so writes to it fail.
    pub fn clobber_after_transfer(&self, path: impl Into<PathBuf>) {
        *self.clobber_after_transfer.lock().unwrap() = Some(path.into());
    }

    pub fn transfers(&self) -> Vec<SentTransfer> {
        self.transfers.lock().unwrap().clone()
    }

    pub fn votes(&self) -> Vec<CastVote> {
        self.votes.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransferSubmitter for FakeWallet {
    async fn transfer(&self, from: &str, to: &str, amount: &Amount, memo: &str) -> Result<(), TransferError> {
        let mut failing = self.failing_transfers.lock().unwrap();
        if *failing > 0 {
            *failing -= 1;
            return Err(TransferError::Rejected("insufficient funds".into()));
        }
        self.transfers.lock().unwrap().push(SentTransfer {
            from: from.into(),
            to: to.into(),
            amount: amount.to_string(),
            memo: memo.into(),
        });
        if let Some(path) = self.clobber_after_transfer.lock().unwrap().take() {
            std::fs::remove_file(&path).expect("remove file");
            std::fs::create_dir(&path).expect("create dir");
        }
        Ok(())
    }
}

#[async_trait]
impl RewardCapability for FakeWallet {
    async fn apply_reward(&self, content_ref: &str, weight: u8, actor: &str) -> Result<(), RewardError> {
        self.votes.lock().unwrap().push(CastVote {
            content_ref: content_ref.into(),
            weight,
            actor: actor.into(),
        });
        self.vote_results.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

/// Poll the checkpoint file until it holds `target` or `limit` elapses.
pub async fn wait_for_checkpoint(path: &Path, target: u64, limit: Duration) -> Result<()> {
    let deadline = Instant::now() + limit;
    loop {
        let current = std::fs::read_to_string(path)
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok());
        if current == Some(target) {
            return Ok(());
        }
        if Instant::now() >= deadline {
            anyhow::bail!("checkpoint is {:?}, expected {}", current, target);
        }
        sleep(Duration::from_millis(5)).await;
    }
}

/// Serve one canned JSON-RPC body per connection on a dynamic port. Returns the URL and a
/// handle yielding the request bodies received.
pub fn serve_json_rpc(responses: Vec<Value>) -> Result<(String, std::thread::JoinHandle<Vec<Value>>)> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").context("bind")?;
    let url = format!("http://{}", listener.local_addr()?);
    let handle = std::thread::spawn(move || {
        let mut requests = Vec::new();
        for response in responses {
            let (mut stream, _) = match listener.accept() {
                Ok(conn) => conn,
                Err(_) => break,
            };
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap_or(0) == 0 {
                    break;
                }
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap_or(0);
                    }
                }
            }
            let mut body = vec![0u8; content_length];
            let _ = reader.read_exact(&mut body);
            requests.push(serde_json::from_slice(&body).unwrap_or(Value::Null));
            let payload = response.to_string();
            let _ = write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                payload.len(),
                payload
            );
            let _ = stream.flush();
        }
        requests
    });
    Ok((url, handle))
}
