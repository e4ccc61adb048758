//! Builder wiring config, capabilities, and durable state into a [PollLoop].

use crate::capability::{ChainReader, RewardCapability, TransferSubmitter};
use crate::checkpoint::CheckpointStore;
use crate::config::BotConfig;
use crate::error::BotError;
use crate::executor::ActionExecutor;
use crate::poller::PollLoop;
use crate::processor::BlockProcessor;
use crate::refunds::RefundLedger;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

pub struct BotBuilder {
    config: BotConfig,
    state_dir: Option<PathBuf>,
    chain: Option<Arc<dyn ChainReader>>,
    transfers: Option<Arc<dyn TransferSubmitter>>,
    rewards: Option<Arc<dyn RewardCapability>>,
    stop: Option<watch::Receiver<bool>>,
}

impl BotBuilder {
    pub fn new(config: BotConfig) -> Self {
        Self {
            state_dir: config.state_dir.clone(),
            config,
            chain: None,
            transfers: None,
            rewards: None,
            stop: None,
        }
    }

    /// Overrides `config.state_dir`.
    pub fn state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = Some(dir.into());
        self
    }

    pub fn chain(mut self, chain: Arc<dyn ChainReader>) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn transfers(mut self, transfers: Arc<dyn TransferSubmitter>) -> Self {
        self.transfers = Some(transfers);
        self
    }

    pub fn rewards(mut self, rewards: Arc<dyn RewardCapability>) -> Self {
        self.rewards = Some(rewards);
        self
    }

    /// Stop signal: the loop ends once it reads true or its sender is dropped.
    pub fn stop(mut self, stop: watch::Receiver<bool>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Validates the config, opens the refund ledger (creating the state directory) and
    /// assembles the loop.
    pub fn build(self) -> Result<PollLoop, BotError> {
        self.config.validate()?;
        let state_dir = self.state_dir.ok_or(BotError::MissingPart("state_dir"))?;
        let chain = self.chain.ok_or(BotError::MissingPart("chain"))?;
        let transfers = self.transfers.ok_or(BotError::MissingPart("transfers"))?;
        let rewards = self.rewards.ok_or(BotError::MissingPart("rewards"))?;
        let stop = self.stop.ok_or(BotError::MissingPart("stop"))?;

        let config = Arc::new(self.config);
        let ledger = RefundLedger::open(&state_dir)?;
        let executor = ActionExecutor::new(Arc::clone(&config), transfers, rewards, ledger);
        let processor = BlockProcessor::new(Arc::clone(&config), Arc::clone(&chain), executor);
        let checkpoints = CheckpointStore::new(&state_dir);
        Ok(PollLoop::new(config, chain, processor, checkpoints, stop))
    }
}
