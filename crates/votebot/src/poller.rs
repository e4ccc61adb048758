//! Poll loop: follow the latest irreversible block, one block at a time.
//!
//! Catching up processes `cursor + 1 ..= tip`, persisting the checkpoint after each block.
//! Once caught up the loop sleeps one block interval and asks for the tip again. The stop
//! signal is honoured between blocks and during sleeps, never inside a block.

use crate::capability::ChainReader;
use crate::checkpoint::{CheckpointStore, Cursor};
use crate::config::BotConfig;
use crate::error::BotError;
use crate::processor::{BlockOutcome, BlockProcessor};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};

/// Used when the node does not report a block interval.
pub const DEFAULT_BLOCK_INTERVAL: Duration = Duration::from_secs(3);

pub struct PollLoop {
    config: Arc<BotConfig>,
    chain: Arc<dyn ChainReader>,
    processor: BlockProcessor,
    checkpoints: CheckpointStore,
    stop: watch::Receiver<bool>,
}

impl PollLoop {
    /// `stop` ends the loop when it turns true or its sender is dropped.
    pub fn new(
        config: Arc<BotConfig>,
        chain: Arc<dyn ChainReader>,
        processor: BlockProcessor,
        checkpoints: CheckpointStore,
        stop: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            chain,
            processor,
            checkpoints,
            stop,
        }
    }

    /// Run until stopped. Returns an error only for fatal conditions (persistence failure,
    /// or the tip query exhausting its configured attempts).
    pub async fn run(mut self) -> Result<(), BotError> {
        let Some(mut tip) = self.last_irreversible().await? else {
            return Ok(());
        };
        let mut cursor = Cursor::new(self.checkpoints.load(tip)?);
        tracing::info!(block = cursor.last_processed_block, "last processed block");

        loop {
            if !self.advance_to(&mut cursor, tip).await? {
                return Ok(());
            }
            tip = match self.last_irreversible().await? {
                Some(n) => n,
                None => return Ok(()),
            };
            if cursor.is_behind(tip) {
                continue;
            }
            let interval = match self.chain.block_interval().await {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!(reason = %e, "block interval unavailable, using default");
                    DEFAULT_BLOCK_INTERVAL
                }
            };
            tracing::debug!(secs = interval.as_secs_f64(), "sleeping for one block");
            if !self.sleep_unless_stopped(interval).await {
                return Ok(());
            }
            tip = match self.last_irreversible().await? {
                Some(n) => n,
                None => return Ok(()),
            };
        }
    }

    /// Process every block after the cursor up to and including `tip`, committing each.
    /// Returns false if a stop was requested.
    pub async fn advance_to(&mut self, cursor: &mut Cursor, tip: u64) -> Result<bool, BotError> {
        while cursor.is_behind(tip) {
            if self.stop_requested() {
                tracing::info!(block = cursor.last_processed_block, "stop requested");
                return Ok(false);
            }
            let block = cursor.next_block();
            if let BlockOutcome::Processed { outcomes } = self.processor.process_block(block).await? {
                if !outcomes.is_empty() {
                    tracing::debug!(block, transfers = outcomes.len(), "block done");
                }
            }
            self.checkpoints.save(block)?;
            cursor.last_processed_block = block;
        }
        Ok(true)
    }

    /// Latest irreversible block, retried until it arrives, attempts run out, or a stop is
    /// requested (`Ok(None)`).
    async fn last_irreversible(&mut self) -> Result<Option<u64>, BotError> {
        let delay = Duration::from_millis(self.config.head_retry_delay_ms);
        let mut attempts = 0u32;
        loop {
            if self.stop_requested() {
                return Ok(None);
            }
            attempts += 1;
            match self.chain.last_irreversible_block_num().await {
                Ok(Some(n)) => return Ok(Some(n)),
                Ok(None) => tracing::info!(attempt = attempts, "couldn't get block num, retrying"),
                Err(e) => {
                    tracing::info!(attempt = attempts, reason = %e, "couldn't get block num, retrying")
                }
            }
            if self.config.head_query_attempts.is_some_and(|max| attempts >= max) {
                return Err(BotError::HeadUnavailable { attempts });
            }
            if !delay.is_zero() && !self.sleep_unless_stopped(delay).await {
                return Ok(None);
            }
        }
    }

    fn stop_requested(&self) -> bool {
        let stopped = *self.stop.borrow();
        stopped || self.stop.has_changed().is_err()
    }

    /// False if woken by a stop request.
    async fn sleep_unless_stopped(&mut self, duration: Duration) -> bool {
        tokio::select! {
            _ = sleep(duration) => {}
            _ = self.stop.changed() => {}
        }
        !self.stop_requested()
    }
}
