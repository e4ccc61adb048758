//! Example: run the vote bot against a node and a signing wallet daemon.
//!
//! Usage:
//!
//!   cargo run -p votebot --example votebot -- --config <PATH> [--state-dir <DIR>]
//!
//! The config file is JSON (see `BotConfig`). State defaults to `~/.votebot`. Ctrl-C stops the
//! bot at the next block boundary.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use votebot::{BotBuilder, BotConfig, NodeClient, WalletClient};

fn default_state_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(".votebot")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("votebot=info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path = String::new();
    let mut state_dir: Option<PathBuf> = None;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                config_path = args.get(i).cloned().unwrap_or_default();
            }
            "--state-dir" => {
                i += 1;
                state_dir = args.get(i).map(PathBuf::from);
            }
            "--help" | "-h" => {
                eprintln!("Usage: votebot --config <PATH> [--state-dir <DIR>]");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }
    if config_path.is_empty() {
        eprintln!("Usage: votebot --config <PATH> [--state-dir <DIR>]");
        std::process::exit(1);
    }

    let config = BotConfig::from_file(&config_path).with_context(|| format!("load {config_path}"))?;
    let state_dir = state_dir
        .or_else(|| config.state_dir.clone())
        .unwrap_or_else(default_state_dir);
    let node = Arc::new(NodeClient::new(&config.rpc.node_url).context("node client")?);
    let wallet = Arc::new(WalletClient::new(&config.rpc.wallet_url).context("wallet client")?);

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Ctrl-C received, stopping after the current block");
                let _ = stop_tx.send(true);
            }
            Err(e) => {
                tracing::warn!(reason = %e, "cannot listen for Ctrl-C");
                // Dropping the sender would stop the loop.
                std::future::pending::<()>().await;
            }
        }
    });

    tracing::info!(
        account = %config.watched_account,
        state_dir = %state_dir.display(),
        "starting transaction listener"
    );
    let poll_loop = BotBuilder::new(config)
        .state_dir(state_dir)
        .chain(node)
        .transfers(wallet.clone())
        .rewards(wallet)
        .stop(stop_rx)
        .build()
        .context("build bot")?;
    poll_loop.run().await.context("poll loop")?;
    Ok(())
}
