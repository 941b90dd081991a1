use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use tokio_stream::StreamExt;
use tracing::{debug, info};

use iko_blockchain::{BlockChain, NodeConfig, NoOpHook, Shutdown, StorageBackend};
use iko_crypto::SigningKey;
use iko_ledger::{ChainLog, InMemoryChain, Transaction};
use iko_state::InMemoryState;
use iko_types::KittyId;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Run(args) => cmd_run(args),
        Command::Keygen => cmd_keygen(&cli.format),
        Command::Config => cmd_config(),
    }
}

fn cmd_keygen(format: &OutputFormat) -> anyhow::Result<()> {
    let sk = SigningKey::generate();
    let pk = sk.verifying_key();
    match format {
        OutputFormat::Text => {
            println!("{} {}", "public key:".bold(), pk.to_hex().cyan());
            println!("{} {}", "secret key:".bold(), sk.to_hex().yellow());
        }
        OutputFormat::Json => {
            let out = serde_json::json!({
                "public_key": pk.to_hex(),
                "secret_key": sk.to_hex(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(())
}

fn cmd_config() -> anyhow::Result<()> {
    print!("{}", NodeConfig::default().to_toml_string()?);
    Ok(())
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let config = node_config(&args)?;
    config.validate().context("invalid node configuration")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(run_node(config))
}

/// Merge the optional config file with command-line overrides.
fn node_config(args: &RunArgs) -> anyhow::Result<NodeConfig> {
    let mut config = match &args.config {
        Some(path) => NodeConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => NodeConfig::default(),
    };

    if let Some(pk) = &args.master_public_key {
        config.master_public_key = Some(pk.clone());
    }
    if args.memory {
        config.storage = StorageBackend::Memory;
    }
    if args.test {
        config.test.enabled = true;
    }
    if let Some(sk) = &args.test_secret_key {
        config.test.secret_key = Some(sk.clone());
    }
    if let Some(count) = args.test_injection_count {
        config.test.injection_count = count;
    }
    if let Some(capacity) = args.feed_capacity {
        config.chain.feed_capacity = capacity;
    }
    Ok(config)
}

async fn run_node(config: NodeConfig) -> anyhow::Result<()> {
    let shutdown = Shutdown::new();
    let chain: Arc<dyn ChainLog> = match config.storage {
        StorageBackend::Memory => Arc::new(InMemoryChain::new(config.chain.feed_capacity)),
    };

    let bc = Arc::new(
        BlockChain::builder()
            .chain(chain)
            .state(Arc::new(InMemoryState::new()))
            .creator(config.master_key()?)
            .tx_action(Arc::new(NoOpHook))
            .config(config.chain.clone())
            .shutdown(shutdown.clone())
            .build()
            .context("failed to prepare blockchain")?,
    );
    info!("finished preparing blockchain");

    let feed_task = {
        let mut feed = bc.subscribe().into_stream();
        let mut listener = bc.shutdown_signal();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    next = feed.next() => match next {
                        Some(tx) => info!(tx = %tx, "tx admitted"),
                        None => break,
                    },
                    _ = listener.wait() => break,
                }
            }
        })
    };

    if let Some(sk) = config.test_secret_key()? {
        let count = config.test.injection_count;
        let bc = Arc::clone(&bc);
        tokio::task::spawn_blocking(move || inject_test_txs(&bc, &sk, count))
            .await
            .context("test injection task panicked")??;
    }

    println!(
        "{} iko node running ({} txs, creator {}). Press Ctrl-C to stop.",
        "✓".green().bold(),
        bc.chain().len()?.to_string().bold(),
        bc.creator().short_hex().cyan()
    );

    let mut listener = bc.shutdown_signal();
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.context("failed to listen for Ctrl-C")?,
        _ = listener.wait() => {}
    }
    info!("shutting down");
    bc.close();
    feed_task.await.context("feed task panicked")?;

    let report = bc.audit()?;
    if report.is_valid() {
        println!("{} chain verified: {} txs", "✓".green().bold(), report.tx_count);
    } else {
        println!(
            "{} chain has {} violation(s)",
            "✗".red().bold(),
            report.violations.len()
        );
    }
    Ok(())
}

/// Inject `count` linked genesis transactions for kitties `0..count`.
fn inject_test_txs(bc: &BlockChain, sk: &SigningKey, count: u64) -> anyhow::Result<()> {
    let mut prev = bc.chain().head().ok();
    for i in 0..count {
        let tx = Transaction::genesis(prev.as_ref(), KittyId(i), sk);
        debug!(tx = %tx, "test:tx_inject({i})");
        let stored = bc
            .inject_tx(tx)
            .with_context(|| format!("failed to inject test tx for kitty#{i}"))?;
        prev = Some(stored);
    }
    info!(count, "test transactions injected");
    Ok(())
}
