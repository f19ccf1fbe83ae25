//! QC-Tx-Sim: tx manager simulator
//!
//! Runs one `send` against an in-memory ledger and prints every attempt the
//! manager made. Useful for trying fee policies before deploying them.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use qc_18_tx_manager::adapters::toml_config::parse_fee;
use qc_18_tx_manager::{
    InMemoryLedger, SendReport, SimpleTxManager, TomlConfigLoader, TxManagerConfig,
};

/// QC-Tx-Sim: drive the tx manager against a simulated ledger
#[derive(Parser, Debug)]
#[command(name = "qc-tx-sim")]
#[command(about = "Publish a simulated transaction with fee escalation")]
struct Args {
    /// TOML file with a [tx_manager] section (defaults are used otherwise)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Lowest fee the ledger will mine (decimal or 0x hex)
    #[arg(short, long, default_value = "5000000000")]
    inclusion_price: String,

    /// Time a transaction must wait before it can be mined
    #[arg(long, default_value = "0")]
    confirmation_delay_ms: u64,

    /// Fees the ledger refuses to accept (repeatable)
    #[arg(long = "reject-fee")]
    reject_fees: Vec<String>,

    /// Cancel the send after this many milliseconds
    #[arg(long)]
    cancel_after_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;

    let ledger = Arc::new(
        InMemoryLedger::new(parse_fee("inclusion_price", &args.inclusion_price)?)
            .with_confirmation_delay(Duration::from_millis(args.confirmation_delay_ms)),
    );
    for fee in &args.reject_fees {
        ledger.reject_fee(parse_fee("reject_fee", fee)?);
    }

    let manager = SimpleTxManager::new(config, ledger.clone())?;
    info!(
        deadline_ms = manager.config().publish_deadline().as_millis() as u64,
        "Starting simulated send"
    );

    let cancel = CancellationToken::new();
    spawn_cancel_triggers(&cancel, args.cancel_after_ms);

    let report = manager.send_with_report(&cancel, ledger.clone()).await;
    print_report(&report, ledger.mined_count());

    report.into_result().context("send did not confirm")?;
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<TxManagerConfig> {
    match path {
        Some(path) => TomlConfigLoader::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => {
            warn!("No config file given, using defaults");
            Ok(TxManagerConfig::default())
        }
    }
}

/// Cancel on Ctrl+C, and after `after_ms` if set
fn spawn_cancel_triggers(cancel: &CancellationToken, after_ms: Option<u64>) {
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling send");
            on_signal.cancel();
        }
    });

    if let Some(ms) = after_ms {
        let on_timer = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            on_timer.cancel();
        });
    }
}

fn print_report(report: &SendReport, mined: usize) {
    println!("state:    {:?}", report.final_state);
    println!("elapsed:  {:?}", report.elapsed);
    println!("mined:    {mined}");
    for attempt in &report.attempts {
        let hash = attempt
            .tx_hash
            .map(|h| h.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  #{:<3} fee={:<24} {:<11} {}",
            attempt.index,
            attempt.fee.to_string(),
            format!("{:?}", attempt.outcome),
            hash
        );
    }
    match &report.result {
        Ok(receipt) => println!(
            "receipt:  block={} fee={} gas={}",
            receipt.block_number,
            receipt.effective_fee,
            receipt.gas_used
        ),
        Err(e) => println!("error:    {e}"),
    }
}
