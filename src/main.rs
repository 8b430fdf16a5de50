//! tee-swap - command-line entry point
//!
//! Screens the requester, runs the four-phase private swap and reports how
//! to recover when a run stops part way.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use serde_json::json;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Signer};
use tracing::{info, warn};

use tee_swap::config::{AppConfig, ConfigLoader};
use tee_swap::metrics::{init_tracing_with_metrics, MetricsCollector, TracingConfig};
use tee_swap::orchestrator::assess;
use tee_swap::quote::QuoteRequest;
use tee_swap::types::{KnownAsset, SwapRequest};
use tee_swap::{
    build_compliance_engine, build_orchestrator, build_submitter, quote_provider, ENV_PREFIX,
};

/// Private swap across the public ledger and the isolated domain
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file; `TEE_SWAP__*` variables override its keys
    #[arg(long, global = true, default_value = "config/devnet.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Screen the requester and run Init, Delegate, Execute, Finalize
    Swap {
        /// Requester keypair file
        #[arg(long)]
        keypair: PathBuf,

        #[arg(long)]
        amount_in: u64,

        #[arg(long, default_value = "0")]
        minimum_out: u64,

        /// Input asset symbol (SOL, USDC, ...) or mint address
        #[arg(long)]
        input: String,

        /// Output asset symbol or mint address
        #[arg(long)]
        output: String,

        #[arg(long)]
        slippage_bps: Option<u16>,

        /// Run without the compliance check
        #[arg(long)]
        skip_screening: bool,

        /// Print prometheus metrics to stderr after the run
        #[arg(long)]
        metrics: bool,
    },

    /// Fetch a route quote, optionally executing it as a direct swap
    Quote {
        #[arg(long)]
        input: String,

        #[arg(long)]
        output: String,

        #[arg(long)]
        amount: u64,

        #[arg(long)]
        slippage_bps: Option<u16>,

        /// Sign and send the routed swap transaction for the quote
        #[arg(long, requires = "keypair")]
        execute: bool,

        /// Keypair that pays for and signs the swap transaction
        #[arg(long)]
        keypair: Option<PathBuf>,
    },

    /// Show the on-ledger swap account of an owner
    State {
        #[arg(long)]
        owner: String,
    },

    /// Screen wallets against the risk rules
    Screen {
        #[arg(required = true)]
        addresses: Vec<String>,
    },
}

fn parse_asset(value: &str) -> anyhow::Result<Pubkey> {
    if let Some(asset) = KnownAsset::from_symbol(value) {
        return Ok(asset.mint());
    }
    Pubkey::from_str(value).map_err(|e| anyhow!("unknown asset '{value}': {e}"))
}

fn load_config(path: &PathBuf) -> anyhow::Result<AppConfig> {
    ConfigLoader::from_file_with_env(path, ENV_PREFIX)
        .with_context(|| format!("loading {}", path.display()))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = load_config(&args.config)?;

    let metrics = Arc::new(MetricsCollector::new());
    let tracing_config = TracingConfig {
        json: config.network.json_logs,
        ..TracingConfig::with_level(&config.network.log_level)
    };
    init_tracing_with_metrics(metrics.clone(), &tracing_config)?;

    match args.command {
        Command::Swap {
            keypair,
            amount_in,
            minimum_out,
            input,
            output,
            slippage_bps,
            skip_screening,
            metrics: print_metrics,
        } => {
            let signer = read_keypair_file(&keypair)
                .map_err(|e| anyhow!("reading keypair {}: {e}", keypair.display()))?;
            let mut request = SwapRequest::new(
                signer.pubkey(),
                amount_in,
                minimum_out,
                parse_asset(&input)?,
                parse_asset(&output)?,
            )?;
            if let Some(bps) = slippage_bps {
                request = request.with_slippage_bps(bps)?;
            }

            if skip_screening {
                warn!(requester = %signer.pubkey(), "Compliance screening skipped");
            } else {
                let engine = build_compliance_engine(&config, metrics.clone())?;
                let decision = engine.check(&signer.pubkey().to_string()).await?;
                if !decision.allowed {
                    bail!("requester denied: {}", decision.reason);
                }
            }

            let orchestrator = build_orchestrator(&config, metrics.clone())?;
            info!(
                requester = %request.requester,
                swap_address = %orchestrator.swap_address(&request.requester),
                "Starting swap"
            );
            let outcome = orchestrator.run(&request, &signer).await;
            let recovery = assess(&outcome);

            print_json(&json!({
                "correlation_id": outcome.correlation_id.to_string(),
                "record": outcome.record,
                "error": outcome.error.as_ref().map(|e| e.to_string()),
                "recovery": recovery,
            }))?;

            if print_metrics {
                eprintln!("{}", metrics.export_metrics()?);
            }
            if let Some(error) = outcome.error {
                return Err(error.into());
            }
        }

        Command::Quote {
            input,
            output,
            amount,
            slippage_bps,
            execute,
            keypair,
        } => {
            let mut request = QuoteRequest::new(parse_asset(&input)?, parse_asset(&output)?, amount);
            if let Some(bps) = slippage_bps {
                request = request.with_slippage_bps(bps);
            }

            match keypair.filter(|_| execute) {
                None => {
                    let quote = quote_provider(&config)?.get_quote(&request).await?;
                    print_json(&quote)?;
                }
                Some(keypair) => {
                    let signer = read_keypair_file(&keypair)
                        .map_err(|e| anyhow!("reading keypair {}: {e}", keypair.display()))?;
                    let submitter = build_submitter(&config, metrics)?;
                    let quote = submitter.quotes().get_quote(&request).await?;

                    let report = submitter.submit_swap_transaction(&quote, &signer).await?;
                    print_json(&json!({
                        "signature": report.outcome.confirmed().map(|s| s.to_string()),
                        "attempts": report.attempts,
                        "in_amount": quote.in_amount,
                        "out_amount": quote.out_amount,
                        "other_amount_threshold": quote.other_amount_threshold,
                    }))?;
                }
            }
        }

        Command::State { owner } => {
            let owner = Pubkey::from_str(&owner).map_err(|e| anyhow!("invalid owner: {e}"))?;
            let orchestrator = build_orchestrator(&config, metrics)?;
            let address = orchestrator.swap_address(&owner);

            let state = orchestrator.fetch_swap_state(&owner).await?;
            let account = state.map(|account| {
                json!({
                    "user": account.user.to_string(),
                    "amount_in": account.amount_in,
                    "minimum_amount_out": account.minimum_amount_out,
                    "status": format!("{:?}", account.status),
                    "executed_at": account.executed_at,
                    "bump": account.bump,
                })
            });
            print_json(&json!({
                "swap_address": address.to_string(),
                "account": account,
            }))?;
        }

        Command::Screen { addresses } => {
            let engine = build_compliance_engine(&config, metrics)?;
            let results = engine.batch_check(&addresses).await;
            let report: Vec<_> = addresses
                .iter()
                .map(|address| {
                    json!({
                        "address": address,
                        "allowed": results.get(address).copied().unwrap_or(false),
                    })
                })
                .collect();
            print_json(&report)?;
        }
    }

    Ok(())
}
