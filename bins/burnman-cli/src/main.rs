//! Burningman command-line tool.
//!
//! Loads a ledger dump (JSON, as written by `MemoryLedger::to_json`) and
//! answers burningman queries against it. Results are printed as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use tracing::info;

use burnman_core::constants::NetworkType;
use burnman_core::ledger::MemoryLedger;
use burnman_engine::{BurningManService, EngineConfig, ReceiverFlag};

/// Burningman fee accounting over a ledger dump.
#[derive(Parser, Debug)]
#[command(name = "burnman-cli", version, about = "Burningman shares, burn targets and receivers")]
struct Cli {
    /// Ledger dump in JSON.
    #[arg(long, global = true, default_value = "ledger.json")]
    ledger: PathBuf,

    /// Height of the last parsed block.
    #[arg(long, global = true)]
    height: Option<u64>,

    /// Use testnet accounting values.
    #[arg(long, global = true, conflicts_with = "regtest")]
    testnet: bool,

    /// Use regtest accounting values.
    #[arg(long, global = true, conflicts_with = "testnet")]
    regtest: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List candidates with their shares.
    Candidates,
    /// Show the burn target and its terms.
    BurnTarget,
    /// Show the height receiver lists are built for.
    SelectionHeight,
    /// Build the delayed payout receiver list.
    Receivers(ReceiversArgs),
    /// Draw the BTC fee receiver address.
    FeeAddress(FeeAddressArgs),
    /// Suggested burn amounts for one candidate.
    BurnRange(BurnRangeArgs),
}

#[derive(Args, Debug)]
struct ReceiversArgs {
    /// Deposit tx output amount in sat.
    #[arg(long)]
    input_amount: i64,

    /// Trade tx fee in sat.
    #[arg(long)]
    trade_fee: i64,

    /// Selection height agreed with the peer (default: own selection height).
    #[arg(long)]
    selection_height: Option<u64>,

    /// Evaluate flag activation at this unix timestamp instead of now.
    #[arg(long, conflicts_with = "exclude_dormant")]
    flags_at: Option<i64>,

    /// Exclude dormant candidates regardless of the activation date.
    #[arg(long)]
    exclude_dormant: bool,
}

#[derive(Args, Debug)]
struct FeeAddressArgs {
    /// Seed the lottery for a reproducible draw.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct BurnRangeArgs {
    /// Candidate name.
    #[arg(long)]
    name: String,
}

impl Cli {
    fn network(&self) -> NetworkType {
        if self.regtest {
            NetworkType::Regtest
        } else if self.testnet {
            NetworkType::Testnet
        } else {
            NetworkType::Mainnet
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, &cli.log_format);

    let json = std::fs::read_to_string(&cli.ledger)
        .with_context(|| format!("failed to read ledger {}", cli.ledger.display()))?;
    let ledger = MemoryLedger::from_json(&json).context("failed to parse ledger")?;
    let height = cli.height.unwrap_or_else(|| tip_height(&ledger));
    let network = cli.network();
    info!(?network, height, ledger = %cli.ledger.display(), "burnman-cli: ledger loaded");

    let service = BurningManService::new(Arc::new(ledger), EngineConfig::for_network(network));
    service.on_parse_block_complete(height);

    let output = match cli.command {
        Commands::Candidates => candidates(&service)?,
        Commands::BurnTarget => burn_target(&service)?,
        Commands::SelectionHeight => json!({
            "height": height,
            "selection_height": service.burning_man_selection_height()?,
        }),
        Commands::Receivers(args) => receivers(&service, args)?,
        Commands::FeeAddress(args) => fee_address(&service, args)?,
        Commands::BurnRange(args) => burn_range(&service, args)?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Highest height any ledger record refers to.
fn tip_height(ledger: &MemoryLedger) -> u64 {
    let issuances = ledger.issuances.iter().map(|i| i.height());
    let burns = ledger.proof_of_burn_txs.iter().map(|tx| tx.height);
    issuances.chain(burns).max().unwrap_or(ledger.genesis_height)
}

fn candidates(service: &BurningManService) -> Result<serde_json::Value> {
    let snapshot = service.current_snapshot()?;
    let rows: Vec<_> = snapshot
        .candidates()
        .values()
        .map(|c| {
            json!({
                "name": c.name(),
                "address": c.most_recent_address(),
                "accumulated_decayed_compensation_amount": c.accumulated_decayed_compensation_amount(),
                "accumulated_decayed_burn_amount": c.accumulated_decayed_burn_amount(),
                "issuance_share": c.issuance_share(),
                "boosted_issuance_share": c.boosted_issuance_share(),
                "burn_output_share": c.burn_output_share(),
                "effective_burn_output_share": c.effective_burn_output_share(),
                "allowed_burn_amount": c.allowed_burn_amount(),
                "expected_revenue": c.expected_revenue(),
                "capped": c.is_capped(),
            })
        })
        .collect();
    Ok(json!({
        "height": snapshot.height(),
        "candidates": rows,
        "legacy_dpt": snapshot.legacy_burning_man_dpt(),
        "legacy_btc_fees": snapshot.legacy_burning_man_btc_fees(),
    }))
}

fn burn_target(service: &BurningManService) -> Result<serde_json::Value> {
    let snapshot = service.current_snapshot()?;
    Ok(json!({
        "height": snapshot.height(),
        "burn_target": snapshot.burn_target(),
        "boosted_burn_target": snapshot.boosted_burn_target(),
        "average_distribution_per_cycle": snapshot.average_distribution_per_cycle(),
        "breakdown": snapshot.burn_target_breakdown(),
    }))
}

fn receivers(service: &BurningManService, args: ReceiversArgs) -> Result<serde_json::Value> {
    let selection_height = match args.selection_height {
        Some(h) => h,
        None => service.burning_man_selection_height()?,
    };
    let flags = match args.flags_at {
        _ if args.exclude_dormant => vec![ReceiverFlag::ExcludeDormantCandidates],
        Some(ts) => {
            let Some(at) = DateTime::<Utc>::from_timestamp(ts, 0) else {
                bail!("invalid timestamp {ts}");
            };
            ReceiverFlag::activated_at(at)
        }
        None => ReceiverFlag::activated_now(),
    };
    let receivers = service.delayed_payout_receivers(selection_height, args.input_amount, args.trade_fee, &flags)?;
    Ok(json!({
        "selection_height": selection_height,
        "flags": flags,
        "total": receivers.iter().map(|r| r.amount).sum::<i64>(),
        "receivers": receivers,
    }))
}

fn fee_address(service: &BurningManService, args: FeeAddressArgs) -> Result<serde_json::Value> {
    let address = match args.seed {
        Some(seed) => service.fee_receiver_address_with(&mut StdRng::seed_from_u64(seed))?,
        None => service.fee_receiver_address()?,
    };
    Ok(json!({ "address": address }))
}

fn burn_range(service: &BurningManService, args: BurnRangeArgs) -> Result<serde_json::Value> {
    let Some((lower, upper)) = service.candidate_burn_target_range(&args.name)? else {
        bail!("unknown candidate {}", args.name);
    };
    Ok(json!({ "name": args.name, "lower": lower, "upper": upper }))
}

/// Initialize the tracing subscriber with the given level and format.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    // stdout carries the JSON result
    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
            .init();
    }
}
