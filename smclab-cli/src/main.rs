//! SMC Lab CLI — backtest, live monitor and ledger commands.
//!
//! Commands:
//! - `backtest` — run the simulator on a CSV file or synthetic bars
//! - `live` — evaluate each closed bar on a 15-minute schedule (or once)
//! - `ledger` — print loss statistics and the current risk tier

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use smclab_core::gates::Rejection;
use smclab_core::ledger::{EntryStatus, LedgerStore, RiskLedger};
use smclab_runner::{
    format_summary, generate_synthetic_bars, load_csv, next_cycle_time, next_heartbeat_time,
    run_backtest_on, AppConfig, CsvBarSource, CycleOutcome, CycleState, LiveEngine, LogNotifier,
    Retrying,
};

#[derive(Parser)]
#[command(
    name = "smclab",
    about = "SMC Lab — fair value gap signals, backtests and live risk ledger"
)]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a backtest over historical bars.
    Backtest {
        /// CSV file with open_time/timestamp, open, high, low, close[, volume].
        #[arg(long, conflicts_with = "synthetic")]
        data: Option<PathBuf>,

        /// Use seeded synthetic 15-minute bars instead of a file.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Number of synthetic bars.
        #[arg(long, default_value_t = 20_000)]
        bars: usize,

        /// Seed for synthetic bars.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Write the full result as JSON.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write the trade log as CSV.
        #[arg(long)]
        trades_csv: Option<PathBuf>,
    },
    /// Evaluate closed bars as they arrive and record signals in the ledger.
    Live {
        /// CSV file the bar collector appends to (overrides live.bars_file).
        #[arg(long)]
        data: Option<PathBuf>,

        /// Ledger file (overrides live.ledger_path).
        #[arg(long)]
        ledger: Option<PathBuf>,

        /// Run a single cycle and exit.
        #[arg(long, default_value_t = false)]
        once: bool,
    },
    /// Show ledger statistics and the current risk tier.
    Ledger {
        /// Ledger file (overrides live.ledger_path).
        #[arg(long)]
        ledger: Option<PathBuf>,

        /// Also list every entry.
        #[arg(long, default_value_t = false)]
        entries: bool,

        /// Print statistics and entries as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Backtest {
            data,
            synthetic,
            bars,
            seed,
            output,
            trades_csv,
        } => run_backtest_cmd(config, data, synthetic, bars, seed, output, trades_csv),
        Commands::Live { data, ledger, once } => {
            let mut config = config;
            if let Some(path) = data {
                config.live.bars_file = path;
            }
            if let Some(path) = ledger {
                config.live.ledger_path = path;
            }
            run_live(config, once)
        }
        Commands::Ledger {
            ledger,
            entries,
            json,
        } => {
            let path = ledger.unwrap_or(config.live.ledger_path);
            run_ledger_status(path, entries, json)
        }
    }
}

fn run_backtest_cmd(
    config: AppConfig,
    data: Option<PathBuf>,
    synthetic: bool,
    bars: usize,
    seed: u64,
    output: Option<PathBuf>,
    trades_csv: Option<PathBuf>,
) -> Result<()> {
    let loaded = match (data, synthetic) {
        (Some(path), _) => {
            load_csv(&path).with_context(|| format!("loading bars from {}", path.display()))?
        }
        (None, true) => {
            info!(bars, seed, "generating synthetic bars, results will be tagged as synthetic");
            let start = DateTime::<Utc>::from_timestamp(1_704_067_200, 0).unwrap_or_default();
            generate_synthetic_bars(seed, start, bars)
        }
        (None, false) => bail!("either --data <csv> or --synthetic is required"),
    };

    let result = run_backtest_on(&config, &loaded)?;

    println!("=== FVG backtest ===");
    if let (Some(first), Some(last)) = (result.first_bar, result.last_bar) {
        println!("Bars: {} ({} .. {})", result.bar_count, first, last);
    }
    println!("Gaps detected: {}", result.gaps.len());
    for reason in [
        Rejection::OutsideSession,
        Rejection::FeaturesUndefined,
        Rejection::WeakMomentum,
        Rejection::NoDisplacement,
    ] {
        let n = result.rejections.get(&reason).copied().unwrap_or(0);
        println!("  rejected {reason}: {n}");
    }
    println!("{}", format_summary(&result.summary, config.backtest.initial_capital));
    println!("Max drawdown: {:.2}%", result.max_drawdown * 100.0);
    if let Some(open) = &result.unsettled {
        println!(
            "Unsettled: {} from {:.2} at {} (not counted)",
            open.direction, open.entry, open.time
        );
    }
    if result.synthetic {
        println!("(synthetic data)");
    }

    if let Some(path) = output {
        result.save_json(&path)?;
        println!("Result written to {}", path.display());
    }
    if let Some(path) = trades_csv {
        result.write_trades_csv(&path)?;
        println!("Trades written to {}", path.display());
    }
    Ok(())
}

fn run_live(config: AppConfig, once: bool) -> Result<()> {
    let live = config.live.clone();
    info!(
        symbol = %live.symbol,
        timeframe = %live.timeframe,
        bars = %live.bars_file.display(),
        ledger = %live.ledger_path.display(),
        "live monitor starting"
    );

    let source = Retrying::new(CsvBarSource::new(&live.bars_file), 3, Duration::from_secs(5));
    let engine = LiveEngine::new(config, source, LogNotifier);

    let mut state = run_guarded(&engine, CycleState::default());
    if once {
        return Ok(());
    }
    engine.notify(&engine.formatter().started(Utc::now()));

    let mut next_cycle = next_cycle_time(
        Utc::now(),
        live.cycle_interval_minutes,
        live.cycle_delay_seconds,
    );
    let mut next_heartbeat = next_heartbeat_time(Utc::now());

    loop {
        let wake = next_cycle.min(next_heartbeat);
        if let Ok(wait) = (wake - Utc::now()).to_std() {
            std::thread::sleep(wait);
        }
        let now = Utc::now();

        if now >= next_heartbeat {
            engine.heartbeat(now);
            next_heartbeat = next_heartbeat_time(now);
        }
        if now >= next_cycle {
            state = run_guarded(&engine, state);
            next_cycle = next_cycle_time(
                Utc::now(),
                live.cycle_interval_minutes,
                live.cycle_delay_seconds,
            );
        }
    }
}

/// One cycle; a panic is logged and the previous state carried forward.
fn run_guarded(
    engine: &LiveEngine<Retrying<CsvBarSource>, LogNotifier>,
    state: CycleState,
) -> CycleState {
    let now = Utc::now();
    match panic::catch_unwind(AssertUnwindSafe(|| engine.run_cycle(state, now))) {
        Ok(report) => {
            match &report.outcome {
                CycleOutcome::Recorded(s) => info!(direction = %s.direction, entry = s.entry, "cycle: signal recorded"),
                CycleOutcome::Halted(_) => info!("cycle: circuit breaker active"),
                CycleOutcome::NoSignal(reason) => info!(%reason, "cycle: no signal"),
                CycleOutcome::Duplicate => info!("cycle: duplicate"),
                CycleOutcome::Skipped(err) | CycleOutcome::Discarded(err) => {
                    info!(%err, "cycle: nothing to do")
                }
            }
            info!(
                tier = %report.tier,
                daily_losses = report.stats.daily_loss_count,
                streak = report.stats.consecutive_loss_count,
                resolved = report.resolved.len(),
                "cycle complete"
            );
            report.state
        }
        Err(_) => {
            error!("cycle panicked, continuing with the next scheduled cycle");
            state
        }
    }
}

fn run_ledger_status(path: PathBuf, list: bool, json: bool) -> Result<()> {
    let store = LedgerStore::new(&path);
    let ledger = RiskLedger::new(
        store
            .try_load()
            .with_context(|| format!("reading ledger {}", path.display()))?,
    );
    let now = Utc::now();
    let stats = ledger.stats(now);

    if json {
        let doc = serde_json::json!({
            "path": path.display().to_string(),
            "open": ledger.open_count(),
            "stats": stats,
            "tier_pct": ledger.risk_tier(now).percent(),
            "entries": ledger.entries(),
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("Ledger: {}", path.display());
    println!("Entries: {} ({} open)", ledger.len(), ledger.open_count());
    println!("Losses today: {}", stats.daily_loss_count);
    println!("Loss streak: {}", stats.consecutive_loss_count);
    println!("Risk tier: {}", ledger.risk_tier(now));

    if list {
        for e in ledger.entries() {
            let status = match e.status {
                EntryStatus::Open => "OPEN".to_string(),
                EntryStatus::Closed => format!("{:?}", e.result).to_uppercase(),
            };
            println!(
                "{}  {:5}  entry {:.2}  sl {:.2}  tp {:.2}  {}",
                e.time,
                e.direction.as_str(),
                e.entry,
                e.stop,
                e.target,
                status
            );
        }
    }
    Ok(())
}
