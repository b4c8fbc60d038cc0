//! Signal Rotator - Main Entry Point
//!
//! Runs the dual-cadence trading loop: a fast take-profit/stop-loss sweep
//! every tick, with a full rebalance cycle nested on a longer period.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use signal_rotator::config::Config;
use signal_rotator::exchange::{RoostooClient, TradingVenue};
use signal_rotator::ledger::PositionLedger;
use signal_rotator::persistence::LedgerStore;
use signal_rotator::risk::RiskThresholds;
use signal_rotator::signals::{MarketSignal, SignalSource, TradingViewScanner};
use signal_rotator::strategy::{
    AllocationPlanner, DualCadence, OrderExecutor, RebalanceOrchestrator, SignalRanker,
};
use signal_rotator::supervisor::CycleSupervisor;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Signal Rotator CLI
#[derive(Parser)]
#[command(name = "signal-rotator")]
#[command(version, about = "Technical-consensus portfolio rotation on Roostoo")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the persisted position ledger
    Status {
        /// Path to SQLite ledger database
        #[arg(short, long, default_value = "data/ledger.db")]
        db: String,
    },
}

/// Counters for the lifetime of the process.
#[derive(Debug)]
struct RunMetrics {
    start_time: DateTime<Utc>,
    full_cycles: u64,
    fast_sweeps: u64,
    risk_exits: u64,
    buys: u64,
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self {
            start_time: Utc::now(),
            full_cycles: 0,
            fast_sweeps: 0,
            risk_exits: 0,
            buys: 0,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging()?;

    if let Some(Commands::Status { db }) = cli.command {
        return show_status(&db);
    }

    info!("🚀 Signal Rotator v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    config.validate()?;
    log_config(&config);

    let venue: Arc<dyn TradingVenue> =
        Arc::new(RoostooClient::new(&config.venue).context("Failed to create venue client")?);

    // The venue's precision rules are load-bearing: without them no quantity
    // can be truncated, so no order can be placed.
    info!("📋 Loading exchange trading rules...");
    let precisions = venue
        .exchange_rules()
        .await
        .context("Could not load exchange trading rules")?;
    info!(pairs = precisions.len(), "Exchange rules loaded");

    let store = LedgerStore::open(&config.storage.ledger_path)?;
    let ledger = PositionLedger::load(store)?;
    info!(positions = ledger.positions().len(), "Position ledger restored");

    let executor = OrderExecutor::new(
        venue.clone(),
        precisions,
        Duration::from_millis(config.schedule.order_throttle_ms),
    );
    let mut orchestrator = RebalanceOrchestrator::new(
        venue.clone(),
        executor,
        SignalRanker::new(&config.thresholds),
        AllocationPlanner::new(&config.capital),
        RiskThresholds::from(&config.thresholds),
        config.capital.reserve_cash,
        ledger,
    );
    let mut scanner = TradingViewScanner::new().context("Failed to create signal scanner")?;

    let mut cadence = DualCadence::new(&config.schedule);
    let mut supervisor = CycleSupervisor::default();
    let mut metrics = RunMetrics::default();
    let universe = config.universe.pairs.clone();

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Shutdown signal received");
        shutdown_clone.store(true, Ordering::SeqCst);
    });

    info!(
        "⚡ Fast TP/SL sweep every {}s, full cycle every {}s",
        config.schedule.fast_check_secs, config.schedule.full_cycle_secs
    );
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    while !shutdown.load(Ordering::SeqCst) {
        let mut tick_delay = cadence.tick_interval();

        if cadence.full_cycle_due() {
            info!("📊 FULL CYCLE #{}", metrics.full_cycles + 1);
            match run_full_cycle(&mut scanner, &mut orchestrator, &universe).await {
                Ok(report) => {
                    metrics.full_cycles += 1;
                    metrics.risk_exits += report.risk_exits as u64;
                    metrics.buys += report.buys as u64;
                    supervisor.record_success();
                    cadence.mark_full_cycle_ran();
                }
                Err(e) => {
                    // A failed cycle must not stall the sweep below: TP/SL
                    // exits keep running off venue prices in the meantime.
                    tick_delay = tick_delay.max(supervisor.record_failure(&e));
                }
            }
        }

        match orchestrator.run_risk_sweep().await {
            Ok(report) => {
                metrics.fast_sweeps += 1;
                metrics.risk_exits += report.exits as u64;
                supervisor.record_success();
            }
            Err(e) => {
                tick_delay = tick_delay.max(supervisor.record_failure(&e));
            }
        }

        cadence.advance();
        info!(
            "⏳ Next tick in {}s (full cycle in {}s, uptime {}m, sweeps {}, cycles {}, exits {}, buys {})",
            tick_delay.as_secs(),
            cadence.until_full_cycle().as_secs(),
            (Utc::now() - metrics.start_time).num_minutes(),
            metrics.fast_sweeps,
            metrics.full_cycles,
            metrics.risk_exits,
            metrics.buys
        );
        tokio::time::sleep(tick_delay).await;
    }

    info!("👋 Signal Rotator shutdown complete");
    Ok(())
}

/// Fetch a fresh signal snapshot and run the full cycle against it.
async fn run_full_cycle(
    scanner: &mut TradingViewScanner,
    orchestrator: &mut RebalanceOrchestrator,
    universe: &[String],
) -> Result<signal_rotator::strategy::CycleReport> {
    let signals: HashMap<String, MarketSignal> = scanner
        .fetch(universe)
        .await
        .context("Failed to fetch signal snapshot")?;

    // An empty snapshot is a feed outage, not a tick failure. Every holding
    // classifies NoData without a signal price, so the cycle is a no-op and
    // the next one retries on schedule.
    if signals.is_empty() {
        warn!("No signals retrieved for any pair; nothing to rank this cycle");
    } else if signals.len() < universe.len() {
        warn!(
            missing = universe.len() - signals.len(),
            "Some pairs have no signal this cycle"
        );
    }

    orchestrator.run_full_cycle(&signals).await
}

/// Print the persisted ledger and exit.
fn show_status(db_path: &str) -> Result<()> {
    let store = LedgerStore::open(db_path)?;
    let mut positions = store.load_all()?;
    positions.sort_by(|a, b| a.asset.cmp(&b.asset));

    info!("📂 Ledger at {db_path}: {} entries", positions.len());
    for pos in &positions {
        info!(
            "   {} | qty {} | avg cost ${} | updated {}",
            pos.asset,
            pos.quantity,
            pos.average_cost,
            pos.updated_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    if positions.is_empty() {
        info!("   (empty)");
    }
    Ok(())
}

/// Initialize logging with file output.
fn init_logging() -> Result<()> {
    use tracing_subscriber::fmt::writer::MakeWriterExt;

    std::fs::create_dir_all("logs")?;

    let file_appender = tracing_appender::rolling::hourly("logs", "signal-rotator.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // Keep the flush guard alive for the program duration
    Box::leak(Box::new(guard));

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("signal_rotator=debug".parse()?)
                .add_directive(Level::INFO.into()),
        )
        .with_writer(std::io::stdout.and(file_writer))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .init();

    Ok(())
}

/// Log configuration on startup.
fn log_config(config: &Config) {
    info!("📋 Configuration:");
    info!("   Venue: {}", config.venue.base_url);
    info!(
        "   TP/SL ratios: {} / {}",
        config.thresholds.take_profit_ratio, config.thresholds.stop_loss_ratio
    );
    info!(
        "   Vote thresholds: strong buy {}, strong sell {}, weak sell {}",
        config.thresholds.strong_buy_votes,
        config.thresholds.strong_sell_votes,
        config.thresholds.weak_sell_votes
    );
    info!(
        "   Reserve cash: ${} | Min order: ${}",
        config.capital.reserve_cash, config.capital.min_order_notional
    );
    info!("   Universe: {} pairs", config.universe.pairs.len());
    info!("   Ledger: {}", config.storage.ledger_path);
}
