use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use configuration::{Config, SizingConfig, load_config};
use engine::{TradingIterationController, TradingSession};
use executor::{AccountSource, PaperBroker};
use rust_decimal::Decimal;
use std::fs::File;
use std::path::PathBuf;

mod replay;

/// The main entry point for the Swingline trading application.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate(args) => handle_validate(args),
        Commands::Replay(args) => handle_replay(args),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A step-driven swing-high trading engine.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a configuration file, then print the bots it defines.
    Validate(ValidateArgs),
    /// Replay a price file through the engine against a paper broker.
    Replay(ReplayArgs),
}

#[derive(Parser)]
struct ValidateArgs {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
}

#[derive(Parser)]
struct ReplayArgs {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// CSV file with `timestamp,symbol,price` rows, timestamps in RFC 3339.
    #[arg(long)]
    prices: PathBuf,

    /// Starting cash of the paper account.
    #[arg(long, default_value = "100000")]
    cash: Decimal,

    /// Sleep for the configured interval between cycles instead of replaying at full speed.
    #[arg(long)]
    realtime: bool,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn handle_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let config = load_config(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Symbol", "Strategy", "Enabled"]);
    for bot in &config.bots {
        table.add_row(vec![
            bot.symbol.clone(),
            bot.strategy_id.to_string(),
            bot.enabled.to_string(),
        ]);
    }
    println!("{table}");
    println!("{}", describe_risk(&config));
    println!("Configuration is valid.");
    Ok(())
}

fn handle_replay(args: ReplayArgs) -> anyhow::Result<()> {
    let config = load_config(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    // Keep the guard alive so buffered file logs are flushed on exit.
    let _guard = configuration::init_tracing(&config.logging)?;

    let controller = TradingIterationController::from_config(&config)?;
    let mut session = TradingSession::new(controller, PaperBroker::new(args.cash));
    tracing::info!(
        prices = %args.prices.display(),
        cash = %args.cash,
        "Starting replay."
    );

    let file = File::open(&args.prices)
        .with_context(|| format!("failed to open {}", args.prices.display()))?;
    let pause = args.realtime.then(|| config.engine.sleep_interval());
    let summary = replay::replay(file, &mut session, pause)?;

    let broker = session.broker();
    let mut fills = Table::new();
    fills
        .load_preset(UTF8_FULL)
        .set_header(vec!["Time", "Symbol", "Side", "Quantity", "Price"]);
    for execution in broker.executions() {
        fills.add_row(vec![
            execution.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            execution.instrument.to_string(),
            format!("{:?}", execution.side),
            execution.quantity.to_string(),
            execution.price.to_string(),
        ]);
    }
    println!("{fills}");

    let mut totals = Table::new();
    totals.load_preset(UTF8_FULL).set_header(vec!["Metric", "Value"]);
    totals.add_row(vec!["Cycles".to_string(), summary.cycles.to_string()]);
    totals.add_row(vec!["Sessions closed".to_string(), summary.sessions_closed.to_string()]);
    totals.add_row(vec!["Orders".to_string(), summary.orders.to_string()]);
    totals.add_row(vec!["Skipped instrument cycles".to_string(), summary.skipped.to_string()]);
    totals.add_row(vec!["Failures".to_string(), summary.failures.to_string()]);
    totals.add_row(vec!["Final cash".to_string(), broker.get_cash()?.round_dp(2).to_string()]);
    totals.add_row(vec![
        "Final portfolio value".to_string(),
        broker.get_portfolio_value()?.round_dp(2).to_string(),
    ]);
    println!("{totals}");
    Ok(())
}

fn describe_risk(config: &Config) -> String {
    let risk = &config.risk_management;
    let sizing = match &risk.sizing {
        SizingConfig::EqualWeight => {
            format!("equal weight across {} bots", config.enabled_bots().count())
        }
        SizingConfig::Allocation { fraction } => format!("{fraction} of cash per entry"),
        SizingConfig::Fixed { quantity } => format!("{quantity} units per entry"),
    };
    format!(
        "Stop-loss {}%, take-profit {}%, assumed slippage {}%, sizing: {}, cycle every {}s",
        risk.stop_loss_pct,
        risk.take_profit_pct,
        risk.assumed_slippage_pct,
        sizing,
        config.engine.sleep_interval_secs
    )
}
