//! StreakTrader - Main Entry Point
//!
//! Connects to Alpaca, reconciles the account and trades one symbol against
//! its price streaks until interrupted.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use streak_trader::config::load_config;
use streak_trader::{AlpacaGateway, Controller, MartingaleStrategy};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Symbol to trade; overrides the config file
    #[arg(long)]
    symbol: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    let mut config = load_config(Some(&args.config)).context("loading configuration")?;
    if let Some(symbol) = args.symbol {
        config.trading.symbol = symbol.to_uppercase();
    }
    if let Some(level) = args.log_level {
        config.settings.log_level = level;
    }

    init_tracing(
        &config.settings.log_level,
        args.json_logs || config.settings.json_logs(),
    )?;

    info!("Starting StreakTrader");
    info!("Configuration file: {}", args.config);

    config.validate().context("invalid configuration")?;

    let gateway = Arc::new(
        AlpacaGateway::new(&config.alpaca, &config.settings).context("creating Alpaca gateway")?,
    );
    let strategy = Box::new(MartingaleStrategy::new(config.trading.base_bet_fraction));
    let mut controller = Controller::new(gateway, strategy, config.trading.clone());

    controller
        .initialize()
        .await
        .context("initializing controller")?;

    info!(symbol = %controller.symbol(), "Application initialized successfully");

    controller
        .run(shutdown_signal())
        .await
        .context("running controller")?;

    info!(
        position = controller.ledger().position().quantity,
        "Stopped cleanly"
    );
    Ok(())
}
