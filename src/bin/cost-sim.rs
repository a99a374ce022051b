// cost-sim - real-time transaction cost simulator CLI

use clap::{Parser, Subcommand};
use std::path::Path;
use tracing::{error, info, warn, Level};
use tx_cost_simulator::{Config, SessionParams};

// Load command modules from cli directory
#[path = "../cli/session_commands.rs"]
mod session_commands;

#[derive(Parser)]
#[command(name = "cost-sim")]
#[command(version)]
#[command(about = "Real-time transaction cost simulator for L2 order-book feeds", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Stream the order book and estimate costs tick by tick
    Run {
        #[command(flatten)]
        session: SessionArgs,

        /// Stop after this many minutes
        #[arg(short, long)]
        minutes: Option<f64>,

        /// Override the latency log path
        #[arg(long)]
        log_file: Option<String>,
    },

    /// Estimate costs for one hypothetical top of book (offline)
    Estimate {
        #[command(flatten)]
        session: SessionArgs,

        /// Best bid price
        #[arg(long)]
        bid: f64,

        /// Best ask price
        #[arg(long)]
        ask: f64,
    },
}

#[derive(clap::Args)]
struct SessionArgs {
    /// Spot asset, e.g. BTC-USDT
    #[arg(short, long, default_value = "BTC-USDT")]
    asset: String,

    /// Order size in USD
    #[arg(short, long, default_value = "100")]
    quantity: String,

    /// Assumed volatility
    #[arg(long, default_value = "0.02")]
    volatility: String,

    /// Fee tier ("Tier 1" or "Tier 2")
    #[arg(short, long, default_value = "Tier 1")]
    fee_tier: String,
}

impl SessionArgs {
    fn into_params(self) -> SessionParams {
        SessionParams::new(self.quantity, self.volatility, self.fee_tier, self.asset)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Config is read before logging is up so its level can apply; problems
    // are reported once the subscriber exists
    let loaded = load_config(&cli.config);

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        loaded
            .as_ref()
            .ok()
            .and_then(Option::as_ref)
            .and_then(|c| c.logging.level.parse::<Level>().ok())
            .unwrap_or(Level::INFO)
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("🚀 Transaction Cost Simulator v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        // Init doesn't require config (it creates it)
        Commands::Init { force } => {
            init_config(&cli.config, force)?;
        }

        Commands::Run { session, minutes, log_file } => {
            let mut config = config_or_exit(loaded);
            if let Some(log_file) = log_file {
                config.telemetry.log_file = log_file;
            }
            session_commands::run_session(session.into_params(), minutes, config).await?;
        }

        Commands::Estimate { session, bid, ask } => {
            let config = config_or_exit(loaded);
            session_commands::estimate_once(session.into_params(), bid, ask, &config)?;
        }
    }

    Ok(())
}

/// Use the config file if present, built-in defaults otherwise
fn load_config(path: &str) -> Result<Option<Config>, tx_cost_simulator::ConfigError> {
    if Path::new(path).exists() {
        Config::from_file(path).map(Some)
    } else {
        Ok(None)
    }
}

fn config_or_exit(loaded: Result<Option<Config>, tx_cost_simulator::ConfigError>) -> Config {
    match loaded {
        Ok(Some(config)) => config,
        Ok(None) => {
            warn!("⚠️  No config file found, using built-in defaults (run: cost-sim init)");
            Config::default()
        }
        Err(e) => {
            error!("❌ Configuration Error");
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn init_config(path: &str, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if Path::new(path).exists() && !force {
        warn!("⚠️  {} already exists, skipping (use --force to overwrite)", path);
        return Ok(());
    }

    Config::default().to_file(path)?;
    info!("📝 Created {}", path);
    info!("💡 Next: cost-sim run --asset BTC-USDT --quantity 100");
    Ok(())
}
