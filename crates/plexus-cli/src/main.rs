//! Plexus CLI
//!
//! Command-line interface for simulating Plexus token rewards.

use anyhow::Context;
use clap::{Parser, Subcommand};
use plexus_coordinator::scenario::{self, ScenarioParams};
use plexus_coordinator::PlexusConfig;
use plexus_core::{format_units, parse_units, ONE_TOKEN};
use plexus_rewards::{apr_percent, lot_reward};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_CONFIG_PATH: &str = "~/.plexus/plexus.toml";

#[derive(Parser)]
#[command(name = "plexus")]
#[command(version = "0.1.0")]
#[command(about = "Plexus - token rewards accrual engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the deposit/withdraw reward lifecycle on an in-memory deployment
    Simulate {
        /// Configuration file path
        #[arg(short, long, env = "PLEXUS_CONFIG")]
        config: Option<PathBuf>,

        /// Blocks mined between deposit and withdrawal
        #[arg(short, long, default_value = "10")]
        blocks: u64,

        /// Tokens deposited into each tier
        #[arg(short, long, default_value = "2")]
        amount: String,

        /// Native currency converted into each token
        #[arg(long, default_value = "2")]
        convert: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute the reward for one lot
    Quote {
        /// Deposited tokens (decimal)
        #[arg(long)]
        amount: String,

        /// APR with 100000 = 100%
        #[arg(long, default_value = "40000")]
        apr: u64,

        /// Seconds held
        #[arg(long)]
        elapsed: u64,
    },

    /// Write the default configuration
    InitConfig {
        /// Output file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_logging(verbose: bool, level: &str, format: &str) {
    let env_filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };
    let json = format.eq_ignore_ascii_case("json");

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_target(true)))
        .with((!json).then(|| {
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
        }))
        .init();
}

fn expand_path(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(rest) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
    }
    path.to_path_buf()
}

/// Explicit path must exist; the default path is optional
fn load_config(path: Option<&Path>) -> anyhow::Result<PlexusConfig> {
    match path {
        Some(path) => {
            let path = expand_path(path);
            PlexusConfig::load(&path).with_context(|| format!("loading {}", path.display()))
        }
        None => {
            let path = expand_path(Path::new(DEFAULT_CONFIG_PATH));
            if path.exists() {
                PlexusConfig::load(&path).with_context(|| format!("loading {}", path.display()))
            } else {
                Ok(PlexusConfig::default())
            }
        }
    }
}

fn parse_amount(value: &str) -> anyhow::Result<u128> {
    parse_units(value).with_context(|| format!("invalid token amount '{}'", value))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            config,
            blocks,
            amount,
            convert,
            json,
        } => {
            let config = load_config(config.as_deref())?;
            init_logging(cli.verbose, &config.logging.level, &config.logging.format);

            let params = ScenarioParams {
                blocks,
                convert_value: parse_amount(&convert)?,
                deposit_amount: parse_amount(&amount)?,
            };
            tracing::info!(
                "Simulating {} tiers, {} blocks, deposit {} each",
                config.tiers.len(),
                blocks,
                amount
            );

            let report = scenario::run(&config, &params)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.render());
            }
        }

        Commands::Quote { amount, apr, elapsed } => {
            init_logging(cli.verbose, "warn", "text");
            let amount = parse_amount(&amount)?;
            let reward = lot_reward(amount, apr, elapsed)?;

            println!("Deposit: {}", format_units(amount));
            println!("APR:     {}%", apr_percent(apr));
            println!("Held:    {}s", elapsed);
            println!("Reward:  {} ({} base units)", format_units(reward), reward);
            if amount >= ONE_TOKEN && reward == 0 {
                println!("Note: reward rounds down to zero");
            }
        }

        Commands::InitConfig { output, force } => {
            init_logging(cli.verbose, "info", "text");
            let path = expand_path(&output);
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let rendered = PlexusConfig::default().to_toml()?;
            std::fs::write(&path, rendered)?;
            tracing::info!("Wrote default configuration to {}", path.display());
            println!("Configuration written to {}", path.display());
        }
    }

    Ok(())
}
