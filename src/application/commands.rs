//! CLI commands and handlers
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing::info;

use crate::app::{self, AppCfg, Overrides};
use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "dex-price-monitor")]
#[command(version, about = "Uniswap V2 pool price monitor with threshold alerts")]
pub struct Cli {
    /// Path to config file (defaults are used when it does not exist)
    #[arg(long, global = true, default_value = "Config.toml")]
    pub config: String,

    /// Ethereum JSON-RPC endpoint
    #[arg(long, global = true, env = "RPC_URL")]
    pub rpc_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Monitor prices continuously (default)
    Monitor {
        /// Check interval in milliseconds
        #[arg(short, long, env = "PRICE_CHECK_INTERVAL")]
        interval: Option<u64>,

        /// Alert threshold in percent
        #[arg(short, long, env = "PRICE_CHANGE_THRESHOLD")]
        threshold: Option<f64>,

        /// Fetch attempts per pair and cycle
        #[arg(short = 'r', long)]
        max_retries: Option<u32>,

        /// Stop after this many seconds
        #[arg(short, long)]
        duration: Option<u64>,

        /// Print final statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch the current price of each pair once
    Price {
        /// Only this pair
        #[arg(short, long)]
        pair: Option<String>,
    },

    /// List configured pairs
    Pairs,
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Monitor {
            interval: None,
            threshold: None,
            max_retries: None,
            duration: None,
            json: false,
        }
    }
}

pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute the selected command
    pub async fn execute(cli: Cli) -> Result<()> {
        let config = Config::load_or_default(&cli.config)?;
        let command = cli.command.unwrap_or_default();

        match command {
            Commands::Monitor { interval, threshold, max_retries, duration, json } => {
                let overrides = Overrides {
                    rpc_url: cli.rpc_url,
                    interval_ms: interval,
                    alert_threshold_pct: threshold,
                    max_retries,
                };
                let app_cfg = AppCfg::from_config(config, overrides)?;
                app::run_monitor(app_cfg, duration.map(Duration::from_secs), json).await
            }
            Commands::Price { pair } => {
                let overrides = Overrides {
                    rpc_url: cli.rpc_url,
                    ..Overrides::default()
                };
                let app_cfg = AppCfg::from_config(config, overrides)?;
                app::check_prices(app_cfg, pair.as_deref()).await
            }
            Commands::Pairs => Self::execute_pairs_command(config),
        }
    }

    fn execute_pairs_command(config: Config) -> Result<()> {
        info!("Configured pairs: {}", config.pairs.len());
        for pair in &config.pairs {
            let pair = pair.to_pair_config()?;
            println!(
                "{:<15} base {:?} ({} dp)  quote {:?} ({} dp)",
                pair.name, pair.token_a, pair.decimals_a, pair.token_b, pair.decimals_b
            );
        }
        Ok(())
    }
}
