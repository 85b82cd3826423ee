// src/app.rs
use anyhow::{Context, Result};
use ethers::types::Address;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::application::StatusDisplay;
use crate::config::{parse_address, Config};
use crate::domain::price::{PriceMonitor, PriceOracle, ResilientFetcher};
use crate::infrastructure::blockchain::{EvmRpcClient, UniswapV2Adapter};
use crate::shared::errors::AppError;
use crate::shared::types::{MonitorSettings, PairConfig};
use crate::shared::utils::format_price;

#[derive(Debug, Clone, PartialEq)]
pub struct AppCfg {
    pub rpc_url: String,
    pub factory_address: Address,
    pub pairs: Vec<PairConfig>,
    pub settings: MonitorSettings,
}

/// Values given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub rpc_url: Option<String>,
    pub interval_ms: Option<u64>,
    pub alert_threshold_pct: Option<f64>,
    pub max_retries: Option<u32>,
}

impl AppCfg {
    /// Merge the config file with overrides (overrides win) and validate
    pub fn from_config(cfg: Config, overrides: Overrides) -> Result<Self> {
        let rpc_url = overrides
            .rpc_url
            .or(cfg.rpc.url)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| AppError::ConfigError("RPC URL not set (use --rpc-url, RPC_URL or [rpc] url)".into()))?;

        let mut settings = cfg.monitor;
        if let Some(interval_ms) = overrides.interval_ms {
            settings.interval_ms = interval_ms;
        }
        if let Some(threshold) = overrides.alert_threshold_pct {
            settings.alert_threshold_pct = threshold;
        }
        if let Some(max_retries) = overrides.max_retries {
            settings.max_retries = max_retries;
        }

        let pairs = cfg
            .pairs
            .iter()
            .map(|pair| pair.to_pair_config())
            .collect::<Result<Vec<_>>>()?;

        let app_cfg = Self {
            rpc_url,
            factory_address: parse_address(&cfg.uniswap.factory).context("uniswap factory")?,
            pairs,
            settings,
        };
        app_cfg.validate()?;
        Ok(app_cfg)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.pairs.is_empty() {
            return Err(AppError::ConfigError("No pairs configured".into()));
        }

        let mut names = HashSet::new();
        for pair in &self.pairs {
            if pair.name.trim().is_empty() {
                return Err(AppError::ConfigError("Pair name must not be empty".into()));
            }
            if !names.insert(pair.name.as_str()) {
                return Err(AppError::ConfigError(format!("Duplicate pair name: {}", pair.name)));
            }
            if pair.token_a == pair.token_b {
                return Err(AppError::ConfigError(format!("Pair {} uses the same token twice", pair.name)));
            }
        }

        let s = &self.settings;
        if s.interval_ms == 0 {
            return Err(AppError::ConfigError("interval_ms must be positive".into()));
        }
        if !s.alert_threshold_pct.is_finite() || s.alert_threshold_pct < 0.0 {
            return Err(AppError::ConfigError("alert_threshold_pct must be a non-negative number".into()));
        }
        if s.max_retries == 0 {
            return Err(AppError::ConfigError("max_retries must be at least 1".into()));
        }
        if s.history_capacity == 0 || s.alert_capacity == 0 {
            return Err(AppError::ConfigError("history and alert capacities must be positive".into()));
        }

        Ok(())
    }
}

async fn connect(app_cfg: &AppCfg) -> Result<Arc<UniswapV2Adapter>> {
    let rpc_client = EvmRpcClient::new(&app_cfg.rpc_url)?;

    match rpc_client.chain_id().await {
        Ok(chain_id) => info!("Connected to chain {}", chain_id),
        Err(e) => warn!("Could not query chain id: {}", e),
    }

    let adapter = UniswapV2Adapter::new(rpc_client.provider(), app_cfg.factory_address);
    info!("Reading Uniswap V2 pools from factory {:?}", adapter.factory_address());
    Ok(Arc::new(adapter))
}

/// Run the monitor until Ctrl-C (or `duration`), then print final statistics
pub async fn run_monitor(app_cfg: AppCfg, duration: Option<Duration>, json: bool) -> Result<()> {
    info!("Preparing DEX price monitor");
    info!(
        "Configuration: {} pairs, interval {}ms, threshold {}%",
        app_cfg.pairs.len(),
        app_cfg.settings.interval_ms,
        app_cfg.settings.alert_threshold_pct
    );

    let source = connect(&app_cfg).await?;
    let monitor = PriceMonitor::new(app_cfg.pairs.clone(), app_cfg.settings.clone(), source)?;

    let display = StatusDisplay::default().spawn(&monitor);

    // Listen for Ctrl-C before the first cycle, which may spend a while in retries
    run_until_shutdown(&monitor, duration, tokio::signal::ctrl_c()).await?;

    monitor.stop().await;
    display.abort();

    let stats = monitor.statistics().await;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{}", StatusDisplay::render_statistics(&stats));
    }
    info!("Goodbye!");
    Ok(())
}

/// Start `monitor` and return once `shutdown` resolves or `duration` has
/// elapsed. `shutdown` is raced against the first cycle too.
async fn run_until_shutdown<F>(monitor: &PriceMonitor, duration: Option<Duration>, shutdown: F) -> Result<()>
where
    F: Future<Output = std::io::Result<()>>,
{
    tokio::pin!(shutdown);

    let interrupted = tokio::select! {
        started = monitor.start() => {
            started?;
            false
        }
        _ = &mut shutdown => true,
    };
    if interrupted {
        info!("Interrupted during the first cycle");
        return Ok(());
    }

    match duration {
        Some(duration) => {
            info!("Monitoring for {}s", duration.as_secs());
            tokio::select! {
                _ = tokio::time::sleep(duration) => {}
                _ = &mut shutdown => {}
            }
        }
        None => {
            (&mut shutdown).await.context("listen for Ctrl-C")?;
        }
    }
    Ok(())
}

/// Fetch every pair once and print the prices
pub async fn check_prices(app_cfg: AppCfg, only_pair: Option<&str>) -> Result<()> {
    let pairs: Vec<&PairConfig> = app_cfg
        .pairs
        .iter()
        .filter(|pair| only_pair.map_or(true, |name| pair.name.eq_ignore_ascii_case(name)))
        .collect();
    if pairs.is_empty() {
        return Err(AppError::ConfigError(format!("Unknown pair: {}", only_pair.unwrap_or_default())).into());
    }

    let source = connect(&app_cfg).await?;
    let fetcher = ResilientFetcher::new(
        PriceOracle::new(source),
        app_cfg.settings.max_retries,
        Duration::from_millis(app_cfg.settings.retry_delay_ms),
    );

    info!("Checking {} pair(s), up to {} attempts each", pairs.len(), fetcher.max_retries());

    let mut failures = 0;
    for pair in pairs {
        match fetcher.fetch_price(pair).await {
            Ok(price) => println!("{:<15} ${}", pair.name, format_price(price)),
            Err(e) => {
                failures += 1;
                error!("Error fetching price for {}: {}", pair.name, e);
                println!("{:<15} unavailable", pair.name);
            }
        }
    }

    if failures > 0 {
        warn!("{} pair(s) could not be priced", failures);
    }
    Ok(())
}
