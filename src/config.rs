use anyhow::{Context, Result};
use ethers::types::Address;
use serde::Deserialize;
use std::{fs, path::Path};
use tracing::info;

use crate::shared::types::{MonitorSettings, PairConfig, UNISWAP_V2_FACTORY};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RpcCfg {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UniswapCfg {
    pub factory: String,
}

impl Default for UniswapCfg {
    fn default() -> Self {
        Self {
            factory: UNISWAP_V2_FACTORY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PairCfg {
    pub name: String,
    pub token_a: String,
    pub token_b: String,
    pub decimals_a: u8,
    pub decimals_b: u8,
}

impl PairCfg {
    pub fn to_pair_config(&self) -> Result<PairConfig> {
        Ok(PairConfig::new(
            self.name.clone(),
            parse_address(&self.token_a).with_context(|| format!("pair {}: token_a", self.name))?,
            parse_address(&self.token_b).with_context(|| format!("pair {}: token_b", self.name))?,
            self.decimals_a,
            self.decimals_b,
        ))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rpc: RpcCfg,
    pub uniswap: UniswapCfg,
    pub monitor: MonitorSettings,
    pub pairs: Vec<PairCfg>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc: RpcCfg::default(),
            uniswap: UniswapCfg::default(),
            monitor: MonitorSettings::default(),
            pairs: default_pairs(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path.as_ref())
            .with_context(|| format!("read {}", path.as_ref().display()))?;
        Self::parse(&s)
    }

    pub fn parse(s: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(s).context("parse Config.toml")?;
        Ok(cfg)
    }

    /// Read `path` if it exists, otherwise fall back to built-in defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            info!("No config file at {}, using defaults", path.as_ref().display());
            Ok(Self::default())
        }
    }
}

pub fn parse_address(s: &str) -> Result<Address> {
    s.trim()
        .parse::<Address>()
        .map_err(|e| anyhow::anyhow!("invalid address {}: {}", s, e))
}

/// Pairs monitored when the config file names none
pub fn default_pairs() -> Vec<PairCfg> {
    vec![
        PairCfg {
            name: "ETH/USDC".to_string(),
            token_a: "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2".to_string(), // WETH
            token_b: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".to_string(), // USDC
            decimals_a: 18,
            decimals_b: 6,
        },
        PairCfg {
            name: "USDC/USDT".to_string(),
            token_a: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".to_string(), // USDC
            token_b: "0xdAC17F958D2ee523a2206206994597C13D831ec7".to_string(), // USDT
            decimals_a: 6,
            decimals_b: 6,
        },
    ]
}
