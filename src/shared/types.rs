//! Common types used across the application

use ethers::types::Address;
use serde::{Deserialize, Serialize};

/// Default Uniswap V2 factory on Ethereum mainnet
pub const UNISWAP_V2_FACTORY: &str = "0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f";

/// A monitored token pair. `token_a` is the base, `token_b` the quote:
/// prices are expressed as token_b units per one token_a.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairConfig {
    pub name: String,
    pub token_a: Address,
    pub token_b: Address,
    pub decimals_a: u8,
    pub decimals_b: u8,
}

impl PairConfig {
    pub fn new(
        name: impl Into<String>,
        token_a: Address,
        token_b: Address,
        decimals_a: u8,
        decimals_b: u8,
    ) -> Self {
        Self {
            name: name.into(),
            token_a,
            token_b,
            decimals_a,
            decimals_b,
        }
    }
}

/// Amount representation with precision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amount {
    pub value: u128,
    pub decimals: u8,
}

impl Amount {
    pub fn new(value: u128, decimals: u8) -> Self {
        Self { value, decimals }
    }

    /// Human readable amount (raw value scaled down by 10^decimals)
    pub fn to_ui(&self) -> f64 {
        self.value as f64 / 10_f64.powi(self.decimals as i32)
    }
}

/// Pool reserves already mapped onto the requested base/quote order.
/// Lives only for the duration of one price derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReserveSnapshot {
    pub pool: Address,
    pub base: Amount,
    pub quote: Amount,
}

/// Monitoring engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub interval_ms: u64,
    pub alert_threshold_pct: f64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub history_capacity: usize,
    pub alert_capacity: usize,
    /// Samples that must be retained before a windowed change is attached
    pub window_min_samples: usize,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval_ms: 15_000,
            alert_threshold_pct: 2.0,
            max_retries: 3,
            retry_delay_ms: 2_000,
            history_capacity: 100,
            alert_capacity: 10,
            window_min_samples: 10,
        }
    }
}
