//! Price domain - price sampling, history and analysis

mod price_monitor;
mod price_feed;
mod price_fetcher;
mod price_history;
mod price_analyzer;

#[cfg(test)]
pub(crate) mod testing;

pub use price_monitor::PriceMonitor;
pub use price_feed::{PriceOracle, ReserveSource};
pub use price_fetcher::{ResilientFetcher, RetryDelay, TokioDelay};
pub use price_history::{BoundedHistory, PairState};
pub use price_analyzer::{PairStatistics, PriceAnalyzer};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Price data point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSample {
    pub price: f64,
    pub timestamp: DateTime<Utc>,
    /// Change against the oldest retained sample, once enough samples exist
    pub window_change_pct: Option<f64>,
}

impl PriceSample {
    pub fn new(price: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            price,
            timestamp,
            window_change_pct: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertDirection {
    Up,
    Down,
}

impl AlertDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertDirection::Up => "UP",
            AlertDirection::Down => "DOWN",
        }
    }
}

/// Threshold-crossing move between two consecutive observations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceAlert {
    pub pair: String,
    pub direction: AlertDirection,
    /// Absolute change in percent
    pub magnitude_pct: f64,
    pub old_price: f64,
    pub new_price: f64,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for PriceAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.2}% - {}: ${}",
            self.direction.as_str(),
            self.magnitude_pct,
            self.pair,
            crate::shared::utils::format_price(self.new_price)
        )
    }
}

/// Latest observed price of a pair, as shown on the status screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairStatus {
    pub pair: String,
    pub current_price: f64,
    /// Change against the previous observation, 0 without a baseline
    pub change_pct: f64,
}

/// Outcome of one fetch cycle across all pairs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub pairs: Vec<PairStatus>,
    pub failed_pairs: Vec<String>,
    pub recent_alerts: Vec<String>,
    pub statistics: Vec<PairStatistics>,
}

/// Notifications pushed to display/notification consumers
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    AlertRaised(PriceAlert),
    FetchFailed { pair: String, error: String },
    CycleCompleted(CycleReport),
}
