//! Price analysis and calculations

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{AlertDirection, PairState, PriceAlert};
use crate::shared::utils::calculate_percentage_change;

/// Rolling statistics of one pair, derived on demand
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairStatistics {
    pub pair: String,
    pub current: f64,
    pub min: f64,
    pub max: f64,
    pub average: f64,
    /// (max - min) / average * 100
    pub volatility_pct: f64,
    pub data_points: usize,
    pub alerts: usize,
    pub window_change_pct: Option<f64>,
}

/// Analyzes price data and trends
#[derive(Debug, Clone)]
pub struct PriceAnalyzer {
    alert_threshold_pct: f64,
}

impl PriceAnalyzer {
    pub fn new(alert_threshold_pct: f64) -> Self {
        Self { alert_threshold_pct }
    }

    pub fn calculate_price_change(&self, old_price: f64, new_price: f64) -> f64 {
        calculate_percentage_change(old_price, new_price)
    }

    pub fn is_significant_change(&self, change_percentage: f64) -> bool {
        change_percentage.abs() >= self.alert_threshold_pct
    }

    /// Alert for the latest observation of `state`, if its move against the
    /// previous observation reaches the threshold.
    pub fn detect_alert(&self, state: &PairState, timestamp: DateTime<Utc>) -> Option<PriceAlert> {
        if !state.has_baseline() {
            return None;
        }

        let change = self.calculate_price_change(state.previous_price(), state.current_price());
        if !self.is_significant_change(change) {
            return None;
        }

        let direction = if change > 0.0 {
            AlertDirection::Up
        } else {
            AlertDirection::Down
        };

        Some(PriceAlert {
            pair: state.name().to_string(),
            direction,
            magnitude_pct: change.abs(),
            old_price: state.previous_price(),
            new_price: state.current_price(),
            timestamp,
        })
    }

    /// Min/max/mean/volatility over the retained history; `None` when empty
    pub fn statistics(&self, state: &PairState) -> Option<PairStatistics> {
        let history = state.history();
        if history.is_empty() {
            return None;
        }

        let (min, max, sum) = history.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(min, max, sum), sample| (min.min(sample.price), max.max(sample.price), sum + sample.price),
        );
        let average = sum / history.len() as f64;
        let volatility_pct = if average > 0.0 {
            (max - min) / average * 100.0
        } else {
            0.0
        };

        Some(PairStatistics {
            pair: state.name().to_string(),
            current: state.current_price(),
            min,
            max,
            average,
            volatility_pct,
            data_points: history.len(),
            alerts: state.alerts().len(),
            window_change_pct: state.latest_sample().and_then(|s| s.window_change_pct),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::MonitorSettings;

    fn observed(prices: &[f64]) -> PairState {
        let mut state = PairState::new("ETH/USDC", &MonitorSettings::default());
        for price in prices {
            state.record_price(*price, Utc::now());
        }
        state
    }

    #[test]
    fn test_calculate_price_change() {
        let analyzer = PriceAnalyzer::new(2.0);
        assert!((analyzer.calculate_price_change(100.0, 103.0) - 3.0).abs() < 1e-9);
        assert_eq!(analyzer.calculate_price_change(0.0, 103.0), 0.0);
    }

    #[test]
    fn test_alert_fires_above_threshold() {
        let analyzer = PriceAnalyzer::new(2.0);
        let alert = analyzer.detect_alert(&observed(&[100.0, 103.0]), Utc::now()).unwrap();

        assert_eq!(alert.direction, AlertDirection::Up);
        assert!((alert.magnitude_pct - 3.0).abs() < 1e-9);
        assert_eq!(alert.to_string(), "UP 3.00% - ETH/USDC: $103.000000");
    }

    #[test]
    fn test_alert_silent_below_threshold() {
        let analyzer = PriceAnalyzer::new(2.0);
        assert!(analyzer.detect_alert(&observed(&[100.0, 101.5]), Utc::now()).is_none());
    }

    #[test]
    fn test_alert_fires_at_exact_threshold() {
        let analyzer = PriceAnalyzer::new(2.0);
        assert!(analyzer.detect_alert(&observed(&[100.0, 102.0]), Utc::now()).is_some());
    }

    #[test]
    fn test_alert_on_drop_is_down() {
        let analyzer = PriceAnalyzer::new(2.0);
        let alert = analyzer.detect_alert(&observed(&[2000.0, 1900.0]), Utc::now()).unwrap();

        assert_eq!(alert.direction, AlertDirection::Down);
        assert_eq!(alert.to_string(), "DOWN 5.00% - ETH/USDC: $1900.00");
    }

    #[test]
    fn test_no_alert_without_baseline() {
        let analyzer = PriceAnalyzer::new(2.0);
        assert!(analyzer.detect_alert(&observed(&[1_000_000.0]), Utc::now()).is_none());
    }

    #[test]
    fn test_statistics_over_history() {
        let analyzer = PriceAnalyzer::new(2.0);
        let stats = analyzer.statistics(&observed(&[100.0, 105.0, 95.0, 110.0])).unwrap();

        assert_eq!(stats.current, 110.0);
        assert_eq!(stats.min, 95.0);
        assert_eq!(stats.max, 110.0);
        assert!((stats.average - 102.5).abs() < 1e-9);
        assert!((stats.volatility_pct - 14.634146).abs() < 1e-5);
        assert_eq!(stats.data_points, 4);
        assert_eq!(stats.alerts, 0);
        assert_eq!(stats.window_change_pct, None);
    }

    #[test]
    fn test_statistics_absent_for_empty_history() {
        let analyzer = PriceAnalyzer::new(2.0);
        assert!(analyzer.statistics(&observed(&[])).is_none());
    }

    #[test]
    fn test_statistics_all_zero_prices_has_zero_volatility() {
        let analyzer = PriceAnalyzer::new(2.0);
        let stats = analyzer.statistics(&observed(&[0.0, 0.0])).unwrap();
        assert_eq!(stats.volatility_pct, 0.0);
    }
}
