//! Per-pair rolling price history

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use super::PriceSample;
use crate::shared::types::MonitorSettings;
use crate::shared::utils::calculate_percentage_change;

/// Fixed-capacity FIFO buffer; pushing past capacity evicts the oldest item.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedHistory<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedHistory<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `item`, returning the evicted oldest item if any
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn oldest(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn newest(&self) -> Option<&T> {
        self.items.back()
    }

    fn newest_mut(&mut self) -> Option<&mut T> {
        self.items.back_mut()
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }
}

/// Mutable monitoring record of one pair
#[derive(Debug, Clone, PartialEq)]
pub struct PairState {
    name: String,
    current_price: f64,
    /// 0 until a second observation arrives
    previous_price: f64,
    history: BoundedHistory<PriceSample>,
    alerts: BoundedHistory<String>,
    window_min_samples: usize,
}

impl PairState {
    pub fn new(name: impl Into<String>, settings: &MonitorSettings) -> Self {
        Self::with_capacity(
            name,
            settings.history_capacity,
            settings.alert_capacity,
            settings.window_min_samples,
        )
    }

    pub fn with_capacity(
        name: impl Into<String>,
        history_capacity: usize,
        alert_capacity: usize,
        window_min_samples: usize,
    ) -> Self {
        Self {
            name: name.into(),
            current_price: 0.0,
            previous_price: 0.0,
            history: BoundedHistory::new(history_capacity),
            alerts: BoundedHistory::new(alert_capacity),
            window_min_samples,
        }
    }

    /// Apply one observation. Must be called exactly once per fetched price.
    pub fn record_price(&mut self, price: f64, timestamp: DateTime<Utc>) {
        if self.current_price != 0.0 {
            self.previous_price = self.current_price;
        }
        self.current_price = price;

        self.history.push(PriceSample::new(price, timestamp));

        if self.history.len() > self.window_min_samples {
            let oldest = self.history.oldest().map(|s| s.price).unwrap_or_default();
            if oldest > 0.0 {
                let change = calculate_percentage_change(oldest, price);
                if let Some(newest) = self.history.newest_mut() {
                    newest.window_change_pct = Some(change);
                }
            }
        }
    }

    pub fn record_alert(&mut self, message: String) {
        self.alerts.push(message);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current_price(&self) -> f64 {
        self.current_price
    }

    pub fn previous_price(&self) -> f64 {
        self.previous_price
    }

    pub fn has_baseline(&self) -> bool {
        self.previous_price != 0.0
    }

    pub fn history(&self) -> &BoundedHistory<PriceSample> {
        &self.history
    }

    pub fn alerts(&self) -> &BoundedHistory<String> {
        &self.alerts
    }

    pub fn latest_sample(&self) -> Option<&PriceSample> {
        self.history.newest()
    }
}
