//! Periodic price monitoring across configured pairs

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::sync::{broadcast, watch, Mutex, MutexGuard, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::{
    CycleReport, MonitorEvent, PairState, PairStatistics, PairStatus, PriceAlert, PriceAnalyzer,
    PriceOracle, ReserveSource, ResilientFetcher,
};
use crate::shared::errors::{AppError, PriceError};
use crate::shared::types::{MonitorSettings, PairConfig};
use crate::shared::utils::calculate_percentage_change;

const EVENT_CHANNEL_CAPACITY: usize = 256;
const RECENT_ALERTS_PER_PAIR: usize = 3;

/// Monitors pool prices of every configured pair on a fixed interval.
///
/// Cloning is cheap; all clones drive the same engine.
#[derive(Clone)]
pub struct PriceMonitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    pairs: Vec<PairConfig>,
    settings: MonitorSettings,
    fetcher: ResilientFetcher,
    analyzer: PriceAnalyzer,
    states: RwLock<HashMap<String, PairState>>,
    running: AtomicBool,
    cycle_gate: Mutex<()>,
    cycles: AtomicU64,
    events: broadcast::Sender<MonitorEvent>,
    timer: Mutex<Option<Timer>>,
}

struct Timer {
    stop: watch::Sender<bool>,
    _task: JoinHandle<()>,
}

impl PriceMonitor {
    pub fn new(
        pairs: Vec<PairConfig>,
        settings: MonitorSettings,
        source: Arc<dyn ReserveSource>,
    ) -> Result<Self, AppError> {
        let fetcher = ResilientFetcher::new(
            PriceOracle::new(source),
            settings.max_retries,
            Duration::from_millis(settings.retry_delay_ms),
        );
        Self::with_fetcher(pairs, settings, fetcher)
    }

    pub fn with_fetcher(
        pairs: Vec<PairConfig>,
        settings: MonitorSettings,
        fetcher: ResilientFetcher,
    ) -> Result<Self, AppError> {
        let mut seen = HashSet::new();
        for pair in &pairs {
            if !seen.insert(pair.name.as_str()) {
                return Err(AppError::ConfigError(format!("Duplicate pair name: {}", pair.name)));
            }
        }

        let states = pairs
            .iter()
            .map(|pair| (pair.name.clone(), PairState::new(pair.name.clone(), &settings)))
            .collect();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            inner: Arc::new(MonitorInner {
                analyzer: PriceAnalyzer::new(settings.alert_threshold_pct),
                pairs,
                settings,
                fetcher,
                states: RwLock::new(states),
                running: AtomicBool::new(false),
                cycle_gate: Mutex::new(()),
                cycles: AtomicU64::new(0),
                events,
                timer: Mutex::new(None),
            }),
        })
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Receiver for alert, failure and cycle-completed notifications
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.inner.events.subscribe()
    }

    /// Run one cycle immediately, then keep cycling every `interval_ms`.
    /// Starting an already running monitor does nothing.
    ///
    /// A cycle left over from a previous run is waited for, so the immediate
    /// cycle always happens.
    pub async fn start(&self) -> Result<(), AppError> {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            debug!("Price monitor already running");
            return Ok(());
        }

        info!("Starting DEX price monitor");
        info!("   Pairs: {}", self.inner.pairs.len());
        info!("   Check interval: {}s", self.inner.settings.interval_ms as f64 / 1000.0);
        info!("   Alert threshold: {}%", self.inner.settings.alert_threshold_pct);

        let gate = self.inner.cycle_gate.lock().await;
        self.execute_cycle(gate).await;

        let mut timer = self.inner.timer.lock().await;
        if !self.is_running() {
            debug!("Price monitor stopped during its first cycle");
            return Ok(());
        }
        if let Some(previous) = timer.take() {
            let _ = previous.stop.send(true);
        }

        let period = Duration::from_millis(self.inner.settings.interval_ms.max(1));
        let (stop, mut stopped) = watch::channel(false);
        let monitor = self.clone();
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => monitor.tick().await,
                    _ = stopped.changed() => break,
                }
            }
            debug!("Price monitor timer disarmed");
        });

        *timer = Some(Timer { stop, _task: task });
        Ok(())
    }

    /// Disarm the timer. A cycle already underway runs to completion.
    pub async fn stop(&self) {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            return;
        }

        info!("Stopping price monitor...");
        let mut timer = self.inner.timer.lock().await;
        if let Some(timer) = timer.take() {
            let _ = timer.stop.send(true);
        }
    }

    async fn tick(&self) {
        if !self.is_running() {
            return;
        }
        self.run_cycle().await;
    }

    /// Fetch every pair once and apply the results.
    ///
    /// Returns `None` without doing anything when another cycle is still in
    /// progress.
    pub async fn run_cycle(&self) -> Option<CycleReport> {
        let Ok(gate) = self.inner.cycle_gate.try_lock() else {
            debug!("Previous cycle still in progress, skipping tick");
            return None;
        };
        Some(self.execute_cycle(gate).await)
    }

    /// Body of a cycle; `_gate` keeps other cycles out until it returns
    async fn execute_cycle(&self, _gate: MutexGuard<'_, ()>) -> CycleReport {
        let sequence = self.inner.cycles.fetch_add(1, Ordering::SeqCst) + 1;
        let timestamp = Utc::now();

        let fetches = self
            .inner
            .pairs
            .iter()
            .map(|pair| self.inner.fetcher.fetch_price(pair));
        let results = join_all(fetches).await;

        let mut failed_pairs = Vec::new();
        for (pair, result) in self.inner.pairs.iter().zip(results) {
            match result {
                Ok(price) => {
                    if let Some(alert) = self.apply_observation(pair, price, timestamp).await {
                        warn!("ALERT: {}", alert);
                        let _ = self.inner.events.send(MonitorEvent::AlertRaised(alert));
                    }
                }
                Err(err) => {
                    Self::report_failure(pair, &err);
                    failed_pairs.push(pair.name.clone());
                    let _ = self.inner.events.send(MonitorEvent::FetchFailed {
                        pair: pair.name.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        let report = self.build_report(sequence, timestamp, failed_pairs).await;
        debug!(
            sequence,
            failed = report.failed_pairs.len(),
            "Cycle completed"
        );
        let _ = self.inner.events.send(MonitorEvent::CycleCompleted(report.clone()));
        report
    }

    /// Update the pair's state and evaluate the alert under one write lock
    async fn apply_observation(
        &self,
        pair: &PairConfig,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> Option<PriceAlert> {
        let mut states = self.inner.states.write().await;
        let state = states.get_mut(&pair.name)?;

        state.record_price(price, timestamp);
        let alert = self.inner.analyzer.detect_alert(state, timestamp)?;
        state.record_alert(alert.to_string());
        Some(alert)
    }

    fn report_failure(pair: &PairConfig, err: &PriceError) {
        if err.is_pool_not_found() {
            error!(pair = %pair.name, "No liquidity pool for configured pair: {}", err);
        } else {
            error!(pair = %pair.name, "Error fetching price: {}", err);
        }
    }

    async fn build_report(
        &self,
        sequence: u64,
        timestamp: DateTime<Utc>,
        failed_pairs: Vec<String>,
    ) -> CycleReport {
        let states = self.inner.states.read().await;
        let mut pairs = Vec::new();
        let mut recent_alerts = Vec::new();
        let mut statistics = Vec::new();

        for pair in &self.inner.pairs {
            let Some(state) = states.get(&pair.name) else {
                continue;
            };

            if state.current_price() != 0.0 {
                pairs.push(PairStatus {
                    pair: pair.name.clone(),
                    current_price: state.current_price(),
                    change_pct: calculate_percentage_change(state.previous_price(), state.current_price()),
                });
            }

            let alerts = state.alerts();
            recent_alerts.extend(
                alerts
                    .iter()
                    .skip(alerts.len().saturating_sub(RECENT_ALERTS_PER_PAIR))
                    .cloned(),
            );

            statistics.extend(self.inner.analyzer.statistics(state));
        }

        CycleReport {
            sequence,
            timestamp,
            pairs,
            failed_pairs,
            recent_alerts,
            statistics,
        }
    }

    /// Statistics for every pair with at least one sample, in configuration order
    pub async fn statistics(&self) -> Vec<PairStatistics> {
        let states = self.inner.states.read().await;
        self.inner
            .pairs
            .iter()
            .filter_map(|pair| states.get(&pair.name))
            .filter_map(|state| self.inner.analyzer.statistics(state))
            .collect()
    }

    /// Snapshot of a single pair's state
    pub async fn pair_state(&self, name: &str) -> Option<PairState> {
        self.inner.states.read().await.get(name).cloned()
    }

    /// Alert messages of every pair, oldest first per pair
    pub async fn alerts(&self) -> Vec<String> {
        let states = self.inner.states.read().await;
        self.inner
            .pairs
            .iter()
            .filter_map(|pair| states.get(&pair.name))
            .flat_map(|state| state.alerts().iter().cloned())
            .collect()
    }
}
