//! Console rendering of monitor events

use std::fmt::Write;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::domain::price::{CycleReport, MonitorEvent, PairStatistics, PriceMonitor};
use crate::shared::utils::format_price;

const RULE: &str = "───────────────────────────────────────────────────────";
const DOUBLE_RULE: &str = "═══════════════════════════════════════════════════════";

/// Prints the live status screen after every cycle
#[derive(Debug, Clone)]
pub struct StatusDisplay {
    clear_screen: bool,
}

impl Default for StatusDisplay {
    fn default() -> Self {
        Self { clear_screen: true }
    }
}

impl StatusDisplay {
    /// Consume `monitor` events on a background task
    pub fn spawn(self, monitor: &PriceMonitor) -> JoinHandle<()> {
        let mut events = monitor.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(MonitorEvent::CycleCompleted(report)) => {
                        if self.clear_screen {
                            print!("\x1B[2J\x1B[1;1H");
                        }
                        println!("{}", Self::render_status(&report));
                    }
                    Ok(MonitorEvent::AlertRaised(alert)) => println!("\nALERT: {}\n", alert),
                    Ok(MonitorEvent::FetchFailed { pair, error }) => {
                        eprintln!("Error fetching price for {}: {}", pair, error)
                    }
                    Err(RecvError::Lagged(skipped)) => warn!("Status display skipped {} events", skipped),
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    pub fn render_status(report: &CycleReport) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "DEX PRICE MONITOR - LIVE STATUS");
        let _ = writeln!(out, "Last Update: {}\n", report.timestamp.format("%H:%M:%S"));

        for status in &report.pairs {
            let symbol = if status.change_pct > 0.0 {
                '▲'
            } else if status.change_pct < 0.0 {
                '▼'
            } else {
                '▬'
            };
            let _ = writeln!(
                out,
                "{:<15} ${:<12} {} {:.2}%",
                status.pair,
                format_price(status.current_price),
                symbol,
                status.change_pct
            );
        }
        for pair in &report.failed_pairs {
            let _ = writeln!(out, "{:<15} fetch failed", pair);
        }

        let _ = writeln!(out, "\n{}", RULE);
        let _ = writeln!(out, "Recent Alerts:");
        if report.recent_alerts.is_empty() {
            let _ = writeln!(out, "  No alerts yet");
        }
        for alert in &report.recent_alerts {
            let _ = writeln!(out, "  {}", alert);
        }
        let _ = writeln!(out, "{}", DOUBLE_RULE);
        let _ = write!(out, "Press Ctrl+C to stop monitoring");
        out
    }

    pub fn render_statistics(stats: &[PairStatistics]) -> String {
        let mut out = String::from("Final Statistics:\n");
        if stats.is_empty() {
            out.push_str("\n  No prices recorded\n");
        }
        for s in stats {
            let _ = writeln!(out, "\n{}:", s.pair);
            let _ = writeln!(out, "  Current:    ${:.6}", s.current);
            let _ = writeln!(out, "  Min:        ${:.6}", s.min);
            let _ = writeln!(out, "  Max:        ${:.6}", s.max);
            let _ = writeln!(out, "  Average:    ${:.6}", s.average);
            let _ = writeln!(out, "  Volatility: {:.2}%", s.volatility_pct);
            if let Some(change) = s.window_change_pct {
                let _ = writeln!(out, "  Window:     {:+.2}% over {} samples", change, s.data_points);
            }
            let _ = writeln!(out, "  Samples:    {}", s.data_points);
            let _ = writeln!(out, "  Alerts:     {}", s.alerts);
        }
        out
    }
}
