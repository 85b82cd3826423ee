//! Bounded-retry price fetching

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::price_feed::PriceOracle;
use crate::shared::errors::PriceError;
use crate::shared::types::PairConfig;

/// Pause between failed attempts
#[async_trait]
pub trait RetryDelay: Send + Sync {
    async fn wait(&self, delay: Duration);
}

/// Suspends the current task on the tokio timer
pub struct TokioDelay;

#[async_trait]
impl RetryDelay for TokioDelay {
    async fn wait(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Wraps [`PriceOracle`] with a fixed-delay, bounded retry policy
#[derive(Clone)]
pub struct ResilientFetcher {
    oracle: PriceOracle,
    max_retries: u32,
    retry_delay: Duration,
    delay: Arc<dyn RetryDelay>,
}

impl ResilientFetcher {
    pub fn new(oracle: PriceOracle, max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            oracle,
            max_retries: max_retries.max(1),
            retry_delay,
            delay: Arc::new(TokioDelay),
        }
    }

    pub fn with_delay(mut self, delay: Arc<dyn RetryDelay>) -> Self {
        self.delay = delay;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Fetch the price of `pair`, retrying any failure up to `max_retries`
    /// attempts in total. Exhaustion wraps the last error.
    pub async fn fetch_price(&self, pair: &PairConfig) -> Result<f64, PriceError> {
        let mut attempt = 1;
        loop {
            match self.oracle.get_price(pair).await {
                Ok(price) => return Ok(price),
                Err(err) if attempt >= self.max_retries => {
                    return Err(PriceError::FetchExhausted {
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }
                Err(err) => {
                    warn!(pair = %pair.name, "Retry {}/{}: {}", attempt, self.max_retries, err);
                    self.delay.wait(self.retry_delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
