//! In-memory reserve source and delay used by unit tests

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use ethers::types::Address;

use super::price_feed::ReserveSource;
use super::price_fetcher::RetryDelay;
use crate::shared::errors::PriceError;
use crate::shared::types::PairConfig;

pub(crate) fn weth() -> Address {
    "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2".parse().unwrap()
}

pub(crate) fn usdc() -> Address {
    "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".parse().unwrap()
}

pub(crate) fn usdt() -> Address {
    "0xdAC17F958D2ee523a2206206994597C13D831ec7".parse().unwrap()
}

pub(crate) fn eth_usdc_pair() -> PairConfig {
    PairConfig::new("ETH/USDC", weth(), usdc(), 18, 6)
}

pub(crate) fn usdc_usdt_pair() -> PairConfig {
    PairConfig::new("USDC/USDT", usdc(), usdt(), 6, 6)
}

#[derive(Debug, Clone)]
struct PoolScript {
    address: Address,
    token0: Address,
    token1: Address,
    reserves: (u128, u128),
    failing: bool,
}

impl PoolScript {
    fn holds(&self, a: Address, b: Address) -> bool {
        (self.token0 == a && self.token1 == b) || (self.token0 == b && self.token1 == a)
    }
}

/// Reserve source answering from scripted pools
pub(crate) struct ScriptedReserveSource {
    pools: Mutex<Vec<PoolScript>>,
    transient_failures: AtomicU32,
    lookups: AtomicU32,
}

impl ScriptedReserveSource {
    pub fn new(token0: Address, token1: Address, reserves: (u128, u128)) -> Self {
        let source = Self {
            pools: Mutex::new(Vec::new()),
            transient_failures: AtomicU32::new(0),
            lookups: AtomicU32::new(0),
        };
        source.add_pool(token0, token1, reserves);
        source
    }

    pub fn empty() -> Self {
        Self {
            pools: Mutex::new(Vec::new()),
            transient_failures: AtomicU32::new(0),
            lookups: AtomicU32::new(0),
        }
    }

    pub fn with_pool(self, token0: Address, token1: Address, reserves: (u128, u128)) -> Self {
        self.add_pool(token0, token1, reserves);
        self
    }

    pub fn without_pool(self) -> Self {
        self.pools.lock().unwrap().clear();
        self
    }

    fn add_pool(&self, token0: Address, token1: Address, reserves: (u128, u128)) {
        let mut pools = self.pools.lock().unwrap();
        let address = Address::repeat_byte(pools.len() as u8 + 1);
        pools.push(PoolScript {
            address,
            token0,
            token1,
            reserves,
            failing: false,
        });
    }

    /// Next `count` pool lookups fail with a transport error
    pub fn fail_next(&self, count: u32) {
        self.transient_failures.store(count, Ordering::SeqCst);
    }

    /// Every lookup for the pool of `pair` fails with a transport error
    pub fn break_pool(&self, pair: &PairConfig) {
        let mut pools = self.pools.lock().unwrap();
        for pool in pools.iter_mut().filter(|p| p.holds(pair.token_a, pair.token_b)) {
            pool.failing = true;
        }
    }

    /// Rewrite the pool of `pair` so that it prices at `price`,
    /// keeping the pool's own token order
    pub fn set_price(&self, pair: &PairConfig, price: f64) {
        let base_raw = 10u128.pow(pair.decimals_a as u32);
        let quote_raw = (price * 10f64.powi(pair.decimals_b as i32)).round() as u128;

        let mut pools = self.pools.lock().unwrap();
        for pool in pools.iter_mut().filter(|p| p.holds(pair.token_a, pair.token_b)) {
            pool.reserves = if pool.token0 == pair.token_a {
                (base_raw, quote_raw)
            } else {
                (quote_raw, base_raw)
            };
        }
    }

    pub fn lookups(&self) -> u32 {
        self.lookups.load(Ordering::SeqCst)
    }

    fn pool(&self, address: Address) -> Result<PoolScript, PriceError> {
        self.pools
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.address == address)
            .cloned()
            .ok_or_else(|| PriceError::TransportError(format!("unknown pool {:?}", address)))
    }
}

#[async_trait]
impl ReserveSource for ScriptedReserveSource {
    async fn pair_address(&self, token_a: Address, token_b: Address) -> Result<Address, PriceError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        let pending = self.transient_failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.transient_failures.store(pending - 1, Ordering::SeqCst);
            return Err(PriceError::TransportError("connection reset".into()));
        }

        let pools = self.pools.lock().unwrap();
        match pools.iter().find(|p| p.holds(token_a, token_b)) {
            Some(pool) if pool.failing => Err(PriceError::TransportError("rpc unavailable".into())),
            Some(pool) => Ok(pool.address),
            None => Ok(Address::zero()),
        }
    }

    async fn pool_token_order(&self, pool: Address) -> Result<(Address, Address), PriceError> {
        let pool = self.pool(pool)?;
        Ok((pool.token0, pool.token1))
    }

    async fn reserves(&self, pool: Address) -> Result<(u128, u128), PriceError> {
        Ok(self.pool(pool)?.reserves)
    }
}

/// Retry delay that returns immediately and remembers what it was asked for
#[derive(Default)]
pub(crate) struct RecordingDelay {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingDelay {
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

#[async_trait]
impl RetryDelay for RecordingDelay {
    async fn wait(&self, delay: Duration) {
        self.waits.lock().unwrap().push(delay);
    }
}
