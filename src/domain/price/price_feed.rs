//! Price derivation from AMM pool reserves

use std::sync::Arc;

use async_trait::async_trait;
use ethers::types::Address;
use tracing::debug;

use crate::shared::errors::PriceError;
use crate::shared::types::{Amount, PairConfig, ReserveSnapshot};

/// On-chain reserve data provider
#[async_trait]
pub trait ReserveSource: Send + Sync {
    /// Pair contract for two tokens, the zero address when no pool exists
    async fn pair_address(&self, token_a: Address, token_b: Address) -> Result<Address, PriceError>;

    /// The pool's own (token0, token1) ordering
    async fn pool_token_order(&self, pool: Address) -> Result<(Address, Address), PriceError>;

    /// Raw (reserve0, reserve1) in the pool's own ordering
    async fn reserves(&self, pool: Address) -> Result<(u128, u128), PriceError>;
}

/// Derives quote-per-base prices from a reserve source
#[derive(Clone)]
pub struct PriceOracle {
    source: Arc<dyn ReserveSource>,
}

impl PriceOracle {
    pub fn new(source: Arc<dyn ReserveSource>) -> Self {
        Self { source }
    }

    /// Current price of `pair.token_b` per one `pair.token_a`
    pub async fn get_price(&self, pair: &PairConfig) -> Result<f64, PriceError> {
        let snapshot = self.fetch_snapshot(pair).await?;
        let price = Self::price_from_snapshot(&snapshot)?;
        debug!(pair = %pair.name, pool = ?snapshot.pool, price, "derived price");
        Ok(price)
    }

    /// Read the pool for `pair` and map its reserves onto base/quote
    pub async fn fetch_snapshot(&self, pair: &PairConfig) -> Result<ReserveSnapshot, PriceError> {
        let pool = self.source.pair_address(pair.token_a, pair.token_b).await?;
        if pool.is_zero() {
            return Err(PriceError::PoolNotFound {
                base: pair.token_a,
                quote: pair.token_b,
            });
        }

        let (pool_token0, _) = self.source.pool_token_order(pool).await?;
        let reserves = self.source.reserves(pool).await?;

        Ok(Self::normalize_reserves(pool, pool_token0, reserves, pair))
    }

    /// Pools keep their tokens sorted by address, which need not match the
    /// configured base/quote order.
    pub fn normalize_reserves(
        pool: Address,
        pool_token0: Address,
        (reserve0, reserve1): (u128, u128),
        pair: &PairConfig,
    ) -> ReserveSnapshot {
        let (base_raw, quote_raw) = if pool_token0 == pair.token_a {
            (reserve0, reserve1)
        } else {
            (reserve1, reserve0)
        };

        ReserveSnapshot {
            pool,
            base: Amount::new(base_raw, pair.decimals_a),
            quote: Amount::new(quote_raw, pair.decimals_b),
        }
    }

    pub fn price_from_snapshot(snapshot: &ReserveSnapshot) -> Result<f64, PriceError> {
        if snapshot.base.value == 0 {
            return Err(PriceError::ComputationError(format!(
                "base reserve is zero in pool {:?}",
                snapshot.pool
            )));
        }

        let price = snapshot.quote.to_ui() / snapshot.base.to_ui();
        if !price.is_finite() {
            return Err(PriceError::ComputationError(format!(
                "non-finite price from pool {:?}",
                snapshot.pool
            )));
        }

        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::testing::{eth_usdc_pair, ScriptedReserveSource};

    const ETH_RAW: u128 = 1_000 * 10u128.pow(18);
    const USDC_RAW: u128 = 2_000_000 * 10u128.pow(6);

    #[tokio::test]
    async fn test_price_when_pool_order_matches() {
        let pair = eth_usdc_pair();
        let source = ScriptedReserveSource::new(pair.token_a, pair.token_b, (ETH_RAW, USDC_RAW));
        let oracle = PriceOracle::new(Arc::new(source));

        let price = oracle.get_price(&pair).await.unwrap();
        assert!((price - 2000.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_price_when_pool_order_is_swapped() {
        let pair = eth_usdc_pair();
        let source = ScriptedReserveSource::new(pair.token_b, pair.token_a, (USDC_RAW, ETH_RAW));
        let oracle = PriceOracle::new(Arc::new(source));

        let price = oracle.get_price(&pair).await.unwrap();
        assert!((price - 2000.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_zero_pair_address_is_pool_not_found() {
        let pair = eth_usdc_pair();
        let source = ScriptedReserveSource::new(pair.token_a, pair.token_b, (ETH_RAW, USDC_RAW))
            .without_pool();
        let oracle = PriceOracle::new(Arc::new(source));

        let err = oracle.get_price(&pair).await.unwrap_err();
        assert_eq!(
            err,
            PriceError::PoolNotFound {
                base: pair.token_a,
                quote: pair.token_b
            }
        );
    }

    #[tokio::test]
    async fn test_transport_errors_propagate_unchanged() {
        let pair = eth_usdc_pair();
        let source = ScriptedReserveSource::new(pair.token_a, pair.token_b, (ETH_RAW, USDC_RAW));
        source.fail_next(1);
        let oracle = PriceOracle::new(Arc::new(source));

        let err = oracle.get_price(&pair).await.unwrap_err();
        assert!(matches!(err, PriceError::TransportError(_)));
    }

    #[test]
    fn test_zero_base_reserve_is_computation_error() {
        let pair = eth_usdc_pair();
        let snapshot =
            PriceOracle::normalize_reserves(Address::repeat_byte(9), pair.token_a, (0, USDC_RAW), &pair);

        let err = PriceOracle::price_from_snapshot(&snapshot).unwrap_err();
        assert!(matches!(err, PriceError::ComputationError(_)));
    }

    #[test]
    fn test_zero_quote_reserve_prices_at_zero() {
        let pair = eth_usdc_pair();
        let snapshot =
            PriceOracle::normalize_reserves(Address::repeat_byte(9), pair.token_a, (ETH_RAW, 0), &pair);

        assert_eq!(PriceOracle::price_from_snapshot(&snapshot).unwrap(), 0.0);
    }

    #[test]
    fn test_normalize_keeps_configured_decimals_when_swapped() {
        let pair = eth_usdc_pair();
        let snapshot =
            PriceOracle::normalize_reserves(Address::repeat_byte(9), pair.token_b, (USDC_RAW, ETH_RAW), &pair);

        assert_eq!(snapshot.base, Amount::new(ETH_RAW, 18));
        assert_eq!(snapshot.quote, Amount::new(USDC_RAW, 6));
    }
}
