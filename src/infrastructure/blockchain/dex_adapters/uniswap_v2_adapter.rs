use std::sync::Arc;

use async_trait::async_trait;
use ethers::contract::abigen;
use ethers::providers::{Http, Provider};
use ethers::types::Address;

use crate::domain::price::ReserveSource;
use crate::shared::errors::PriceError;

abigen!(
    IUniswapV2Factory,
    r#"[
        function getPair(address tokenA, address tokenB) external view returns (address pair)
    ]"#;

    IUniswapV2Pair,
    r#"[
        function token0() external view returns (address)
        function token1() external view returns (address)
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast)
    ]"#;
);

/// Reads Uniswap V2 style pools (factory `getPair`, pair `getReserves`)
pub struct UniswapV2Adapter {
    provider: Arc<Provider<Http>>,
    factory: IUniswapV2Factory<Provider<Http>>,
}

impl UniswapV2Adapter {
    pub fn new(provider: Arc<Provider<Http>>, factory_address: Address) -> Self {
        let factory = IUniswapV2Factory::new(factory_address, Arc::clone(&provider));
        Self { provider, factory }
    }

    pub fn factory_address(&self) -> Address {
        self.factory.address()
    }

    fn pair(&self, pool: Address) -> IUniswapV2Pair<Provider<Http>> {
        IUniswapV2Pair::new(pool, Arc::clone(&self.provider))
    }
}

fn transport_error(call: &str, err: impl std::fmt::Display) -> PriceError {
    PriceError::TransportError(format!("{} failed: {}", call, err))
}

#[async_trait]
impl ReserveSource for UniswapV2Adapter {
    async fn pair_address(&self, token_a: Address, token_b: Address) -> Result<Address, PriceError> {
        self.factory
            .get_pair(token_a, token_b)
            .call()
            .await
            .map_err(|e| transport_error("getPair", e))
    }

    async fn pool_token_order(&self, pool: Address) -> Result<(Address, Address), PriceError> {
        let pair = self.pair(pool);
        let token0 = pair.token_0().call().await.map_err(|e| transport_error("token0", e))?;
        let token1 = pair.token_1().call().await.map_err(|e| transport_error("token1", e))?;
        Ok((token0, token1))
    }

    async fn reserves(&self, pool: Address) -> Result<(u128, u128), PriceError> {
        let (reserve0, reserve1, _) = self
            .pair(pool)
            .get_reserves()
            .call()
            .await
            .map_err(|e| transport_error("getReserves", e))?;
        Ok((reserve0, reserve1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::UNISWAP_V2_FACTORY;

    #[test]
    fn test_adapter_targets_configured_factory() {
        let provider = Arc::new(Provider::<Http>::try_from("http://localhost:8545").unwrap());
        let factory: Address = UNISWAP_V2_FACTORY.parse().unwrap();

        let adapter = UniswapV2Adapter::new(provider, factory);
        assert_eq!(adapter.factory_address(), factory);
    }

    #[test]
    fn test_transport_error_names_the_call() {
        let err = transport_error("getReserves", "connection refused");
        assert_eq!(
            err,
            PriceError::TransportError("getReserves failed: connection refused".into())
        );
    }
}
