//! Ethereum JSON-RPC client for direct blockchain reading

use std::sync::Arc;
use std::time::Duration;

use ethers::providers::{Http, Middleware, Provider};

use crate::shared::errors::AppError;

/// Ethereum RPC client wrapper
#[derive(Clone)]
pub struct EvmRpcClient {
    provider: Arc<Provider<Http>>,
}

impl EvmRpcClient {
    /// Create new RPC client
    pub fn new(rpc_url: &str) -> Result<Self, AppError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| AppError::ConfigError(format!("Invalid RPC URL {}: {}", rpc_url, e)))?
            .interval(Duration::from_millis(2000));

        Ok(Self {
            provider: Arc::new(provider),
        })
    }

    pub fn provider(&self) -> Arc<Provider<Http>> {
        Arc::clone(&self.provider)
    }

    /// Get chain id
    pub async fn chain_id(&self) -> Result<u64, AppError> {
        self.provider
            .get_chainid()
            .await
            .map(|id| id.as_u64())
            .map_err(|e| AppError::BlockchainError(format!("Failed to get chain id: {}", e)))
    }
}
