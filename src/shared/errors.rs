//! Error handling for the application

use ethers::types::Address;
use thiserror::Error;

/// Price-related errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PriceError {
    #[error("No pool found for {base:?}/{quote:?}")]
    PoolNotFound { base: Address, quote: Address },

    #[error("Price calculation failed: {0}")]
    ComputationError(String),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Price fetch failed after {attempts} attempts: {source}")]
    FetchExhausted {
        attempts: u32,
        #[source]
        source: Box<PriceError>,
    },
}

impl PriceError {
    /// Innermost error once retry wrapping is peeled off
    pub fn root_cause(&self) -> &PriceError {
        match self {
            PriceError::FetchExhausted { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub fn is_pool_not_found(&self) -> bool {
        matches!(self.root_cause(), PriceError::PoolNotFound { .. })
    }
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Blockchain error: {0}")]
    BlockchainError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<PriceError> for AppError {
    fn from(err: PriceError) -> Self {
        match err {
            PriceError::TransportError(msg) => AppError::BlockchainError(msg),
            other => AppError::Unknown(other.to_string()),
        }
    }
}
