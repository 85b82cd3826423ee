//! DEX price monitor - Uniswap V2 pool price sampling and alerting
//! Built with Domain-Driven Design principles

pub mod app;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod application;
pub mod shared;

// Re-export main types for convenience
pub use domain::price::{PriceMonitor, PriceOracle, ResilientFetcher};
pub use infrastructure::blockchain::UniswapV2Adapter;
