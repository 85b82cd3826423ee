//! DEX-specific reserve readers

pub mod uniswap_v2_adapter;

pub use uniswap_v2_adapter::UniswapV2Adapter;
