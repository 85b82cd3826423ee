//! Direct blockchain reading for EVM DEX data

pub mod dex_adapters;
pub mod rpc_client;

pub use dex_adapters::UniswapV2Adapter;
pub use rpc_client::EvmRpcClient;
