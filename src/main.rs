use anyhow::Result;
use clap::Parser;
use dex_price_monitor::application::{Cli, CommandExecutor};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    CommandExecutor::execute(cli).await
}
