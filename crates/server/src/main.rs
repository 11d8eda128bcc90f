//! Entry point for the visit counter server.

use anyhow::Result;
use clap::Parser;
use server::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    server::run(config).await
}
