use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sharepoint_sync::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    run(cli).await
}
