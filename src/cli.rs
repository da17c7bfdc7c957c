use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::ledger::LedgerClient;
use crate::load_config::load_config;
use crate::remote::GraphClient;
use crate::scheduler::Scheduler;

/// CLI for sharepoint-sync: keep a local ingestion directory fed from a
/// SharePoint folder.
#[derive(Parser)]
#[clap(
    name = "sharepoint-sync",
    version,
    about = "Periodically download new SharePoint files into a local ingestion directory"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the scheduler loop until Ctrl-C, then shut down gracefully
    Run {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Perform a single synchronisation pass and exit
    Once {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run { config } => {
            let scheduler = Arc::new(build_scheduler(config)?);
            scheduler.start();
            println!("Scheduler running, press Ctrl-C to stop...");
            tokio::signal::ctrl_c().await?;
            println!("Shutting down...");
            scheduler.shutdown().await;
            Ok(())
        }
        Commands::Once { config } => {
            let scheduler = build_scheduler(config)?;
            println!("Sync pass starting...");
            match scheduler.run_once().await {
                Ok(started) => {
                    // A single manual pass has nothing to overlap with, but
                    // report the gate's verdict either way.
                    println!("Sync pass finished (started: {started}).");
                    Ok(())
                }
                Err(e) => {
                    eprintln!("[ERROR] Sync pass failed: {e}");
                    Err(anyhow::anyhow!("sync pass failed: {e}"))
                }
            }
        }
    }
}

fn build_scheduler(config_path: PathBuf) -> Result<Scheduler> {
    let config = load_config(config_path)?;
    let remote = GraphClient::new_from_env()
        .map_err(|e| anyhow::anyhow!("failed to build SharePoint client: {e}"))?;
    let ledger = LedgerClient::new_from_env()
        .map_err(|e| anyhow::anyhow!("failed to build ledger client: {e}"))?;
    Ok(Scheduler::new(config, Arc::new(remote), Arc::new(ledger)))
}
