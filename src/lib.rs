#![doc = "sharepoint-sync: scheduled synchronisation of a SharePoint folder into a local ingestion directory."]

//! This crate contains the scheduling and synchronisation logic: a background
//! loop that periodically lists a remote SharePoint folder, filters out files
//! already recorded by the ingestion ledger, and downloads the remainder into
//! a local directory for a downstream consumer to pick up.
//!
//! # Usage
//! Construct a [`scheduler::Scheduler`] from a loaded [`config::SchedulerConfig`]
//! and concrete [`contract::RemoteDirectory`] / [`contract::IngestionLedger`]
//! clients, then `start()` it. The CLI in `main.rs` is a thin wrapper over this.

pub mod cli;
pub mod config;
pub mod contract;
pub mod ledger;
pub mod load_config;
pub mod remote;
pub mod scheduler;
pub mod sync_job;
