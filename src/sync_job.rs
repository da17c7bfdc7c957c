//! One synchronisation pass: list the remote folder, drop what the ledger
//! already knows, download the rest with per-file retry.
//!
//! Infrastructure failures (the ledger query or the remote listing) propagate
//! to the caller; a download failure is isolated to its file and never aborts
//! the run. The scheduler decides what to do with either outcome.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use tracing::{debug, error, info, warn};

use crate::config::SchedulerConfig;
use crate::contract::{ClientError, IngestionLedger, RemoteDirectory};

/// How far back the ledger window reaches from "now".
const LOOKBACK_HOURS: i64 = 1;

/// Performs exactly one synchronisation pass per [`SyncJob::run`] call.
pub struct SyncJob {
    config: Arc<RwLock<SchedulerConfig>>,
    remote: Arc<dyn RemoteDirectory>,
    ledger: Arc<dyn IngestionLedger>,
}

impl SyncJob {
    pub fn new(
        config: Arc<RwLock<SchedulerConfig>>,
        remote: Arc<dyn RemoteDirectory>,
        ledger: Arc<dyn IngestionLedger>,
    ) -> Self {
        Self {
            config,
            remote,
            ledger,
        }
    }

    /// Run one pass and return the filenames successfully downloaded, in
    /// discovery order.
    ///
    /// Config values are snapshotted up front, so a mutation of the shared
    /// config mid-run does not affect this pass.
    pub async fn run(&self) -> Result<Vec<String>, ClientError> {
        let (folder, ingestion_dir, max_retries, retry_delay) = {
            let config = self.config.read().unwrap();
            (
                config.sharepoint_folder.clone(),
                config.ingestion_dir.clone(),
                config.max_retries,
                config.retry_delay(),
            )
        };

        let end = Utc::now();
        let start = end - ChronoDuration::hours(LOOKBACK_HOURS);
        let start_iso = start.to_rfc3339_opts(SecondsFormat::Secs, true);
        let end_iso = end.to_rfc3339_opts(SecondsFormat::Secs, true);

        let ingested: HashSet<String> = self
            .ledger
            .ingested_files(&start_iso, &end_iso)
            .await?
            .into_iter()
            .collect();
        debug!(
            window_start = %start_iso,
            window_end = %end_iso,
            already_ingested = ingested.len(),
            "Queried ingestion ledger"
        );

        let remote_files = self.remote.list_files(&folder).await?;
        info!(
            folder = %folder,
            remote_files = remote_files.len(),
            "Listed remote folder"
        );

        tokio::fs::create_dir_all(&ingestion_dir).await?;

        let mut downloaded = Vec::new();
        for filename in remote_files {
            if ingested.contains(&filename) {
                debug!(file = %filename, "Already ingested, skipping");
                continue;
            }
            let dest = ingestion_dir.join(&filename);

            // Initial attempt plus up to max_retries retries; a bad file is
            // skipped, never fatal to the run.
            let mut attempt: u32 = 0;
            loop {
                attempt += 1;
                match self.remote.download_file(&folder, &filename, &dest).await {
                    Ok(path) => {
                        info!(file = %filename, path = %path.display(), "Downloaded file");
                        downloaded.push(filename.clone());
                        break;
                    }
                    Err(e) if attempt <= max_retries => {
                        warn!(
                            error = %e,
                            file = %filename,
                            attempt = attempt,
                            max_retries = max_retries,
                            "Download failed, retrying"
                        );
                        if !retry_delay.is_zero() {
                            tokio::time::sleep(retry_delay).await;
                        }
                    }
                    Err(e) => {
                        error!(
                            error = %e,
                            file = %filename,
                            attempts = attempt,
                            "Download failed after exhausting retries, skipping file"
                        );
                        // A failed attempt may have left a partial file behind.
                        if tokio::fs::remove_file(&dest).await.is_ok() {
                            debug!(path = %dest.display(), "Removed partial download");
                        }
                        break;
                    }
                }
            }
        }

        info!(downloaded = downloaded.len(), "Sync pass finished");
        Ok(downloaded)
    }
}
