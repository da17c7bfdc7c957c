//! HTTP implementation of [`IngestionLedger`]: queries the ingestion API for
//! filenames already recorded within a time window.

use std::env;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::contract::{ClientError, IngestionLedger};

/// Ledger client over the ingestion service's REST API.
pub struct LedgerClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl LedgerClient {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Build a client from the environment (`LEDGER_API_URL`, optional
    /// `LEDGER_API_KEY`), loading a `.env` file if present.
    pub fn new_from_env() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();
        let base_url = env::var("LEDGER_API_URL")?;
        let api_key = env::var("LEDGER_API_KEY").ok();
        Ok(Self::new(base_url, api_key))
    }
}

#[async_trait]
impl IngestionLedger for LedgerClient {
    async fn ingested_files(
        &self,
        start_iso: &str,
        end_iso: &str,
    ) -> Result<Vec<String>, ClientError> {
        let url = format!("{}/ingested-files", self.base_url);
        debug!(url = %url, start = %start_iso, end = %end_iso, "Querying ingestion ledger");

        let mut request = self
            .http
            .get(&url)
            .query(&[("start_time", start_iso), ("end_time", end_iso)]);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await?;
        let status = response.status();
        // The ledger endpoint may not be deployed yet; treat that as "nothing
        // ingested" rather than failing the whole run.
        if status == StatusCode::NOT_FOUND {
            debug!("Ledger endpoint not found, treating as empty");
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Ledger query failed with {status}: {body}").into());
        }

        let files: Vec<String> = response.json().await?;
        Ok(files)
    }
}
