//! SharePoint implementation of [`RemoteDirectory`] over the Microsoft Graph
//! drive API. Pure request/response mapping; retry and filtering policy live
//! in the sync job.

use std::env;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::contract::{ClientError, RemoteDirectory};

const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Microsoft Graph client for a single SharePoint drive.
pub struct GraphClient {
    http: Client,
    base_url: String,
    drive_id: String,
    access_token: String,
}

impl GraphClient {
    pub fn new(base_url: String, drive_id: String, access_token: String) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            drive_id,
            access_token,
        }
    }

    /// Build a client from the environment (`SHAREPOINT_DRIVE_ID`,
    /// `SHAREPOINT_ACCESS_TOKEN`, optional `GRAPH_BASE_URL`), loading a
    /// `.env` file if present.
    pub fn new_from_env() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();
        let drive_id = env::var("SHAREPOINT_DRIVE_ID")?;
        let access_token = env::var("SHAREPOINT_ACCESS_TOKEN")?;
        let base_url =
            env::var("GRAPH_BASE_URL").unwrap_or_else(|_| DEFAULT_GRAPH_BASE_URL.to_string());
        Ok(Self::new(base_url, drive_id, access_token))
    }

    fn folder_url(&self, folder: &str, suffix: &str) -> String {
        let folder = folder.trim_matches('/');
        format!(
            "{}/drives/{}/root:/{}{}",
            self.base_url, self.drive_id, folder, suffix
        )
    }
}

#[async_trait]
impl RemoteDirectory for GraphClient {
    async fn list_files(&self, folder: &str) -> Result<Vec<String>, ClientError> {
        let url = self.folder_url(folder, ":/children");
        debug!(url = %url, "Listing SharePoint folder");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Graph list request failed with {status}: {body}").into());
        }

        let json: serde_json::Value = response.json().await?;
        let names = json
            .get("value")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    // Folders carry a "folder" facet; only plain files are listed.
                    .filter(|item| item.get("folder").is_none())
                    .filter_map(|item| item.get("name").and_then(|n| n.as_str()))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(names)
    }

    async fn download_file(
        &self,
        folder: &str,
        filename: &str,
        dest: &Path,
    ) -> Result<PathBuf, ClientError> {
        let folder = folder.trim_matches('/');
        let url = self.folder_url(&format!("{folder}/{filename}"), ":/content");
        debug!(url = %url, dest = %dest.display(), "Downloading SharePoint file");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("Graph download of {filename} failed with {status}").into());
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = response.bytes().await?;
        tokio::fs::write(dest, &bytes).await?;
        info!(file = %filename, bytes = bytes.len(), path = %dest.display(), "Wrote downloaded file");
        Ok(dest.to_path_buf())
    }
}
