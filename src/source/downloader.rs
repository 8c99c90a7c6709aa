//! Dataset download over HTTP.
//!
//! This module fetches the three dataset documents from the remote API
//! using reqwest.

use crate::config::SourceConfig;
use crate::models::DatasetKind;
use crate::source::RawDatasets;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, info};

/// Downloads dataset documents from the configured API.
pub struct Downloader {
    config: SourceConfig,
    http_client: reqwest::Client,
}

impl Downloader {
    /// Create a downloader for the given source settings.
    pub fn new(config: SourceConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("agestats/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// URL of one dataset document.
    pub fn dataset_url(&self, kind: DatasetKind) -> String {
        let file = match kind {
            DatasetKind::Cases => &self.config.cases_file,
            DatasetKind::Recovered => &self.config.recovered_file,
            DatasetKind::Deaths => &self.config.deaths_file,
        };
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), file)
    }

    /// Download all three documents concurrently.
    pub async fn download_all(&self, show_progress: bool) -> Result<RawDatasets> {
        let spinner = if show_progress {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .context("Invalid progress template")?,
            );
            pb.set_message("Downloading datasets...");
            pb.enable_steady_tick(Duration::from_millis(120));
            Some(pb)
        } else {
            None
        };

        let result = futures::try_join!(
            self.download(DatasetKind::Cases),
            self.download(DatasetKind::Recovered),
            self.download(DatasetKind::Deaths),
        );

        if let Some(pb) = spinner {
            match &result {
                Ok(_) => pb.finish_with_message("Download complete"),
                Err(_) => pb.abandon_with_message("Download failed"),
            }
        }

        let (cases, recovered, deaths) = result?;
        Ok(RawDatasets {
            cases,
            recovered,
            deaths,
        })
    }

    /// Download a single document and return its body.
    async fn download(&self, kind: DatasetKind) -> Result<String> {
        let url = self.dataset_url(kind);
        info!("Downloading {} dataset from {}", kind, url);

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                anyhow::anyhow!(
                    "Downloading {} timed out after {}s",
                    kind,
                    self.config.timeout_seconds
                )
            } else if e.is_connect() {
                anyhow::anyhow!("Cannot connect to {}", self.config.base_url)
            } else {
                anyhow::anyhow!("Failed to download {} dataset: {}", kind, e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(anyhow::anyhow!(
                "Server returned {} for {} dataset ({})",
                status,
                kind,
                url
            ));
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read {} dataset body", kind))?;

        debug!("Downloaded {} dataset: {} bytes", kind, body.len());
        Ok(body)
    }
}
