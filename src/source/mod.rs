//! Dataset retrieval.
//!
//! Datasets are either downloaded from the remote API or read from the
//! on-disk cache, then decoded into a [`DatasetBundle`].

pub mod cache;
pub mod downloader;

pub use cache::DatasetCache;
pub use downloader::Downloader;

use crate::config::Config;
use crate::models::{DatasetBundle, DatasetKind};
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

/// Undecoded JSON documents of the three datasets.
#[derive(Debug, Clone)]
pub struct RawDatasets {
    pub cases: String,
    pub recovered: String,
    pub deaths: String,
}

impl RawDatasets {
    pub fn get(&self, kind: DatasetKind) -> &str {
        match kind {
            DatasetKind::Cases => &self.cases,
            DatasetKind::Recovered => &self.recovered,
            DatasetKind::Deaths => &self.deaths,
        }
    }
}

/// Top-level shape of a dataset document.
#[derive(Debug, Deserialize)]
struct DatasetDocument {
    /// Modification time, ISO 8601.
    #[serde(default)]
    modified: Option<String>,
    data: Vec<Value>,
}

/// Parse a dataset modification time.
///
/// Accepts RFC 3339 and naive ISO date-times, the latter taken as UTC.
pub fn parse_modified(value: &str) -> Result<DateTime<FixedOffset>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp);
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .with_context(|| format!("Invalid modification time: {}", value))?;

    Ok(naive.and_utc().fixed_offset())
}

/// Decode the three documents into a bundle of raw records.
pub fn decode_bundle(raw: &RawDatasets) -> Result<DatasetBundle> {
    let decode = |kind: DatasetKind| -> Result<DatasetDocument> {
        serde_json::from_str(raw.get(kind))
            .with_context(|| format!("Failed to parse {} dataset", kind))
    };

    let cases = decode(DatasetKind::Cases)?;
    let recovered = decode(DatasetKind::Recovered)?;
    let deaths = decode(DatasetKind::Deaths)?;

    let modified = cases
        .modified
        .as_deref()
        .context("Cases dataset has no 'modified' timestamp")?;

    Ok(DatasetBundle {
        last_updated: parse_modified(modified)?,
        cases: cases.data,
        recovered: recovered.data,
        deaths: deaths.data,
    })
}

/// Get the dataset bundle, downloading when forced or when the cache is incomplete.
pub async fn obtain_bundle(
    config: &Config,
    force_download: bool,
    show_progress: bool,
) -> Result<DatasetBundle> {
    let cache = DatasetCache::new(config.cache.clone());

    let bundle = if force_download || !cache.is_complete() {
        if !force_download {
            info!(
                "Cached datasets not found in {}, downloading",
                config.cache.dir.display()
            );
        }
        let downloader = Downloader::new(config.source.clone())?;
        let raw = downloader.download_all(show_progress).await?;
        // Decode first so an undecodable download never reaches the cache.
        let bundle = decode_bundle(&raw)?;
        cache.store(&raw)?;
        bundle
    } else {
        info!("Using cached datasets from {}", config.cache.dir.display());
        decode_bundle(&cache.load()?)?
    };

    info!(
        "Loaded {} cases, {} recovered, {} deaths (updated {})",
        bundle.cases.len(),
        bundle.recovered.len(),
        bundle.deaths.len(),
        bundle.last_updated
    );

    Ok(bundle)
}
