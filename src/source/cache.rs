//! On-disk cache of downloaded dataset documents.

use crate::config::CacheConfig;
use crate::models::DatasetKind;
use crate::source::RawDatasets;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// The three cached dataset documents in one directory.
#[derive(Debug, Clone)]
pub struct DatasetCache {
    config: CacheConfig,
}

impl DatasetCache {
    pub fn new(config: CacheConfig) -> Self {
        Self { config }
    }

    /// Path of the cached document for `kind`.
    pub fn path(&self, kind: DatasetKind) -> PathBuf {
        let file = match kind {
            DatasetKind::Cases => &self.config.cases_file,
            DatasetKind::Recovered => &self.config.recovered_file,
            DatasetKind::Deaths => &self.config.deaths_file,
        };
        self.config.dir.join(file)
    }

    /// Whether all three documents are present.
    pub fn is_complete(&self) -> bool {
        DatasetKind::ALL
            .iter()
            .all(|kind| self.path(*kind).is_file())
    }

    /// Read all three documents from the cache.
    pub fn load(&self) -> Result<RawDatasets> {
        let read = |kind: DatasetKind| -> Result<String> {
            let path = self.path(kind);
            debug!("Reading cached {} dataset from {}", kind, path.display());
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read cached dataset: {}", path.display()))
        };

        Ok(RawDatasets {
            cases: read(DatasetKind::Cases)?,
            recovered: read(DatasetKind::Recovered)?,
            deaths: read(DatasetKind::Deaths)?,
        })
    }

    /// Write all three documents to the cache, creating the directory if needed.
    ///
    /// Every document is written to a temporary file in the cache directory
    /// first. The cached files are only replaced once all three writes
    /// succeeded, so a failed store leaves the previous documents in place.
    pub fn store(&self, datasets: &RawDatasets) -> Result<()> {
        std::fs::create_dir_all(&self.config.dir).with_context(|| {
            format!(
                "Failed to create cache directory: {}",
                self.config.dir.display()
            )
        })?;

        let mut staged = Vec::with_capacity(DatasetKind::ALL.len());
        for kind in DatasetKind::ALL {
            let mut file = NamedTempFile::new_in(&self.config.dir).with_context(|| {
                format!(
                    "Failed to create temporary file in {}",
                    self.config.dir.display()
                )
            })?;
            file.write_all(datasets.get(kind).as_bytes())
                .and_then(|_| file.as_file().sync_all())
                .with_context(|| format!("Failed to write {} dataset to cache", kind))?;
            staged.push((kind, file));
        }

        for (kind, file) in staged {
            let path = self.path(kind);
            file.persist(&path)
                .map_err(|e| e.error)
                .with_context(|| format!("Failed to write cached dataset: {}", path.display()))?;
        }

        info!("Cached datasets in {}", self.config.dir.display());
        Ok(())
    }
}
