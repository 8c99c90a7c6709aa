//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable with tracing directives that override the verbosity flags.
pub const LOG_ENV_VAR: &str = "AGESTATS_LOG";

/// agestats - age and sex breakdown of COVID-19 datasets
///
/// Downloads the case, recovery and death datasets, counts them by age range
/// and sex, and prints the result as a wikitext, Markdown or JSON table.
///
/// Examples:
///   agestats
///   agestats --force-download
///   agestats --format markdown --output stats.md
///   agestats --cache-dir ./data --format json
///   agestats --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Download fresh datasets even if a cached copy exists
    #[arg(short, long)]
    pub force_download: bool,

    /// Directory holding the cached dataset files
    ///
    /// Defaults to the value from .agestats.toml or the current directory.
    #[arg(long, value_name = "DIR", env = "AGESTATS_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Base URL of the dataset API
    #[arg(long, value_name = "URL", env = "AGESTATS_BASE_URL")]
    pub base_url: Option<String>,

    /// Download timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output format (wikitext, markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the report to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .agestats.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only, no progress spinner)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .agestats.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// MediaWiki table (default)
    #[default]
    Wikitext,
    /// Markdown table
    Markdown,
    /// JSON document
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref base_url) = self.base_url {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err("Base URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if let Some(ref cache_dir) = self.cache_dir {
            if cache_dir.exists() && !cache_dir.is_dir() {
                return Err(format!(
                    "Cache path is not a directory: {}",
                    cache_dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Returns the log filter.
    ///
    /// Valid, non-empty `env_directives` (e.g. `agestats=debug,reqwest=warn`)
    /// take precedence over `--verbose`/`--quiet`.
    pub fn log_filter(&self, env_directives: Option<&str>) -> EnvFilter {
        env_directives
            .filter(|directives| !directives.trim().is_empty())
            .and_then(|directives| EnvFilter::try_new(directives).ok())
            .unwrap_or_else(|| EnvFilter::new(self.log_level().to_string().to_lowercase()))
    }
}
