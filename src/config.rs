//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.agestats.toml` files.

use crate::cli::OutputFormat;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".agestats.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote dataset settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Local cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Where the datasets are downloaded from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the dataset API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the case dataset below `base_url`.
    #[serde(default = "default_cases_source")]
    pub cases_file: String,

    /// Path of the recovery dataset below `base_url`.
    #[serde(default = "default_recovered_source")]
    pub recovered_file: String,

    /// Path of the death dataset below `base_url`.
    #[serde(default = "default_deaths_source")]
    pub deaths_file: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            cases_file: default_cases_source(),
            recovered_file: default_recovered_source(),
            deaths_file: default_deaths_source(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://onemocneni-aktualne.mzcr.cz/api/v2/covid-19".to_string()
}

fn default_cases_source() -> String {
    "osoby.min.json".to_string()
}

fn default_recovered_source() -> String {
    "vyleceni.min.json".to_string()
}

fn default_deaths_source() -> String {
    "umrti.min.json".to_string()
}

fn default_timeout() -> u64 {
    300 // the case dataset is large
}

/// Where downloaded datasets are kept between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache directory.
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_cases_cache")]
    pub cases_file: String,

    #[serde(default = "default_recovered_cache")]
    pub recovered_file: String,

    #[serde(default = "default_deaths_cache")]
    pub deaths_file: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            cases_file: default_cases_cache(),
            recovered_file: default_recovered_cache(),
            deaths_file: default_deaths_cache(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_cases_cache() -> String {
    "cases.json".to_string()
}

fn default_recovered_cache() -> String {
    "recovered.json".to_string()
}

fn default_deaths_cache() -> String {
    "deaths.json".to_string()
}

/// Report rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format used when `--format` is not given.
    #[serde(default)]
    pub format: OutputFormat,

    /// Table caption, followed by the long date of the datasets.
    #[serde(default = "default_caption")]
    pub caption: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            caption: default_caption(),
        }
    }
}

fn default_caption() -> String {
    "COVID-19 cases, recoveries and deaths by age and sex".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref base_url) = args.base_url {
            self.source.base_url = base_url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.source.timeout_seconds = timeout;
        }
        if let Some(ref cache_dir) = args.cache_dir {
            self.cache.dir = cache_dir.clone();
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }
    }

    /// Check the merged settings before any dataset is fetched.
    ///
    /// `base_url` may come from the config file, which bypasses the CLI checks.
    pub fn validate(&self) -> Result<()> {
        let base_url = &self.source.base_url;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            bail!(
                "Base URL must start with 'http://' or 'https://': {}",
                base_url
            );
        }

        if self.source.timeout_seconds == 0 {
            bail!("Timeout must be at least 1 second");
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.source.base_url.starts_with("https://"));
        assert_eq!(config.source.cases_file, "osoby.min.json");
        assert_eq!(config.cache.deaths_file, "deaths.json");
        assert_eq!(config.report.format, OutputFormat::Wikitext);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[source]
base_url = "http://localhost:8080/api"
timeout_seconds = 30

[cache]
dir = "/tmp/agestats"

[report]
format = "markdown"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.source.base_url, "http://localhost:8080/api");
        assert_eq!(config.source.timeout_seconds, 30);
        assert_eq!(config.source.deaths_file, "umrti.min.json");
        assert_eq!(config.cache.dir, PathBuf::from("/tmp/agestats"));
        assert_eq!(config.cache.cases_file, "cases.json");
        assert_eq!(config.report.format, OutputFormat::Markdown);
    }

    #[test]
    fn test_merge_with_args_only_overrides_given_flags() {
        let mut config: Config = toml::from_str("[source]\ntimeout_seconds = 30\n").unwrap();
        let args = Args::try_parse_from([
            "agestats",
            "--format",
            "json",
            "--cache-dir",
            "/data",
        ])
        .unwrap();

        config.merge_with_args(&args);

        assert_eq!(config.source.timeout_seconds, 30);
        assert_eq!(config.cache.dir, PathBuf::from("/data"));
        assert_eq!(config.report.format, OutputFormat::Json);
    }

    #[test]
    fn test_validate_default_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_http_base_url() {
        let config: Config =
            toml::from_str("[source]\nbase_url = \"ftp://example.org/api\"\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ftp://example.org/api"));
    }

    #[test]
    fn test_validate_after_merge_with_args() {
        let mut config: Config =
            toml::from_str("[source]\nbase_url = \"file:///srv/data\"\n").unwrap();
        config.merge_with_args(&Args::try_parse_from(["agestats"]).unwrap());
        assert!(config.validate().is_err());

        config.merge_with_args(
            &Args::try_parse_from(["agestats", "--base-url", "https://example.org/api"]).unwrap(),
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config: Config = toml::from_str("[source]\ntimeout_seconds = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[source]"));
        assert!(toml_str.contains("[cache]"));
        assert!(toml_str.contains("[report]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.report.format, OutputFormat::Wikitext);
    }
}
