//! Configuration file handling.

use crate::pipeline::ScanOptions;
use crate::table::{Schema, SchemaResult, DEFAULT_SEPARATOR};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "configs/config.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// The table being scanned
    pub head: HeadConfig,

    /// Field separator
    pub sep: String,

    /// Deadline of one scan cycle, in seconds
    #[serde(rename = "timeout")]
    pub timeout_secs: u64,

    /// Maximum rows evaluated at once (defaults to the number of CPUs)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,

    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HeadConfig {
    /// Path of the delimited file
    pub path: PathBuf,

    /// Column names; when absent they are read from the first line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive such as `info` or `csv_query=debug`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Log file; logs go to stderr when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,

    /// Extra file receiving warnings and errors only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_output_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            head: HeadConfig::default(),
            sep: DEFAULT_SEPARATOR.to_string(),
            timeout_secs: 30,
            workers: None,
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parse config from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        Ok(config)
    }

    /// Check the settings a scan cannot run without
    pub fn validate(&self) -> Result<()> {
        if self.head.path.as_os_str().is_empty() {
            bail!("head.path is not set");
        }
        if self.timeout_secs == 0 {
            bail!("timeout must be at least one second");
        }
        if self.workers == Some(0) {
            bail!("workers must be at least 1");
        }
        Ok(())
    }

    /// Separator with the empty string mapped to the default
    pub fn separator(&self) -> &str {
        if self.sep.is_empty() {
            DEFAULT_SEPARATOR
        } else {
            &self.sep
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Schema built from `head.fields`, if configured
    pub fn schema(&self) -> SchemaResult<Option<Schema>> {
        self.head.fields.as_ref().map(Schema::new).transpose()
    }

    pub fn scan_options(&self) -> ScanOptions {
        let defaults = ScanOptions::default();
        ScanOptions {
            separator: self.separator().to_string(),
            timeout: self.timeout(),
            workers: self.workers.unwrap_or(defaults.workers),
        }
    }
}
