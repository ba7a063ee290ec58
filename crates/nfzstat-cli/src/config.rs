//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use nfzstat_jgp::FailurePolicy;
use serde::Deserialize;

/// Global configuration for nfzstat
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub output: OutputConfig,
    pub index: IndexConfig,
    pub run: RunConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub delay_ms: u64,
    pub page_limit: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let defaults = nfzstat_jgp::Config::default();
        Self {
            base_url: defaults.base_url,
            timeout_secs: defaults.timeout.as_secs(),
            delay_ms: defaults.delay.as_millis() as u64,
            page_limit: defaults.page_limit,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub benefits: String,
    pub index_of_tables: String,
    pub general_data: String,
    pub hospitalization_by_age: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        let files = nfzstat_jgp::config::OutputFiles::default();
        Self {
            dir: PathBuf::from("."),
            benefits: files.benefits,
            index_of_tables: files.table_index,
            general_data: files.general_data,
            hospitalization_by_age: files.hospitalization_by_age,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub years: Vec<u16>,
    pub catalogs: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        let defaults = nfzstat_jgp::Config::default();
        Self {
            years: defaults.years,
            catalogs: defaults.catalogs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// `skip` or `keep-partial`
    pub failure_policy: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            failure_policy: "skip".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./nfzstat.toml (current directory)
    /// 2. ~/.config/nfzstat/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("nfzstat.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "nfzstat") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Pipeline settings, validated
    pub fn pipeline(&self) -> Result<nfzstat_jgp::Config> {
        let Some(failure_policy) = FailurePolicy::from_name(&self.run.failure_policy) else {
            bail!(
                "Unknown failure_policy '{}' (expected 'skip' or 'keep-partial')",
                self.run.failure_policy
            );
        };
        if self.api.page_limit == 0 {
            bail!("page_limit must be at least 1");
        }
        if self.api.timeout_secs == 0 {
            bail!("timeout_secs must be at least 1");
        }

        Ok(nfzstat_jgp::Config {
            base_url: self.api.base_url.clone(),
            timeout: Duration::from_secs(self.api.timeout_secs),
            delay: Duration::from_millis(self.api.delay_ms),
            page_limit: self.api.page_limit,
            output_dir: self.output.dir.clone(),
            files: nfzstat_jgp::config::OutputFiles {
                benefits: self.output.benefits.clone(),
                table_index: self.output.index_of_tables.clone(),
                general_data: self.output.general_data.clone(),
                hospitalization_by_age: self.output.hospitalization_by_age.clone(),
            },
            years: self.index.years.clone(),
            catalogs: self.index.catalogs.clone(),
            failure_policy,
        })
    }
}
