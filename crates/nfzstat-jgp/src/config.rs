//! JGP pipeline configuration

use std::path::PathBuf;
use std::time::Duration;

use nfzstat_core::pager::DEFAULT_LIMIT;
use nfzstat_core::rate_limit::DEFAULT_DELAY;

/// Public JGP statistics API
pub const DEFAULT_BASE_URL: &str = "https://api.nfz.gov.pl/app-stat-api-jgp/";

/// Years the table index is queried for
pub const DEFAULT_YEARS: [u16; 2] = [2019, 2020];

/// JGP catalogs the table index is queried for
pub const DEFAULT_CATALOGS: [&str; 5] = ["1a", "1b", "1c", "1d", "1w"];

/// What a unit of work contributes when one of its requests fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Nothing: the unit is skipped for this run
    #[default]
    Skip,
    /// Rows from pages fetched before the failure
    KeepPartial,
}

impl FailurePolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "skip" => Some(Self::Skip),
            "keep-partial" => Some(Self::KeepPartial),
            _ => None,
        }
    }
}

/// Output file names, all relative to [`Config::output_dir`]
#[derive(Debug, Clone)]
pub struct OutputFiles {
    pub benefits: String,
    pub table_index: String,
    pub general_data: String,
    pub hospitalization_by_age: String,
}

impl Default for OutputFiles {
    fn default() -> Self {
        Self {
            benefits: "benefits_data.csv".to_string(),
            table_index: "index_of_tables_data.csv".to_string(),
            general_data: "general-data.csv".to_string(),
            hospitalization_by_age: "hospitalization-by-age.csv".to_string(),
        }
    }
}

/// Runtime configuration for the four stages
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    /// Bound on each HTTP request
    pub timeout: Duration,
    /// Pause after each request
    pub delay: Duration,
    /// Page size for paginated endpoints
    pub page_limit: u64,
    /// Directory holding every manifest and output file
    pub output_dir: PathBuf,
    pub files: OutputFiles,
    pub years: Vec<u16>,
    pub catalogs: Vec<String>,
    pub failure_policy: FailurePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: nfzstat_core::client::DEFAULT_TIMEOUT,
            delay: DEFAULT_DELAY,
            page_limit: DEFAULT_LIMIT,
            output_dir: PathBuf::from("."),
            files: OutputFiles::default(),
            years: DEFAULT_YEARS.to_vec(),
            catalogs: DEFAULT_CATALOGS.iter().map(|c| c.to_string()).collect(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl Config {
    pub fn benefits_path(&self) -> PathBuf {
        self.output_dir.join(&self.files.benefits)
    }

    pub fn table_index_path(&self) -> PathBuf {
        self.output_dir.join(&self.files.table_index)
    }

    pub fn general_data_path(&self) -> PathBuf {
        self.output_dir.join(&self.files.general_data)
    }

    pub fn hospitalization_by_age_path(&self) -> PathBuf {
        self.output_dir.join(&self.files.hospitalization_by_age)
    }
}
