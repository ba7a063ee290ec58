//! Error types for API fetches and manifest files

use std::path::PathBuf;

/// Error from a single API request or from reading its envelope.
///
/// All variants are recoverable at the unit-of-work level: a stage logs the
/// failure and moves on to the next benefit or table.
#[derive(Debug)]
pub enum FetchError {
    /// Remote did not answer within the request timeout
    Timeout,
    /// Body was not JSON, or an expected key was absent
    MalformedResponse(String),
    /// Transport failure or non-2xx status
    Http {
        status: Option<u16>,
        message: String,
    },
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => f.write_str("request timed out"),
            Self::MalformedResponse(msg) => write!(f, "malformed response: {msg}"),
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
        }
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    /// Classify a reqwest error.
    ///
    /// The URL is stripped so query strings (benefit names) don't end up in
    /// every warning line.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Self::Timeout;
        }
        if e.is_decode() {
            return Self::MalformedResponse(e.without_url().to_string());
        }
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.without_url().to_string(),
        }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

/// Error loading or writing a stage manifest (CSV file).
///
/// Unlike [`FetchError`], these are fatal for the stage: without its input
/// manifest a stage has nothing to iterate.
#[derive(Debug)]
pub enum ManifestError {
    /// Previous stage's output file does not exist
    Missing(PathBuf),
    /// Header row lacks a required column
    MissingColumn { path: PathBuf, column: String },
    Csv(csv::Error),
    Io(std::io::Error),
}

impl std::fmt::Display for ManifestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(path) => write!(
                f,
                "manifest {} not found (run the previous stage first)",
                path.display()
            ),
            Self::MissingColumn { path, column } => {
                write!(f, "manifest {} has no '{column}' column", path.display())
            }
            Self::Csv(e) => write!(f, "CSV: {e}"),
            Self::Io(e) => write!(f, "IO: {e}"),
        }
    }
}

impl std::error::Error for ManifestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Csv(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<csv::Error> for ManifestError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e)
    }
}

impl From<std::io::Error> for ManifestError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
