use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://export.arxiv.org/oai2";
pub const DEFAULT_SET: &str = "physics:astro-ph";
pub const DEFAULT_METADATA_PREFIX: &str = "arXivRaw";
pub const DEFAULT_BASE_PATH: &str = "arXiv_oai/reclist";
pub const DEFAULT_PAGE_PADDING: usize = 4;
/// Resumption tokens sit at the end of a page; scanning the tail avoids
/// parsing multi-megabyte bodies just for pagination metadata.
pub const DEFAULT_TAIL_WINDOW: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid base url {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("metadata prefix must not be empty")]
    EmptyMetadataPrefix,
    #[error("base path must name a file prefix, got {0:?}")]
    InvalidBasePath(PathBuf),
    #[error("invalid datestamp {0:?}: expected YYYY-MM-DD or an ISO-8601 datetime")]
    InvalidDatestamp(String),
}

/// Immutable per-session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub base_url: String,
    /// Record set specifier; `None` harvests the whole repository.
    pub set: Option<String>,
    pub metadata_prefix: String,
    /// Lower datestamp bound sent as `from`.
    pub from: Option<String>,
    /// Directory plus filename prefix for page files, e.g. `arXiv_oai/reclist`.
    pub base_path: PathBuf,
    /// Zero-padding width of the page number in filenames; 0 disables padding.
    pub page_padding: usize,
    /// Number of trailing bytes searched for the resumption token; `None`
    /// always parses the whole body.
    pub tail_window: Option<usize>,
    /// Parse the whole body when the tail window holds no token.
    pub full_parse_fallback: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            set: Some(DEFAULT_SET.to_string()),
            metadata_prefix: DEFAULT_METADATA_PREFIX.to_string(),
            from: None,
            base_path: PathBuf::from(DEFAULT_BASE_PATH),
            page_padding: DEFAULT_PAGE_PADDING,
            tail_window: Some(DEFAULT_TAIL_WINDOW),
            full_parse_fallback: true,
        }
    }
}

impl HarvestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.base_url).map_err(|err| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: err.to_string(),
        })?;
        if self.metadata_prefix.trim().is_empty() {
            return Err(ConfigError::EmptyMetadataPrefix);
        }
        if self.base_path.file_name().is_none() {
            return Err(ConfigError::InvalidBasePath(self.base_path.clone()));
        }
        if let Some(from) = self.from.as_deref() {
            parse_datestamp(from)?;
        }
        Ok(())
    }
}

/// The query parameters a session actually sends. Starts as a copy of the
/// configuration and may be overridden by incremental setup or the date
/// fallback, leaving the configuration untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestQuery {
    pub set: Option<String>,
    pub metadata_prefix: String,
    pub from: Option<String>,
}

impl HarvestQuery {
    pub fn from_config(config: &HarvestConfig) -> Self {
        Self {
            set: config.set.clone(),
            metadata_prefix: config.metadata_prefix.clone(),
            from: config.from.clone(),
        }
    }

    /// Cuts a datetime `from` down to its date part. Returns the old and new
    /// values when anything changed.
    pub fn truncate_from_to_date(&mut self) -> Option<(String, String)> {
        let current = self.from.as_deref()?;
        let truncated = date_only(current);
        if truncated == current {
            return None;
        }
        let truncated = truncated.to_string();
        let previous = self.from.replace(truncated.clone())?;
        Some((previous, truncated))
    }
}

/// OAI-PMH datestamp granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Datestamp {
    Day(NaiveDate),
    Seconds(NaiveDateTime),
}

pub fn parse_datestamp(value: &str) -> Result<Datestamp, ConfigError> {
    let value = value.trim();
    if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(Datestamp::Day(day));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(Datestamp::Seconds(dt.naive_utc()));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .map(Datestamp::Seconds)
        .map_err(|_| ConfigError::InvalidDatestamp(value.to_string()))
}

/// Date part of an ISO-8601 date or datetime.
pub fn date_only(value: &str) -> &str {
    value.split('T').next().unwrap_or(value)
}
