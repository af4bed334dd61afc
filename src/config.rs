//! Runtime configuration loaded from an optional YAML file.
//!
//! Every field has a default, so running without `--config` fetches the live
//! sources with the stock endpoints. A minimal override file looks like:
//!
//! ```yaml
//! http:
//!   timeout_secs: 30
//! worldbank:
//!   start_year: 2018
//! freedom:
//!   kind: scrape
//!   url: https://example.org/freedom-scores
//!   identifier_column: Country
//!   value_column: Total Score
//! default_metric: GDP PPP
//! ```

use crate::error::PipelineError;
use crate::models::Metric;
use chrono::{Datelike, Local};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

pub const WORLDBANK_BASE_URL: &str = "https://api.worldbank.org";
pub const GDP_PPP_INDICATOR: &str = "NY.GDP.PCAP.PP.CD";
pub const HERITAGE_URL: &str = "https://www.heritage.org/index/ranking";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub worldbank: WorldBankConfig,
    pub heritage: TableSourceConfig,
    pub freedom: FreedomConfig,
    pub default_metric: Option<Metric>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub max_attempts: usize,
    pub base_delay_ms: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            max_attempts: 3,
            base_delay_ms: 500,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorldBankConfig {
    pub base_url: String,
    pub indicator: String,
    /// First year of the observation window; defaults to ten years back.
    pub start_year: Option<i32>,
    /// Last year of the observation window; defaults to the current year.
    pub end_year: Option<i32>,
}

impl Default for WorldBankConfig {
    fn default() -> Self {
        Self {
            base_url: WORLDBANK_BASE_URL.to_string(),
            indicator: GDP_PPP_INDICATOR.to_string(),
            start_year: None,
            end_year: None,
        }
    }
}

impl WorldBankConfig {
    /// Resolved `(start, end)` year window.
    pub fn date_range(&self) -> (i32, i32) {
        let end = self.end_year.unwrap_or_else(|| Local::now().year());
        let start = self.start_year.unwrap_or(end - 10);
        (start, end)
    }
}

/// Where and how to find a score table on a scraped page.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TableSourceConfig {
    pub url: String,
    pub table_selector: String,
    pub identifier_column: String,
    pub value_column: String,
}

impl Default for TableSourceConfig {
    fn default() -> Self {
        Self {
            url: HERITAGE_URL.to_string(),
            table_selector: "table".to_string(),
            identifier_column: "Country Name".to_string(),
            value_column: "Overall Score".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FreedomConfig {
    /// Use the built-in score table.
    #[default]
    Snapshot,
    /// Scrape a score table from a page.
    Scrape(TableSourceConfig),
}

impl Config {
    /// Load from `path`, or defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, PipelineError> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .map_err(|e| PipelineError::Config(format!("{path}: {e}")))?;
                let config = Self::from_yaml(&raw)?;
                info!(path, "Loaded configuration");
                config
            }
            None => {
                info!("No config file given; using defaults");
                Self::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, PipelineError> {
        // An empty file parses as unit, not as a map.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|e| PipelineError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.http.max_attempts == 0 {
            return Err(PipelineError::Config("http.max_attempts must be at least 1".into()));
        }
        if self.http.timeout_secs == 0 {
            return Err(PipelineError::Config("http.timeout_secs must be at least 1".into()));
        }
        check_url("worldbank.base_url", &self.worldbank.base_url)?;
        check_url("heritage.url", &self.heritage.url)?;
        if let FreedomConfig::Scrape(table) = &self.freedom {
            check_url("freedom.url", &table.url)?;
            if table.url.trim_end_matches('/') == HERITAGE_URL {
                return Err(PipelineError::Config(
                    "freedom.url must name a freedom score page when kind is scrape".into(),
                ));
            }
        }
        let (start, end) = self.worldbank.date_range();
        if start > end {
            return Err(PipelineError::Config(format!(
                "worldbank.start_year ({start}) is after end_year ({end})"
            )));
        }
        Ok(())
    }
}

fn check_url(field: &str, value: &str) -> Result<(), PipelineError> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| PipelineError::Config(format!("{field}: '{value}' is not a valid URL: {e}")))
}
