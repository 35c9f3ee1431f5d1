//! Configuration management for optable

use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::fetcher::DEFAULT_MAX_TOTAL_RECORDS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Horizon,
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_kind")]
    pub kind: SourceKind,
    #[serde(default = "default_horizon_url")]
    pub horizon_url: String,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: default_source_kind(),
            horizon_url: default_horizon_url(),
            database_path: default_database_path(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    #[serde(default = "default_max_total_records")]
    pub max_total_records: usize,
    #[serde(default = "default_max_export_pages")]
    pub max_export_pages: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_limit: default_page_limit(),
            max_total_records: default_max_total_records(),
            max_export_pages: default_max_export_pages(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: default_api_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.page_limit == 0 {
            return Err(ConfigError::Invalid(
                "fetch.page_limit must be greater than zero".to_string(),
            ));
        }
        if self.fetch.max_total_records == 0 {
            return Err(ConfigError::Invalid(
                "fetch.max_total_records must be greater than zero".to_string(),
            ));
        }
        if self.source.kind == SourceKind::Horizon && self.source.horizon_url.is_empty() {
            return Err(ConfigError::Invalid(
                "source.horizon_url must be set when source.kind = \"horizon\"".to_string(),
            ));
        }
        if self.source.kind == SourceKind::Sqlite && self.source.database_path.is_empty() {
            return Err(ConfigError::Invalid(
                "source.database_path must be set when source.kind = \"sqlite\"".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse and validate a config document.
pub fn parse_config(config_str: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(config_str)?;
    config.validate()?;
    Ok(config)
}

/// Load `config.toml` from the working directory, falling back to defaults
/// when the file is absent.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from("config.toml")
}

pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(config_str) => parse_config(&config_str),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(source) => Err(ConfigError::Read {
            path: path.display().to_string(),
            source,
        }),
    }
}

fn default_source_kind() -> SourceKind {
    SourceKind::Horizon
}

fn default_horizon_url() -> String {
    "https://horizon.stellar.org".to_string()
}

fn default_database_path() -> String {
    "./data/operations.db".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_page_limit() -> u32 {
    10
}

fn default_max_total_records() -> usize {
    DEFAULT_MAX_TOTAL_RECORDS
}

fn default_max_export_pages() -> usize {
    100
}

fn default_api_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}
