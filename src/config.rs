use std::path::PathBuf;
use std::str::FromStr;

use directories::ProjectDirs;
use thiserror::Error;

use crate::domain::entities::query::DEFAULT_PAGE_SIZE;
use crate::logging::LogFormat;

pub const ENV_DB: &str = "FLEETDESK_DB";
pub const ENV_PAGE_SIZE: &str = "FLEETDESK_PAGE_SIZE";
pub const ENV_DEBOUNCE_MS: &str = "FLEETDESK_DEBOUNCE_MS";
pub const ENV_LOG: &str = "FLEETDESK_LOG";
pub const ENV_LOG_FORMAT: &str = "FLEETDESK_LOG_FORMAT";

const DEFAULT_DEBOUNCE_MS: u64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unable to resolve data directory")]
    NoDataDir,
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub page_size: u64,
    pub search_debounce_ms: u64,
    pub log_level: String,
    pub log_format: LogFormat,
}

pub fn project_dirs() -> Result<ProjectDirs, ConfigError> {
    ProjectDirs::from("com", "fleetdesk", "fleetdesk").ok_or(ConfigError::NoDataDir)
}

pub fn default_db_path() -> Result<PathBuf, ConfigError> {
    Ok(project_dirs()?.data_local_dir().join("fleetdesk.sqlite"))
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from defaults overridden by `lookup(key)`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db_path = match lookup(ENV_DB).filter(|value| !value.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_db_path()?,
        };

        Ok(Self {
            db_path,
            page_size: parse_or(&lookup, ENV_PAGE_SIZE, DEFAULT_PAGE_SIZE, |value: &u64| *value > 0)?,
            search_debounce_ms: parse_or(&lookup, ENV_DEBOUNCE_MS, DEFAULT_DEBOUNCE_MS, |_| true)?,
            log_level: lookup(ENV_LOG).unwrap_or_else(|| "info".to_string()),
            log_format: parse_or(&lookup, ENV_LOG_FORMAT, LogFormat::Text, |_| true)?,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
    valid: impl Fn(&T) -> bool,
) -> Result<T, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    raw.trim()
        .parse::<T>()
        .ok()
        .filter(|value| valid(value))
        .ok_or(ConfigError::InvalidValue { key, value: raw })
}
