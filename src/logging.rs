use std::str::FromStr;

use thiserror::Error;
use tracing::Subscriber;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("invalid log format: {0} (expected: text|json)")]
    InvalidFormat(String),
    #[error("invalid log level: {0}")]
    InvalidLevel(String),
    #[error("logger has been already initialized")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(LoggerError::InvalidFormat(s.to_string())),
        }
    }
}

pub fn init(level: &str, format: LogFormat) -> Result<(), LoggerError> {
    let filter = EnvFilter::try_new(level).map_err(|_| LoggerError::InvalidLevel(level.to_string()))?;
    match format {
        LogFormat::Text => init_with(
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true)),
        ),
        LogFormat::Json => init_with(
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_ansi(false).with_target(true)),
        ),
    }
}

fn init_with<S>(subscriber: S) -> Result<(), LoggerError>
where
    S: Subscriber + Send + Sync + 'static,
{
    subscriber
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)
}
