//! Structured logging configuration.

use crate::config::LoggingSettings;
use crate::{Error, Result};
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Env var holding the log filter; `RUST_LOG` is the fallback.
pub const LOG_ENV: &str = "TABPORT_LOG";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(Error::InvalidInput(format!(
                "log format must be 'pretty' or 'json', got '{other}'"
            ))),
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Event filter.
    pub filter: EnvFilter,
    /// Optional log file; stderr when unset.
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Builds the logging configuration from settings and the environment.
    ///
    /// Filter precedence: `TABPORT_LOG`, `RUST_LOG`, the configured filter,
    /// then `tabport=debug` when verbose or `warn` otherwise.
    #[must_use]
    pub fn from_settings(settings: &LoggingSettings, verbose: bool) -> Self {
        let fallback = settings.filter.clone().unwrap_or_else(|| {
            if verbose {
                "tabport=debug".to_string()
            } else {
                "warn".to_string()
            }
        });
        let filter = [LOG_ENV, "RUST_LOG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.trim().is_empty())
            .and_then(|value| EnvFilter::try_new(value).ok())
            .unwrap_or_else(|| EnvFilter::new(fallback));

        Self {
            format: settings.format,
            filter,
            file: settings.file.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_from_settings_keeps_format_and_file() {
        let settings = LoggingSettings {
            format: LogFormat::Json,
            filter: Some("info".to_string()),
            file: Some(PathBuf::from("/tmp/tabport.log")),
        };
        let config = LoggingConfig::from_settings(&settings, false);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.file, Some(PathBuf::from("/tmp/tabport.log")));
    }
}
