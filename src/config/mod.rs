//! Configuration management.
//!
//! Settings come from an optional TOML file merged over built-in defaults:
//!
//! ```toml
//! compression = ["gz", "zip", "tar", "tgz"]
//!
//! [http]
//! timeout_secs = 30
//! user_agent = "tabport"
//!
//! [logging]
//! format = "pretty"   # or "json"
//! filter = "tabport=debug"
//! file = "/tmp/tabport.log"
//!
//! [defaults]
//! na = ["", "NA"]
//! ```

use crate::io::{Compression, ExtensionResolver};
use crate::observability::LogFormat;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "TABPORT_CONFIG_PATH";

/// Main configuration for tabport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabportConfig {
    /// Compression wrappers recognized in file names.
    pub compression: Vec<Compression>,
    /// HTTP client settings for remote sources.
    pub http: HttpConfig,
    /// Logging settings for the binary.
    pub logging: LoggingSettings,
    /// Defaults passed to handlers when the caller sets none.
    pub defaults: HandlerDefaults,
}

/// HTTP client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Request timeout in seconds (0 disables the timeout).
    pub timeout_secs: u64,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("tabport/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Output format.
    pub format: LogFormat,
    /// Filter directive, used when no env filter is set.
    pub filter: Option<String>,
    /// Optional log file; stderr when unset.
    pub file: Option<PathBuf>,
}

/// Handler defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerDefaults {
    /// Missing-value markers for text formats.
    pub na: Vec<String>,
}

impl Default for HandlerDefaults {
    fn default() -> Self {
        Self {
            na: crate::io::formats::DEFAULT_NA
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Compression suffixes.
    pub compression: Option<Vec<String>>,
    /// HTTP section.
    pub http: Option<ConfigFileHttp>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
    /// Defaults section.
    pub defaults: Option<ConfigFileDefaults>,
}

/// HTTP section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileHttp {
    /// Timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// User agent.
    pub user_agent: Option<String>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLogging {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Filter directive.
    pub filter: Option<String>,
    /// Log file path.
    pub file: Option<String>,
}

/// Defaults section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileDefaults {
    /// Missing-value markers.
    pub na: Option<Vec<String>>,
}

impl Default for TabportConfig {
    fn default() -> Self {
        Self {
            compression: Compression::ALL.to_vec(),
            http: HttpConfig::default(),
            logging: LoggingSettings::default(),
            defaults: HandlerDefaults::default(),
        }
    }
}

impl TabportConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or names an
    /// unknown compression suffix or log format.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;
        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid configuration.
    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;
        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. `$TABPORT_CONFIG_PATH`, if set
    /// 2. Platform-specific config dir (`~/Library/Application Support/tabport/` on macOS)
    /// 3. XDG config dir (`~/.config/tabport/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found. A file that
    /// exists but fails to parse is logged and skipped.
    #[must_use]
    pub fn load_default() -> Self {
        if let Ok(explicit) = std::env::var(CONFIG_PATH_ENV) {
            if !explicit.is_empty() {
                return Self::load_or_warn(Path::new(&explicit)).unwrap_or_default();
            }
        }

        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let platform_config = base_dirs.config_dir().join("tabport").join("config.toml");
        if platform_config.exists() {
            if let Some(config) = Self::load_or_warn(&platform_config) {
                return config;
            }
        }

        let xdg_config = base_dirs
            .home_dir()
            .join(".config")
            .join("tabport")
            .join("config.toml");
        if xdg_config.exists() {
            if let Some(config) = Self::load_or_warn(&xdg_config) {
                return config;
            }
        }

        Self::default()
    }

    fn load_or_warn(path: &Path) -> Option<Self> {
        match Self::load_from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring config file");
                None
            },
        }
    }

    /// Converts a `ConfigFile` to `TabportConfig`.
    fn from_config_file(file: ConfigFile) -> crate::Result<Self> {
        let mut config = Self::default();

        if let Some(suffixes) = file.compression {
            config.compression = suffixes
                .iter()
                .map(|s| s.parse())
                .collect::<crate::Result<Vec<Compression>>>()?;
        }
        if let Some(http) = file.http {
            if let Some(timeout_secs) = http.timeout_secs {
                config.http.timeout_secs = timeout_secs;
            }
            if let Some(user_agent) = http.user_agent {
                config.http.user_agent = user_agent;
            }
        }
        if let Some(logging) = file.logging {
            if let Some(format) = logging.format {
                config.logging.format = format.parse()?;
            }
            config.logging.filter = logging.filter;
            config.logging.file = logging.file.map(PathBuf::from);
        }
        if let Some(defaults) = file.defaults {
            if let Some(na) = defaults.na {
                config.defaults.na = na;
            }
        }

        Ok(config)
    }

    /// Builds the extension resolver for the configured compression set.
    #[must_use]
    pub fn resolver(&self) -> ExtensionResolver {
        ExtensionResolver::new(self.compression.iter().copied())
    }

    /// Sets the recognized compression wrappers.
    #[must_use]
    pub fn with_compression(mut self, compression: impl IntoIterator<Item = Compression>) -> Self {
        self.compression = compression.into_iter().collect();
        self
    }

    /// Sets the HTTP timeout.
    #[must_use]
    pub const fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.http.timeout_secs = timeout_secs;
        self
    }
}
