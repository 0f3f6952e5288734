//! Configuration loading and resolution
//!
//! Settings come from, in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: the client starts with defaults. A
//! TOML file that exists but does not parse is.

use crate::image::DeliveryConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

/// Environment variable naming the TOML config file
pub const CONFIG_ENV_VAR: &str = "FURNISH_CONFIG";

/// Environment variable overriding the backend base URL
pub const API_BASE_ENV_VAR: &str = "FURNISH_API_BASE";

const DEFAULT_API_BASE: &str = "https://furnish-findr-backend.onrender.com";

/// Client configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Backend base URL (scheme + host, no `/api` suffix)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    /// Results requested per search when `-k` is not given
    #[serde(default = "default_k")]
    pub default_k: u32,

    /// Timeout for recommend/analytics requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Timeout for a single image load attempt
    #[serde(default = "default_image_timeout_secs")]
    pub image_timeout_secs: u64,

    /// Image proxy and placeholder
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

fn default_k() -> u32 {
    8
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_image_timeout_secs() -> u64 {
    15
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            api_base: None,
            default_k: default_k(),
            request_timeout_secs: default_request_timeout_secs(),
            image_timeout_secs: default_image_timeout_secs(),
            delivery: DeliveryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Parse a config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load config from `path`
    ///
    /// Returns `Ok(None)` when the file does not exist. The caller logs the
    /// outcome once its subscriber is installed.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Config(format!(
                "Read config {} failed: {}",
                path.display(),
                e
            ))),
        }
    }
}

/// Config file location: CLI argument, then `FURNISH_CONFIG`, then
/// `<config_dir>/furnish/config.toml`
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path()
}

/// Platform config path, e.g. `~/.config/furnish/config.toml` on Linux
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("furnish").join("config.toml"))
}

/// Backend base URL: CLI argument, then `FURNISH_API_BASE`, then TOML, then
/// the compiled default
///
/// Trailing slashes are dropped so endpoint paths can be appended directly.
pub fn resolve_api_base(cli_arg: Option<&str>, config: &TomlConfig) -> Result<String> {
    let env_value = std::env::var(API_BASE_ENV_VAR).ok();

    let (source, raw) = if let Some(value) = non_blank(cli_arg) {
        ("command line", value)
    } else if let Some(value) = non_blank(env_value.as_deref()) {
        ("environment", value)
    } else if let Some(value) = non_blank(config.api_base.as_deref()) {
        ("TOML config", value)
    } else {
        ("default", DEFAULT_API_BASE)
    };

    let base = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(base)
        .map_err(|e| Error::Config(format!("Invalid API base '{}' ({}): {}", raw, source, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "API base '{}' ({}) must use http or https",
            raw, source
        )));
    }

    info!(api_base = base, source, "Resolved backend API base");
    Ok(base.to_string())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Write `config` to `path` atomically
///
/// Writes a sibling `.toml.tmp` file, then renames it over the target.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
