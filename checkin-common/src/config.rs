//! Configuration loading for the check-in tools
//!
//! Bootstrap configuration lives in a small TOML file. Resolution order for
//! the file location:
//! 1. Command-line argument (highest priority)
//! 2. `CHECKIN_CONFIG` environment variable
//! 3. Per-user config file (`~/.config/checkin/config.toml` on Linux)
//! 4. Compiled defaults (no file)
//!
//! A missing file is not an error: a warning is logged and compiled defaults
//! are used. A file that exists but cannot be parsed is an error.
//! `CHECKIN_BACKEND_URL` and `CHECKIN_API_KEY` override the backend section
//! after the file is read.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "CHECKIN_CONFIG";
/// Environment variable overriding `backend.base_url`
pub const BACKEND_URL_ENV_VAR: &str = "CHECKIN_BACKEND_URL";
/// Environment variable overriding `backend.api_key`
pub const API_KEY_ENV_VAR: &str = "CHECKIN_API_KEY";

/// Most digits an E.164 number can carry
pub const MAX_PHONE_DIGITS: usize = 15;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub decoder: DecoderConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.backend.validate()?;
        self.scan.validate()
    }
}

/// Backend REST API location and credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Attendee table name
    #[serde(default = "default_table")]
    pub table: String,

    /// Anonymous API key sent as `apikey` and bearer token
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            table: default_table(),
            api_key: None,
        }
    }
}

impl BackendConfig {
    /// Full REST endpoint for the attendee table
    pub fn endpoint(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.base_url.trim_end_matches('/'),
            self.table
        )
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "backend.base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.table.trim().is_empty() {
            return Err(Error::Config("backend.table must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Scan coordination timings and phone validation bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Window after accepting a code during which decodes are ignored
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Delay before restarting the camera after a modal closes
    #[serde(default = "default_resume_grace_ms")]
    pub resume_grace_ms: u64,

    /// Delay before restarting the camera after a successful check-in
    #[serde(default = "default_resume_after_confirm_ms")]
    pub resume_after_confirm_ms: u64,

    /// Upper bound on a single lookup or update request
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,

    /// Fewest digits accepted in a phone number
    #[serde(default = "default_phone_min_digits")]
    pub phone_min_digits: usize,

    /// Most digits accepted in a phone number
    #[serde(default = "default_phone_max_digits")]
    pub phone_max_digits: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: default_cooldown_ms(),
            resume_grace_ms: default_resume_grace_ms(),
            resume_after_confirm_ms: default_resume_after_confirm_ms(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
            phone_min_digits: default_phone_min_digits(),
            phone_max_digits: default_phone_max_digits(),
        }
    }
}

impl ScanConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn resume_grace(&self) -> Duration {
        Duration::from_millis(self.resume_grace_ms)
    }

    pub fn resume_after_confirm(&self) -> Duration {
        Duration::from_millis(self.resume_after_confirm_ms)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cooldown_ms == 0 {
            return Err(Error::Config("scan.cooldown_ms must be greater than 0".to_string()));
        }
        if self.lookup_timeout_ms == 0 {
            return Err(Error::Config(
                "scan.lookup_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.phone_min_digits == 0 || self.phone_min_digits > self.phone_max_digits {
            return Err(Error::Config(format!(
                "scan.phone_min_digits ({}) must be between 1 and phone_max_digits ({})",
                self.phone_min_digits, self.phone_max_digits
            )));
        }
        if self.phone_max_digits > MAX_PHONE_DIGITS {
            return Err(Error::Config(format!(
                "scan.phone_max_digits ({}) exceeds {}",
                self.phone_max_digits, MAX_PHONE_DIGITS
            )));
        }
        Ok(())
    }
}

/// External decoder commands, tried in order until one starts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    #[serde(default)]
    pub commands: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
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

fn default_base_url() -> String {
    "http://127.0.0.1:54321".to_string()
}

fn default_table() -> String {
    "attendees".to_string()
}

fn default_cooldown_ms() -> u64 {
    3_500
}

fn default_resume_grace_ms() -> u64 {
    300
}

fn default_resume_after_confirm_ms() -> u64 {
    1_500
}

fn default_lookup_timeout_ms() -> u64 {
    10_000
}

fn default_phone_min_digits() -> usize {
    10
}

fn default_phone_max_digits() -> usize {
    MAX_PHONE_DIGITS
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Config file location resolver
///
/// Follows the priority order documented at module level.
pub struct ConfigResolver {
    app_name: String,
}

impl ConfigResolver {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    /// Resolve the config file path, `None` when no file applies
    pub fn resolve(&self, cli_arg: Option<&Path>) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = cli_arg {
            return Some(path.to_path_buf());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3: Per-user config file
        let user_config = dirs::config_dir().map(|d| d.join(&self.app_name).join("config.toml"));
        match user_config {
            Some(path) if path.exists() => Some(path),
            _ => None,
        }
    }

    /// Resolve, load and validate configuration, applying env overrides
    pub fn load(&self, cli_arg: Option<&Path>) -> Result<TomlConfig> {
        let mut config = match self.resolve(cli_arg) {
            Some(path) => load_toml_config(&path)?,
            None => {
                debug!("No config file found for {}, using defaults", self.app_name);
                TomlConfig::default()
            }
        };

        apply_env_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }
}

/// Load TOML config from a path, falling back to defaults if missing
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file not found at {}, using compiled defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Write config to a TOML file, creating parent directories
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Apply `CHECKIN_BACKEND_URL` / `CHECKIN_API_KEY` on top of file values
pub fn apply_env_overrides(config: &mut TomlConfig) {
    if let Ok(url) = std::env::var(BACKEND_URL_ENV_VAR) {
        if !url.trim().is_empty() {
            config.backend.base_url = url;
        }
    }
    if let Ok(key) = std::env::var(API_KEY_ENV_VAR) {
        if !key.trim().is_empty() {
            config.backend.api_key = Some(key);
        }
    }
}
