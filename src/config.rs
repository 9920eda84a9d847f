//! Service configuration module.
//!
//! Handles loading, validating, and merging `tweetgen.toml`. Stock defaults
//! are serialized to a TOML table, the user file is merged on top, and the
//! result is deserialized and validated. Environment variables are applied
//! last so deployments can inject secrets without touching the file.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! environment = "development"
//!
//! [server]
//! listen = "0.0.0.0:5000"
//! # public_base_url = "https://tweetgen.example"
//! compress_uploads = true
//! upload_max_bytes = 10485760   # Per uploaded file
//!
//! [model]
//! api_base = "https://api.openai.com/v1"
//! model = "gpt-4o"
//! max_tokens = 1000
//!
//! [images]
//! max_width = 1200
//! max_height = 1200
//! quality = 80                  # Starting quality, percent
//! max_file_size = 2097152       # Byte budget per image
//! formats = ["jpeg"]            # Preference order: "avif", "jpeg"
//!
//! [storage]
//! database_url = "tweetgen.db"
//!
//! [session]
//! ttl_secs = 1800
//! ```
//!
//! ## Environment Overrides
//!
//! | Variable | Effect |
//! |---|---|
//! | `OPENAI_API_KEY` (or `OPENAI_API_KEY_ENV_VAR`) | model credential |
//! | `DATABASE_URL` | `storage.database_url` |
//! | `APP_ENV` (or `NODE_ENV`) | `environment` |
//!
//! The API key is never read from or written to TOML.
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

use crate::imaging::{EncodeFormat, Quality, ReduceOptions};

/// Default config file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "tweetgen.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Service configuration loaded from `tweetgen.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Deployment label reported by the health endpoint.
    pub environment: String,
    /// HTTP listener and upload handling.
    pub server: ServerConfig,
    /// Generation model endpoint.
    pub model: ModelConfig,
    /// Upload size reduction constraints.
    pub images: ImagesConfig,
    /// Share record persistence.
    pub storage: StorageConfig,
    /// Client-side result cache.
    pub session: SessionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerConfig::default(),
            model: ModelConfig::default(),
            images: ImagesConfig::default(),
            storage: StorageConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.listen.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "server.listen is not a socket address: {}",
                self.server.listen
            )));
        }
        if self.server.upload_max_bytes == 0 {
            return Err(ConfigError::Validation(
                "server.upload_max_bytes must be non-zero".into(),
            ));
        }
        if self.model.model.trim().is_empty() {
            return Err(ConfigError::Validation("model.model must not be empty".into()));
        }
        if self.model.max_tokens == 0 {
            return Err(ConfigError::Validation(
                "model.max_tokens must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.images.quality) {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.images.max_width == 0 || self.images.max_height == 0 {
            return Err(ConfigError::Validation(
                "images.max_width and images.max_height must be non-zero".into(),
            ));
        }
        if self.images.max_file_size == 0 {
            return Err(ConfigError::Validation(
                "images.max_file_size must be non-zero".into(),
            ));
        }
        if self.images.formats.is_empty() {
            return Err(ConfigError::Validation(
                "images.formats must not be empty".into(),
            ));
        }
        if self.storage.database_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "storage.database_url must not be empty".into(),
            ));
        }
        if self.session.ttl_secs == 0 {
            return Err(ConfigError::Validation(
                "session.ttl_secs must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// HTTP listener and upload handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `"0.0.0.0:5000"`.
    pub listen: String,
    /// Absolute origin used in preview metadata. When absent the origin is
    /// taken from the request's `Host` / `X-Forwarded-Proto` headers.
    pub public_base_url: Option<String>,
    /// Run each upload through the size reducer before the model call.
    pub compress_uploads: bool,
    /// Per-file upload limit in bytes.
    pub upload_max_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:5000".to_string(),
            public_base_url: None,
            compress_uploads: true,
            upload_max_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Generation model endpoint (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    /// Base URL; `/chat/completions` is appended.
    pub api_base: String,
    /// Model id, fixed for every request.
    pub model: String,
    /// Completion token cap.
    pub max_tokens: u32,
    /// Credential, environment only.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            max_tokens: 1000,
            api_key: None,
        }
    }
}

/// Constraints handed to the size reducer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    pub max_width: u32,
    pub max_height: u32,
    /// Starting lossy quality as a percentage.
    pub quality: u32,
    /// Byte budget per image.
    pub max_file_size: u64,
    /// Output formats in preference order.
    pub formats: Vec<EncodeFormat>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        let defaults = ReduceOptions::default();
        Self {
            max_width: defaults.max_width,
            max_height: defaults.max_height,
            quality: defaults.quality.value(),
            max_file_size: defaults.max_file_size,
            formats: defaults.formats,
        }
    }
}

impl ImagesConfig {
    pub fn to_reduce_options(&self) -> ReduceOptions {
        ReduceOptions {
            max_width: self.max_width,
            max_height: self.max_height,
            quality: Quality::new(self.quality),
            max_file_size: self.max_file_size,
            formats: self.formats.clone(),
        }
    }
}

/// Share record persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// SQLite path, `sqlite://path`, or `:memory:`.
    pub database_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "tweetgen.db".to_string(),
        }
    }
}

/// Client-side result cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Seconds a cached generation stays valid.
    pub ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { ttl_secs: 1800 }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AppConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Apply environment overrides through `lookup` (usually `std::env::var`).
///
/// Empty values are treated as unset.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(key) = get("OPENAI_API_KEY").or_else(|| get("OPENAI_API_KEY_ENV_VAR")) {
        config.model.api_key = Some(key);
    }
    if let Some(url) = get("DATABASE_URL") {
        config.storage.database_url = url;
    }
    if let Some(env) = get("APP_ENV").or_else(|| get("NODE_ENV")) {
        config.environment = env;
    }
}

/// Load config from `path` (or [`DEFAULT_CONFIG_FILE`]) and the process
/// environment.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// applies environment overrides, and validates the result.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let path = path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    let mut config = resolve_config(base, overlay)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `tweetgen.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# TweetGen Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Environment variables take precedence over this file:
#   OPENAI_API_KEY (or OPENAI_API_KEY_ENV_VAR)  model credential
#   DATABASE_URL                                storage.database_url
#   APP_ENV (or NODE_ENV)                       environment
#
# Unknown keys will cause an error.

# Deployment label reported by /api/health.
environment = "development"

# ---------------------------------------------------------------------------
# HTTP server
# ---------------------------------------------------------------------------
[server]
# Socket address to bind.
listen = "0.0.0.0:5000"

# Absolute origin used in share preview metadata.
# Omit to derive it from the request's Host header.
# public_base_url = "https://tweetgen.example"

# Re-encode each upload under images.max_file_size before the model call.
compress_uploads = true

# Per-file upload limit in bytes (10 MiB).
upload_max_bytes = 10485760

# ---------------------------------------------------------------------------
# Generation model (OpenAI-compatible chat completions)
# ---------------------------------------------------------------------------
[model]
api_base = "https://api.openai.com/v1"
model = "gpt-4o"
max_tokens = 1000

# ---------------------------------------------------------------------------
# Image size reduction
# ---------------------------------------------------------------------------
[images]
# Bounding box; images are scaled down uniformly, never up.
max_width = 1200
max_height = 1200

# Starting lossy quality in percent. Lowered by 10 while over budget.
quality = 80

# Byte budget per image (2 MiB).
max_file_size = 2097152

# Output formats in preference order: "avif", "jpeg".
# The first one this build can encode is used.
formats = ["jpeg"]

# ---------------------------------------------------------------------------
# Share storage
# ---------------------------------------------------------------------------
[storage]
# SQLite file path, "sqlite://path", or ":memory:".
database_url = "tweetgen.db"

# ---------------------------------------------------------------------------
# Client session cache
# ---------------------------------------------------------------------------
[session]
# Seconds a cached generation result stays valid.
ttl_secs = 1800
"##
}
