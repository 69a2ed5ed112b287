//! Configuration management for OctoShop.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Secrets are referenced as `${ENV_VAR}` and resolved on demand, so
//! the endpoint URL and token normally come from the environment.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure for OctoShop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Inference endpoint settings
    pub gateway: GatewayConfig,

    /// Poll loop settings
    pub poller: PollerConfig,

    /// Generation request defaults
    pub generation: GenerationConfig,

    /// Input image handling
    pub image: ImageConfig,

    /// Output watermark
    pub watermark: WatermarkConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Resolved endpoint and token.
#[derive(Clone)]
pub struct GatewayCredentials {
    pub endpoint: String,
    pub token: String,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for GatewayCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayCredentials")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.octoshop.octoshop/config.toml
    /// - Linux: ~/.config/octoshop/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\octoshop\config\config.toml
    ///
    /// Falls back to ~/.octoshop/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "octoshop", "octoshop")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".octoshop").join("config.toml")
            })
    }

    /// Resolve the endpoint URL and token.
    ///
    /// Both are required; a missing value is a fatal configuration error.
    pub fn gateway_credentials(&self) -> Result<GatewayCredentials, ConfigError> {
        let endpoint = require(&self.gateway.endpoint, "gateway.endpoint", "OCTOSHOP_ENDPOINT_URL")?;
        let token = require(&self.gateway.token, "gateway.token", "OCTOAI_TOKEN")?;
        Ok(GatewayCredentials {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token,
            request_timeout: Duration::from_millis(self.gateway.request_timeout_ms),
        })
    }

    /// Watermark path with `~` expanded.
    pub fn watermark_path(&self) -> Option<PathBuf> {
        self.watermark.path.as_ref().map(|path| {
            let path_str = path.to_string_lossy();
            PathBuf::from(shellexpand::tilde(&path_str).into_owned())
        })
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn require(value: &str, setting: &str, default_var: &str) -> Result<String, ConfigError> {
    resolve_env_var(value).ok_or_else(|| {
        let var = if value.starts_with("${") && value.ends_with('}') {
            value[2..value.len() - 1].to_string()
        } else {
            default_var.to_string()
        };
        ConfigError::MissingEnv {
            setting: setting.to_string(),
            var,
        }
    })
}
