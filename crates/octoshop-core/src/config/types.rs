//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::{Sampler, Style};

/// Inference endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL of the generation endpoint (supports ${ENV_VAR} syntax)
    pub endpoint: String,

    /// Bearer token (supports ${ENV_VAR} syntax)
    pub token: String,

    /// Per-HTTP-call timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: "${OCTOSHOP_ENDPOINT_URL}".to_string(),
            token: "${OCTOAI_TOKEN}".to_string(),
            request_timeout_ms: 60_000,
        }
    }
}

/// Poll loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Delay between status checks in milliseconds
    pub interval_ms: u64,

    /// Give up on outstanding jobs after this many milliseconds
    pub timeout_ms: u64,

    /// Highest percentage the progress estimate reports before jobs finish
    pub progress_cap: u8,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            timeout_ms: 300_000,
            progress_cap: 99,
        }
    }
}

/// Defaults for generation requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Prompt used when none is given
    pub prompt: String,

    /// How far the output may depart from the source photo (0.0 - 1.0)
    pub strength: f32,

    /// Denoising steps
    pub steps: u32,

    /// Sampler name
    pub sampler: Sampler,

    /// Optional style preset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,

    /// Transfer the subject's face onto the output
    pub faceswap: bool,

    /// Images generated per job
    pub batch: u32,

    /// Independent jobs submitted per run
    pub jobs: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            prompt: "Set the scene in 80s Tokyo".to_string(),
            strength: 0.75,
            steps: 20,
            sampler: Sampler::default(),
            style: None,
            faceswap: true,
            batch: 1,
            jobs: 1,
        }
    }
}

/// Input image handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Longer edge of the image sent to the backend
    pub target_size: u32,

    /// Rescale uploads to `target_size`
    pub rescale: bool,

    /// Maximum upload size in megabytes
    pub max_file_size_mb: u64,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,

    /// Accepted upload formats
    pub accepted_formats: Vec<String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            target_size: 1024,
            rescale: true,
            max_file_size_mb: 20,
            decode_timeout_ms: 5000,
            accepted_formats: vec!["png".to_string(), "jpeg".to_string()],
        }
    }
}

/// Watermark overlay for output images.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkConfig {
    /// PNG logo pasted in the top-left corner (no watermark when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Watermark edge length in pixels
    pub size: u32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            path: None,
            size: 200,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
