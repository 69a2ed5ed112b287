//! Core data types: generation requests, job handles and results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::GenerationConfig;
use crate::error::{GatewayError, GatewayResult};

/// Prompt substring that switches on the backend's `octoai` mode.
pub const OCTOAI_TRIGGER: &str = "octoai";

/// Sampler names understood by the generation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Sampler {
    #[serde(rename = "DDIM")]
    Ddim,
    #[serde(rename = "DPM++ 2M Karras")]
    Dpm2mKarras,
    #[default]
    #[serde(rename = "DPM++ 2M SDE Karras")]
    Dpm2mSdeKarras,
    #[serde(rename = "DPM++ SDE Karras")]
    DpmSdeKarras,
    #[serde(rename = "Euler")]
    Euler,
    #[serde(rename = "Euler a")]
    EulerAncestral,
    #[serde(rename = "Heun")]
    Heun,
    #[serde(rename = "LMS")]
    Lms,
}

impl Sampler {
    pub const ALL: [Sampler; 8] = [
        Sampler::Ddim,
        Sampler::Dpm2mKarras,
        Sampler::Dpm2mSdeKarras,
        Sampler::DpmSdeKarras,
        Sampler::Euler,
        Sampler::EulerAncestral,
        Sampler::Heun,
        Sampler::Lms,
    ];

    /// Backend identifier, as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sampler::Ddim => "DDIM",
            Sampler::Dpm2mKarras => "DPM++ 2M Karras",
            Sampler::Dpm2mSdeKarras => "DPM++ 2M SDE Karras",
            Sampler::DpmSdeKarras => "DPM++ SDE Karras",
            Sampler::Euler => "Euler",
            Sampler::EulerAncestral => "Euler a",
            Sampler::Heun => "Heun",
            Sampler::Lms => "LMS",
        }
    }
}

impl fmt::Display for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sampler {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sampler::ALL
            .into_iter()
            .find(|sampler| sampler.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown sampler '{s}'"))
    }
}

/// Visual style presets applied by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Style {
    #[serde(rename = "3d-model")]
    Model3d,
    #[serde(rename = "analog-film")]
    AnalogFilm,
    #[serde(rename = "anime")]
    Anime,
    #[serde(rename = "cinematic")]
    Cinematic,
    #[serde(rename = "comic-book")]
    ComicBook,
    #[serde(rename = "digital-art")]
    DigitalArt,
    #[serde(rename = "enhance")]
    Enhance,
    #[serde(rename = "fantasy-art")]
    FantasyArt,
    #[serde(rename = "isometric")]
    Isometric,
    #[serde(rename = "line-art")]
    LineArt,
    #[serde(rename = "low-poly")]
    LowPoly,
    #[serde(rename = "modeling-compound")]
    ModelingCompound,
    #[serde(rename = "neon-punk")]
    NeonPunk,
    #[serde(rename = "origami")]
    Origami,
    #[serde(rename = "photographic")]
    Photographic,
    #[serde(rename = "pixel-art")]
    PixelArt,
    #[serde(rename = "tile-texture")]
    TileTexture,
}

impl Style {
    pub const ALL: [Style; 17] = [
        Style::Model3d,
        Style::AnalogFilm,
        Style::Anime,
        Style::Cinematic,
        Style::ComicBook,
        Style::DigitalArt,
        Style::Enhance,
        Style::FantasyArt,
        Style::Isometric,
        Style::LineArt,
        Style::LowPoly,
        Style::ModelingCompound,
        Style::NeonPunk,
        Style::Origami,
        Style::Photographic,
        Style::PixelArt,
        Style::TileTexture,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Style::Model3d => "3d-model",
            Style::AnalogFilm => "analog-film",
            Style::Anime => "anime",
            Style::Cinematic => "cinematic",
            Style::ComicBook => "comic-book",
            Style::DigitalArt => "digital-art",
            Style::Enhance => "enhance",
            Style::FantasyArt => "fantasy-art",
            Style::Isometric => "isometric",
            Style::LineArt => "line-art",
            Style::LowPoly => "low-poly",
            Style::ModelingCompound => "modeling-compound",
            Style::NeonPunk => "neon-punk",
            Style::Origami => "origami",
            Style::Photographic => "photographic",
            Style::PixelArt => "pixel-art",
            Style::TileTexture => "tile-texture",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Style::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown style '{s}'"))
    }
}

/// A single image-generation job, as sent to the backend.
///
/// Built through [`GenerationRequest::builder`], which validates ranges.
/// There are no setters: a request is immutable once built.
#[derive(Clone, Serialize)]
pub struct GenerationRequest {
    prompt: String,
    strength: f32,
    steps: u32,
    sampler: Sampler,
    image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<Style>,
    faceswap: bool,
    batch: u32,
    octoai: bool,
}

impl GenerationRequest {
    /// Start a request for `prompt` over an already-encoded source image.
    pub fn builder(prompt: impl Into<String>, image: impl Into<String>) -> GenerationRequestBuilder {
        GenerationRequestBuilder::new(prompt.into(), image.into())
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn sampler(&self) -> Sampler {
        self.sampler
    }

    /// The encoded source image.
    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn style(&self) -> Option<Style> {
        self.style
    }

    pub fn faceswap(&self) -> bool {
        self.faceswap
    }

    pub fn batch(&self) -> u32 {
        self.batch
    }

    /// Whether the prompt triggered the backend's `octoai` mode.
    pub fn octoai(&self) -> bool {
        self.octoai
    }
}

// The encoded image can be megabytes long; keep it out of logs.
impl fmt::Debug for GenerationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationRequest")
            .field("prompt", &self.prompt)
            .field("strength", &self.strength)
            .field("steps", &self.steps)
            .field("sampler", &self.sampler)
            .field("image", &format_args!("<{} bytes>", self.image.len()))
            .field("style", &self.style)
            .field("faceswap", &self.faceswap)
            .field("batch", &self.batch)
            .field("octoai", &self.octoai)
            .finish()
    }
}

/// Builder for [`GenerationRequest`].
#[derive(Debug, Clone)]
pub struct GenerationRequestBuilder {
    prompt: String,
    image: String,
    strength: f32,
    steps: u32,
    sampler: Sampler,
    style: Option<Style>,
    faceswap: bool,
    batch: u32,
}

impl GenerationRequestBuilder {
    fn new(prompt: String, image: String) -> Self {
        let defaults = GenerationConfig::default();
        Self {
            prompt,
            image,
            strength: defaults.strength,
            steps: defaults.steps,
            sampler: defaults.sampler,
            style: defaults.style,
            faceswap: defaults.faceswap,
            batch: defaults.batch,
        }
    }

    /// Take strength, steps, sampler, style, faceswap and batch from config.
    pub fn with_defaults(mut self, config: &GenerationConfig) -> Self {
        self.strength = config.strength;
        self.steps = config.steps;
        self.sampler = config.sampler;
        self.style = config.style;
        self.faceswap = config.faceswap;
        self.batch = config.batch;
        self
    }

    pub fn strength(mut self, strength: f32) -> Self {
        self.strength = strength;
        self
    }

    pub fn steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    pub fn sampler(mut self, sampler: Sampler) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn style(mut self, style: Option<Style>) -> Self {
        self.style = style;
        self
    }

    pub fn faceswap(mut self, faceswap: bool) -> Self {
        self.faceswap = faceswap;
        self
    }

    pub fn batch(mut self, batch: u32) -> Self {
        self.batch = batch;
        self
    }

    /// Validate and build the request.
    pub fn build(self) -> GatewayResult<GenerationRequest> {
        if self.prompt.trim().is_empty() {
            return Err(GatewayError::InvalidRequest("prompt must not be empty".into()));
        }
        if !(0.0..=1.0).contains(&self.strength) {
            return Err(GatewayError::InvalidRequest(format!(
                "strength must be between 0.0 and 1.0, got {}",
                self.strength
            )));
        }
        if self.steps == 0 {
            return Err(GatewayError::InvalidRequest("steps must be > 0".into()));
        }
        if self.batch == 0 {
            return Err(GatewayError::InvalidRequest("batch must be > 0".into()));
        }
        if self.image.is_empty() {
            return Err(GatewayError::InvalidRequest("source image is empty".into()));
        }

        let octoai = self.prompt.to_lowercase().contains(OCTOAI_TRIGGER);
        if octoai {
            tracing::info!("Prompt contains '{OCTOAI_TRIGGER}' trigger, enabling octoai mode");
        }

        Ok(GenerationRequest {
            prompt: self.prompt,
            strength: self.strength,
            steps: self.steps,
            sampler: self.sampler,
            image: self.image,
            style: self.style,
            faceswap: self.faceswap,
            batch: self.batch,
            octoai,
        })
    }
}

/// Observed state of a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

/// Opaque reference to a job submitted to the gateway.
///
/// Remembers the last observed status. Once that status is terminal it never
/// changes again, whatever later polls report.
#[derive(Debug, Clone)]
pub struct JobHandle {
    poll_url: String,
    request_id: Option<String>,
    status: JobStatus,
    response_url: Option<String>,
    reported_status: Option<String>,
}

impl JobHandle {
    pub fn new(poll_url: impl Into<String>, request_id: Option<String>) -> Self {
        Self {
            poll_url: poll_url.into(),
            request_id,
            status: JobStatus::Pending,
            response_url: None,
            reported_status: None,
        }
    }

    pub fn poll_url(&self) -> &str {
        &self.poll_url
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Last observed status.
    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Where results can be fetched, once the job completed.
    pub fn response_url(&self) -> Option<&str> {
        self.response_url.as_deref()
    }

    /// Record a freshly observed status and return the effective one.
    pub fn record(&mut self, status: JobStatus, response_url: Option<String>) -> JobStatus {
        if self.status.is_terminal() {
            if self.status != status {
                tracing::warn!(
                    "Ignoring {status:?} for job {} already observed {:?}",
                    self.poll_url,
                    self.status
                );
            }
            return self.status;
        }
        self.status = status;
        if status == JobStatus::Completed {
            self.response_url = response_url;
        }
        self.status
    }

    /// Record a failure together with the status string the backend sent.
    pub fn record_failed(&mut self, reported: impl Into<String>) -> JobStatus {
        if self.status.is_terminal() {
            return self.record(JobStatus::Failed, None);
        }
        self.reported_status = Some(reported.into());
        self.record(JobStatus::Failed, None)
    }

    /// Backend status string behind a failure, if one was recorded.
    pub fn reported_status(&self) -> Option<&str> {
        self.reported_status.as_deref()
    }
}

/// One output image with the text the backend attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Base64-encoded image
    pub image: String,

    /// Descriptive caption of the source photo
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    /// Narrative text written for this output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story: Option<String>,
}

/// Results of one completed job, in backend order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub images: Vec<GeneratedImage>,
}

impl GenerationResult {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
