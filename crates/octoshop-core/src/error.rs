//! Error types for OctoShop.
//!
//! Errors are organized by concern (configuration, gateway, image handling).
//! Every error maps onto a coarse [`ErrorKind`], and [`user_message`] is the one
//! place that turns a kind into the text shown to a user.

use thiserror::Error;

/// Top-level error type for OctoShop operations.
#[derive(Error, Debug)]
pub enum OctoshopError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Inference gateway errors
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Image normalization or transport codec errors
    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// A required environment variable is not set
    #[error("Missing required setting {setting}: set the {var} environment variable")]
    MissingEnv { setting: String, var: String },
}

/// Errors raised while talking to the remote inference endpoint.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The request was rejected before or by the service (4xx, bad payload, auth).
    #[error("Request rejected (HTTP {status}): {message}")]
    ClientRequest { status: u16, message: String },

    /// A request was malformed before it was sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The service itself failed (5xx).
    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// The backend reported the job as failed.
    #[error("Job failed with status '{status}'")]
    JobFailed { status: String },

    /// Results were requested for a job that has not completed.
    #[error("Job results requested before completion")]
    NotReady,

    /// The poll loop gave up waiting.
    #[error("Job timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The caller cancelled the poll loop.
    #[error("Job cancelled")]
    Cancelled,

    /// Anything else: transport failures, unparsable responses.
    #[error("{0}")]
    Unexpected(String),
}

/// Image normalization and transport codec errors.
#[derive(Error, Debug)]
pub enum ImageError {
    /// Image decoding failed
    #[error("Decode error: {0}")]
    Decode(String),

    /// Image encoding failed
    #[error("Encode error: {0}")]
    Encode(String),

    /// Base64 payload could not be decoded
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Upload is not an accepted format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Upload exceeds the configured size limit
    #[error("File too large ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge { size_mb: u64, max_mb: u64 },

    /// Decoding took longer than the configured limit
    #[error("Decode timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Coarse classification used for reporting.
///
/// `ClientRequest`, `Server` and `Unexpected` share the same user-facing text;
/// they are kept apart for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    ClientRequest,
    Server,
    Unexpected,
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::ClientRequest { .. } | GatewayError::InvalidRequest(_) => {
                ErrorKind::ClientRequest
            }
            GatewayError::Server { .. } | GatewayError::JobFailed { .. } => ErrorKind::Server,
            GatewayError::NotReady
            | GatewayError::Timeout { .. }
            | GatewayError::Cancelled
            | GatewayError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }
}

impl OctoshopError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OctoshopError::Config(_) => ErrorKind::Configuration,
            OctoshopError::Gateway(e) => e.kind(),
            OctoshopError::Image(_) | OctoshopError::Io(_) | OctoshopError::Json(_) => {
                ErrorKind::Unexpected
            }
        }
    }

    /// User-facing message for this error.
    pub fn user_message(&self) -> &'static str {
        user_message(self.kind())
    }
}

/// Map an error kind to the message shown to the user.
pub fn user_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Configuration => {
            "OctoShop is not configured. Set OCTOSHOP_ENDPOINT_URL and OCTOAI_TOKEN and try again."
        }
        ErrorKind::ClientRequest | ErrorKind::Server | ErrorKind::Unexpected => {
            "Oops, something went wrong... OctoShop is in alpha preview, please try again!"
        }
    }
}

/// Convenience type alias for OctoShop results.
pub type Result<T> = std::result::Result<T, OctoshopError>;

/// Convenience type alias for gateway-specific results.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
