//! OctoShop Core - client library for a remote generative-image service.
//!
//! Takes an uploaded photo and a text prompt and returns stylistically
//! transformed versions of it. The heavy lifting happens on the backend; this
//! crate prepares the upload, talks the async job protocol and decodes the
//! results.
//!
//! # Architecture
//!
//! ```text
//! Upload → Normalize (EXIF, rescale) → Encode → Submit → Poll → Fetch → Decode
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use octoshop_core::{CancelToken, Config, Octoshop};
//!
//! #[tokio::main]
//! async fn main() -> octoshop_core::Result<()> {
//!     let config = Config::load()?;
//!     let session = Octoshop::from_config(config)?;
//!
//!     let upload = std::fs::read("./photo.jpg")?;
//!     let normalized = session.normalize(upload).await?;
//!     let generation = session.config().generation.clone();
//!     let outcome = session
//!         .transform(&normalized.image, &generation, &CancelToken::new(), |p| {
//!             println!("{}% {}", p.percent, p.message)
//!         })
//!         .await?;
//!     println!("{} image(s)", outcome.images().count());
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod gateway;
pub mod pipeline;
pub mod poller;
pub mod session;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{
    user_message, ConfigError, ErrorKind, GatewayError, GatewayResult, ImageError, OctoshopError,
    Result,
};
pub use gateway::{HttpGateway, InferenceGateway};
pub use image::DynamicImage;
pub use pipeline::{ImageNormalizer, NormalizedImage, Watermark};
pub use poller::{BatchOutcome, CancelToken, JobPoller, JobReport, PollOptions, Progress};
pub use session::{Octoshop, OutputImage, TransformOutcome, TransformedJob};
pub use types::{
    GeneratedImage, GenerationRequest, GenerationResult, JobHandle, JobStatus, Sampler, Style,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
