//! Image handling around the inference call.
//!
//! - **orientation**: read and apply the EXIF Orientation tag
//! - **normalize**: decode an upload, make it upright, rescale it
//! - **codec**: base64 PNG transport encoding
//! - **watermark**: logo overlay for output images

pub mod codec;
pub mod normalize;
pub mod orientation;
pub mod watermark;

// Re-exports for convenient access
pub use normalize::{target_dimensions, ImageNormalizer, NormalizedImage};
pub use orientation::OrientationCorrector;
pub use watermark::Watermark;
