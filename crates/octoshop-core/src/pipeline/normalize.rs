//! Upload normalization: decode, upright, rescale.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;
use std::time::Duration;
use tokio::time::timeout;

use super::orientation::OrientationCorrector;
use crate::config::ImageConfig;
use crate::error::ImageError;

/// Turns an uploaded photo into the image the backend expects.
pub struct ImageNormalizer {
    config: ImageConfig,
}

/// Result of normalizing an upload.
pub struct NormalizedImage {
    /// Upright, rescaled image
    pub image: DynamicImage,
    /// Detected upload format
    pub format: ImageFormat,
    /// EXIF orientation found in the upload, if any
    pub orientation: Option<u32>,
    /// Dimensions as decoded, before rotation and rescaling
    pub original_width: u32,
    pub original_height: u32,
}

impl ImageNormalizer {
    pub fn new(config: ImageConfig) -> Self {
        Self { config }
    }

    /// Normalize an upload off the async runtime, bounded by the decode timeout.
    pub async fn normalize(&self, bytes: Vec<u8>) -> Result<NormalizedImage, ImageError> {
        self.check_size(bytes.len() as u64)?;

        let config = self.config.clone();
        let timeout_ms = self.config.decode_timeout_ms;
        let task = tokio::task::spawn_blocking(move || {
            ImageNormalizer::new(config).normalize_sync(&bytes)
        });

        match timeout(Duration::from_millis(timeout_ms), task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(ImageError::Decode(format!("Task join error: {e}"))),
            Err(_) => Err(ImageError::Timeout { timeout_ms }),
        }
    }

    /// Synchronous normalization.
    pub fn normalize_sync(&self, bytes: &[u8]) -> Result<NormalizedImage, ImageError> {
        self.check_size(bytes.len() as u64)?;

        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| ImageError::Decode(format!("Cannot detect image format: {e}")))?;
        let format = reader
            .format()
            .ok_or_else(|| ImageError::UnsupportedFormat("unknown".to_string()))?;
        let format_name = format_to_string(format);
        if !self.accepts(&format_name) {
            return Err(ImageError::UnsupportedFormat(format_name));
        }

        let image = reader
            .decode()
            .map_err(|e| ImageError::Decode(e.to_string()))?;
        let (original_width, original_height) = image.dimensions();

        let orientation = OrientationCorrector::read(bytes);
        let image = OrientationCorrector::apply(image, orientation);
        let image = if self.config.rescale {
            self.rescale(image)
        } else {
            image
        };

        tracing::debug!(
            "Normalized {format_name} upload {original_width}x{original_height} \
             (orientation {orientation:?}) to {}x{}",
            image.width(),
            image.height()
        );

        Ok(NormalizedImage {
            image,
            format,
            orientation,
            original_width,
            original_height,
        })
    }

    /// Resize so the longer edge equals the configured target size.
    pub fn rescale(&self, image: DynamicImage) -> DynamicImage {
        let (width, height) = image.dimensions();
        let (new_width, new_height) = target_dimensions(width, height, self.config.target_size);
        if (new_width, new_height) == (width, height) {
            return image;
        }
        image.resize_exact(new_width, new_height, FilterType::CatmullRom)
    }

    fn check_size(&self, len: u64) -> Result<(), ImageError> {
        let max_bytes = self.config.max_file_size_mb.saturating_mul(1024 * 1024);
        if len > max_bytes {
            return Err(ImageError::FileTooLarge {
                size_mb: len / (1024 * 1024),
                max_mb: self.config.max_file_size_mb,
            });
        }
        Ok(())
    }

    fn accepts(&self, format_name: &str) -> bool {
        self.config
            .accepted_formats
            .iter()
            .any(|f| f.eq_ignore_ascii_case(format_name) || (f == "jpg" && format_name == "jpeg"))
    }
}

/// Dimensions with the longer edge set to `target`.
///
/// The shorter edge scales proportionally with integer truncation; it is
/// clamped to 1 for extreme aspect ratios.
pub fn target_dimensions(width: u32, height: u32, target: u32) -> (u32, u32) {
    let scale = |edge: u32, longer: u32| {
        ((target as u64 * edge as u64) / longer.max(1) as u64).max(1) as u32
    };
    if width == height {
        (target, target)
    } else if width > height {
        (target, scale(height, width))
    } else {
        (scale(width, height), target)
    }
}

/// Convert an ImageFormat to a string representation.
pub fn format_to_string(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        ImageFormat::Tiff => "tiff".to_string(),
        ImageFormat::Bmp => "bmp".to_string(),
        ImageFormat::Avif => "avif".to_string(),
        _ => "unknown".to_string(),
    }
}
