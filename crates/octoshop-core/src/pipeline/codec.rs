//! Transport codec: images travel as base64-encoded PNG.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{DynamicImage, ImageFormat};
use std::borrow::Cow;
use std::io::Cursor;

use crate::error::ImageError;

/// Encode an image as base64 PNG.
///
/// PNG is lossless, so `decode(encode(img))` gives back the same pixels.
pub fn encode(image: &DynamicImage) -> Result<String, ImageError> {
    Ok(BASE64.encode(encode_png(image)?))
}

/// Encode an image as raw PNG bytes.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, ImageError> {
    // PNG has no float pixel types
    let image: Cow<'_, DynamicImage> = match image {
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            Cow::Owned(DynamicImage::ImageRgba16(image.to_rgba16()))
        }
        _ => Cow::Borrowed(image),
    };

    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| ImageError::Encode(e.to_string()))?;
    Ok(buffer.into_inner())
}

/// Decode a base64 image string returned by the backend.
///
/// Surrounding whitespace and a `data:image/...;base64,` prefix are accepted.
pub fn decode(encoded: &str) -> Result<DynamicImage, ImageError> {
    let trimmed = encoded.trim();
    let payload = match trimmed.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => trimmed,
    };
    let bytes = BASE64.decode(payload)?;
    image::load_from_memory(&bytes).map_err(|e| ImageError::Decode(e.to_string()))
}
