//! Logo overlay for output images.

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use std::path::Path;

use crate::error::ImageError;

/// A logo pasted into the top-left corner of output images.
pub struct Watermark {
    logo: RgbaImage,
}

impl Watermark {
    /// Load a logo from disk, resized to `size`x`size`.
    pub fn load(path: &Path, size: u32) -> Result<Self, ImageError> {
        let logo = image::open(path)
            .map_err(|e| ImageError::Decode(format!("watermark {}: {e}", path.display())))?;
        Ok(Self::from_image(&logo, size))
    }

    pub fn from_image(logo: &DynamicImage, size: u32) -> Self {
        let logo = logo.resize_exact(size, size, FilterType::CatmullRom).to_rgba8();
        Self { logo }
    }

    /// Alpha-blend the logo over `image`.
    pub fn apply(&self, image: &DynamicImage) -> DynamicImage {
        let mut base = image.to_rgba8();
        imageops::overlay(&mut base, &self.logo, 0, 0);
        DynamicImage::ImageRgba8(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba};

    #[test]
    fn test_apply_blends_top_left_only() {
        let logo = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255])));
        let watermark = Watermark::from_image(&logo, 2);
        let base = DynamicImage::ImageRgba8(RgbaImage::from_pixel(6, 6, Rgba([0, 0, 0, 255])));

        let out = watermark.apply(&base).to_rgba8();
        assert_eq!(out.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
        assert_eq!(out.get_pixel(1, 1), &Rgba([255, 255, 255, 255]));
        assert_eq!(out.get_pixel(2, 2), &Rgba([0, 0, 0, 255]));
        assert_eq!(out.get_pixel(5, 5), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_transparent_logo_leaves_image_unchanged() {
        let logo = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 3, Rgba([255, 0, 0, 0])));
        let watermark = Watermark::from_image(&logo, 3);
        let base = DynamicImage::ImageRgba8(RgbaImage::from_pixel(5, 5, Rgba([10, 20, 30, 255])));

        let out = watermark.apply(&base);
        assert_eq!(out.dimensions(), (5, 5));
        assert_eq!(out.to_rgba8().get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(Watermark::load(Path::new("/nonexistent/logo.png"), 200).is_err());
    }
}
