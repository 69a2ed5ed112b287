//! EXIF orientation handling.

use exif::{In, Reader, Tag, Value};
use image::DynamicImage;
use std::io::Cursor;

/// Reads and applies the EXIF Orientation tag.
pub struct OrientationCorrector;

impl OrientationCorrector {
    /// Read the orientation code (1-8 per EXIF spec) from an encoded image.
    ///
    /// Returns `None` when the container has no EXIF block or the tag is
    /// missing or malformed. That is not an error: the image is used as-is.
    pub fn read(bytes: &[u8]) -> Option<u32> {
        let mut cursor = Cursor::new(bytes);
        let exif = Reader::new().read_from_container(&mut cursor).ok()?;
        exif.get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|f| match &f.value {
                Value::Short(v) => v.first().map(|&x| x as u32),
                Value::Long(v) => v.first().copied(),
                _ => None,
            })
    }

    /// Rotate the image so it displays upright.
    ///
    /// Only the pure rotations are handled: 3 (180°), 6 (90° clockwise) and
    /// 8 (270° clockwise). Mirrored codes and `None` leave the image unchanged.
    pub fn apply(image: DynamicImage, orientation: Option<u32>) -> DynamicImage {
        match orientation {
            Some(3) => image.rotate180(),
            Some(6) => image.rotate90(),
            Some(8) => image.rotate270(),
            _ => image,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{GenericImageView, ImageFormat, Rgb, RgbImage};

    /// Encode a JPEG and splice in an APP1 segment carrying only an
    /// Orientation tag.
    pub(crate) fn jpeg_with_orientation(width: u32, height: u32, orientation: u16) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 40, 40])));
        let mut jpeg = Cursor::new(Vec::new());
        img.write_to(&mut jpeg, ImageFormat::Jpeg).unwrap();
        let jpeg = jpeg.into_inner();

        let mut tiff = Vec::new();
        tiff.extend_from_slice(b"II*\0");
        tiff.extend_from_slice(&8u32.to_le_bytes());
        tiff.extend_from_slice(&1u16.to_le_bytes());
        tiff.extend_from_slice(&0x0112u16.to_le_bytes());
        tiff.extend_from_slice(&3u16.to_le_bytes());
        tiff.extend_from_slice(&1u32.to_le_bytes());
        tiff.extend_from_slice(&orientation.to_le_bytes());
        tiff.extend_from_slice(&[0, 0]);
        tiff.extend_from_slice(&0u32.to_le_bytes());

        let mut app1 = Vec::new();
        app1.extend_from_slice(&[0xFF, 0xE1]);
        app1.extend_from_slice(&((tiff.len() + 8) as u16).to_be_bytes());
        app1.extend_from_slice(b"Exif\0\0");
        app1.extend_from_slice(&tiff);

        let mut out = Vec::with_capacity(jpeg.len() + app1.len());
        out.extend_from_slice(&jpeg[..2]);
        out.extend_from_slice(&app1);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn test_read_orientation_from_jpeg() {
        let bytes = jpeg_with_orientation(8, 4, 6);
        assert_eq!(OrientationCorrector::read(&bytes), Some(6));
    }

    #[test]
    fn test_read_orientation_missing() {
        let img = DynamicImage::new_rgb8(4, 4);
        let mut png = Cursor::new(Vec::new());
        img.write_to(&mut png, ImageFormat::Png).unwrap();
        assert_eq!(OrientationCorrector::read(png.get_ref()), None);
        assert_eq!(OrientationCorrector::read(b"not an image"), None);
    }

    #[test]
    fn test_apply_rotations_swap_dimensions() {
        let img = DynamicImage::new_rgb8(40, 20);
        assert_eq!(OrientationCorrector::apply(img.clone(), Some(3)).dimensions(), (40, 20));
        assert_eq!(OrientationCorrector::apply(img.clone(), Some(6)).dimensions(), (20, 40));
        assert_eq!(OrientationCorrector::apply(img, Some(8)).dimensions(), (20, 40));
    }

    #[test]
    fn test_apply_rotation_direction() {
        // Marker pixel in the top-left corner of a 2x1 image.
        let mut raw = RgbImage::new(2, 1);
        raw.put_pixel(0, 0, Rgb([255, 0, 0]));
        let img = DynamicImage::ImageRgb8(raw);

        // Code 6: clockwise, the left pixel ends up on top.
        let rotated = OrientationCorrector::apply(img.clone(), Some(6)).to_rgb8();
        assert_eq!(rotated.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(rotated.dimensions(), (1, 2));

        // Code 8: counter-clockwise, the left pixel ends up at the bottom.
        let rotated = OrientationCorrector::apply(img, Some(8)).to_rgb8();
        assert_eq!(rotated.get_pixel(0, 1), &Rgb([255, 0, 0]));
    }

    #[test]
    fn test_apply_without_metadata_is_identity() {
        let mut raw = RgbImage::new(3, 2);
        raw.put_pixel(2, 1, Rgb([1, 2, 3]));
        let img = DynamicImage::ImageRgb8(raw);
        for code in [None, Some(1), Some(2), Some(4), Some(5), Some(7), Some(42)] {
            let out = OrientationCorrector::apply(img.clone(), code);
            assert_eq!(out.as_bytes(), img.as_bytes());
            assert_eq!(out.dimensions(), img.dimensions());
        }
    }
}
