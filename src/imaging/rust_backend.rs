//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` with format sniffing |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |

use super::backend::{BackendError, ImageBackend};
use super::params::{EncodeFormat, Quality};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn image_format(format: EncodeFormat) -> ImageFormat {
    match format {
        EncodeFormat::Avif => ImageFormat::Avif,
        EncodeFormat::Jpeg => ImageFormat::Jpeg,
    }
}

/// Encode as AVIF using rav1e (speed=6 for reasonable throughput).
fn encode_avif(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    let encoder =
        image::codecs::avif::AvifEncoder::new_with_speed_quality(&mut buf, 6, quality.value() as u8);
    img.write_with_encoder(encoder)
        .map_err(|e| BackendError::Encode(format!("AVIF encode failed: {}", e)))?;
    Ok(buf)
}

/// Encode as baseline JPEG. Alpha is dropped since JPEG has no alpha channel.
fn encode_jpeg(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality.value() as u8);
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    rgb.write_with_encoder(encoder)
        .map_err(|e| BackendError::Encode(format!("JPEG encode failed: {}", e)))?;
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| BackendError::Decode(e.to_string()))?
            .decode()
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        image.resize_exact(width, height, FilterType::Lanczos3)
    }

    fn can_encode(&self, format: EncodeFormat) -> bool {
        image_format(format).writing_enabled()
    }

    fn detect_format(&self, bytes: &[u8]) -> Option<EncodeFormat> {
        match image::guess_format(bytes).ok()? {
            ImageFormat::Jpeg => Some(EncodeFormat::Jpeg),
            ImageFormat::Avif => Some(EncodeFormat::Avif),
            _ => None,
        }
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: EncodeFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        if !self.can_encode(format) {
            return Err(BackendError::EncoderUnavailable(format.to_string()));
        }
        match format {
            EncodeFormat::Avif => encode_avif(image, quality),
            EncodeFormat::Jpeg => encode_jpeg(image, quality),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::noisy_png;
    use image::RgbaImage;

    #[test]
    fn decodes_png_bytes() {
        let backend = RustBackend::new();
        let img = backend.decode(&noisy_png(32, 16)).unwrap();
        assert_eq!((img.width(), img.height()), (32, 16));
    }

    #[test]
    fn decode_rejects_non_image() {
        let backend = RustBackend::new();
        let result = backend.decode(b"definitely not an image");
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn jpeg_is_always_encodable() {
        assert!(RustBackend::new().can_encode(EncodeFormat::Jpeg));
    }

    #[test]
    fn jpeg_encode_roundtrips_dimensions() {
        let backend = RustBackend::new();
        let img = backend.decode(&noisy_png(64, 48)).unwrap();
        let jpeg = backend
            .encode(&img, EncodeFormat::Jpeg, Quality::new(80))
            .unwrap();
        assert_eq!(&jpeg[..2], &[0xff, 0xd8]);
        let back = backend.decode(&jpeg).unwrap();
        assert_eq!((back.width(), back.height()), (64, 48));
    }

    #[test]
    fn detects_encodable_containers_only() {
        let backend = RustBackend::new();
        let png = noisy_png(16, 16);
        let img = backend.decode(&png).unwrap();
        let jpeg = backend
            .encode(&img, EncodeFormat::Jpeg, Quality::new(80))
            .unwrap();
        assert_eq!(backend.detect_format(&jpeg), Some(EncodeFormat::Jpeg));
        assert_eq!(backend.detect_format(&png), None);
        assert_eq!(backend.detect_format(b"plain text"), None);
    }

    #[test]
    fn jpeg_encode_drops_alpha() {
        let backend = RustBackend::new();
        let img = DynamicImage::ImageRgba8(RgbaImage::new(8, 8));
        assert!(backend.encode(&img, EncodeFormat::Jpeg, Quality::new(50)).is_ok());
    }

    #[test]
    fn lower_quality_is_smaller() {
        let backend = RustBackend::new();
        let img = backend.decode(&noisy_png(128, 128)).unwrap();
        let high = backend.encode(&img, EncodeFormat::Jpeg, Quality::new(90)).unwrap();
        let low = backend.encode(&img, EncodeFormat::Jpeg, Quality::new(10)).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn resize_is_exact() {
        let backend = RustBackend::new();
        let img = backend.decode(&noisy_png(100, 50)).unwrap();
        let small = backend.resize(&img, 40, 20);
        assert_eq!((small.width(), small.height()), (40, 20));
    }
}
