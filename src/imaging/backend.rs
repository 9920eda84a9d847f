//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the operations the size reducer needs:
//! decode, resize, and encode, plus checks for encoder support and the
//! container of already-encoded bytes.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording mock below, whose encoded size is a pure
//! function of dimensions and quality so retry paths are deterministic.

use super::params::{EncodeFormat, Quality};
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("No image encoder available (tried: {0})")]
    EncoderUnavailable(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Pixel dimensions of a decoded or encoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn of(image: &DynamicImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Trait for image processing backends.
///
/// Implementations operate on in-memory buffers only; nothing touches disk.
pub trait ImageBackend: Sync {
    /// Decode raw bytes (any supported container) into pixels.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError>;

    /// Resample to exactly `width` x `height`.
    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage;

    /// Whether an encoder for `format` is compiled in.
    fn can_encode(&self, format: EncodeFormat) -> bool;

    /// Container of already-encoded bytes, when it is one we can also emit.
    fn detect_format(&self, bytes: &[u8]) -> Option<EncodeFormat>;

    /// Encode pixels at the given lossy quality.
    fn encode(
        &self,
        image: &DynamicImage,
        format: EncodeFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError>;
}
