//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between [`operations`](super::operations) (which decides how
//! many encodes to try and at what size) and the [`backend`](super::backend)
//! (which does the pixel work). Swapping the backend for a mock changes no
//! operation logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality as a percentage (1–100, default 80). Clamped on construction.
//! - [`EncodeFormat`]: Output container: AVIF when the build has an encoder for it, JPEG everywhere.
//! - [`ReduceOptions`]: Everything a size reduction needs: bounds, starting quality, byte budget, format preference.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Lower quality by `points`, never below 1.
    pub fn step_down(self, points: u32) -> Self {
        Self::new(self.0.saturating_sub(points))
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Lossy output formats, most space-efficient first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodeFormat {
    Avif,
    Jpeg,
}

impl EncodeFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            EncodeFormat::Avif => "image/avif",
            EncodeFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            EncodeFormat::Avif => "avif",
            EncodeFormat::Jpeg => "jpg",
        }
    }
}

impl fmt::Display for EncodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Constraints for [`reduce_image`](super::operations::reduce_image).
#[derive(Debug, Clone, PartialEq)]
pub struct ReduceOptions {
    pub max_width: u32,
    pub max_height: u32,
    /// Quality of the first encode attempt.
    pub quality: Quality,
    /// Byte budget for the encoded output.
    pub max_file_size: u64,
    /// Output formats in order of preference. The first one the backend can
    /// encode is used for every attempt.
    pub formats: Vec<EncodeFormat>,
}

impl Default for ReduceOptions {
    fn default() -> Self {
        Self {
            max_width: 1200,
            max_height: 1200,
            quality: Quality::default(),
            max_file_size: 2 * 1024 * 1024,
            formats: vec![EncodeFormat::Jpeg],
        }
    }
}
