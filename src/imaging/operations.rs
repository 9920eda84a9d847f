//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take constraints, compute dimensions, and call the backend.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{fit_within, shrink_to_budget};
use super::params::{EncodeFormat, Quality, ReduceOptions};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Quality is lowered in steps of this many points while over budget.
pub const QUALITY_STEP: u32 = 10;
/// The quality loop stops once quality is at or below this value.
pub const QUALITY_FLOOR: u32 = 10;
/// Quality used for the single encode after the terminal shrink.
pub const FALLBACK_QUALITY: Quality = Quality(70);

/// Encoded output of [`reduce_image`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedImage {
    pub bytes: Vec<u8>,
    pub format: EncodeFormat,
    pub dimensions: Dimensions,
    pub quality: Quality,
    /// True when the quality loop was not enough and the terminal shrink ran.
    pub shrunk: bool,
}

impl ReducedImage {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn within_budget(&self, options: &ReduceOptions) -> bool {
        self.bytes.len() as u64 <= options.max_file_size
    }
}

/// Get image dimensions by decoding with the backend.
pub fn get_dimensions(backend: &impl ImageBackend, bytes: &[u8]) -> Result<Dimensions> {
    Ok(Dimensions::of(&backend.decode(bytes)?))
}

/// Whether `len` bytes exceed the budget in `options`.
pub fn needs_compression(len: usize, options: &ReduceOptions) -> bool {
    len as u64 > options.max_file_size
}

/// Whether `source` can be used unchanged: already in one of the preferred
/// formats, within the byte budget, and inside the bounds.
///
/// Only decodes when the cheap checks pass, so undecodable bytes in a
/// recognised container are still a [`BackendError::Decode`].
pub fn already_reduced(
    backend: &impl ImageBackend,
    source: &[u8],
    options: &ReduceOptions,
) -> Result<bool> {
    let preferred = backend
        .detect_format(source)
        .is_some_and(|format| options.formats.contains(&format));
    if !preferred || needs_compression(source.len(), options) {
        return Ok(false);
    }
    let dims = get_dimensions(backend, source)?;
    Ok(dims.width <= options.max_width && dims.height <= options.max_height)
}

/// Pick the first preferred format the backend can encode.
fn select_format(backend: &impl ImageBackend, options: &ReduceOptions) -> Result<EncodeFormat> {
    options
        .formats
        .iter()
        .copied()
        .find(|f| backend.can_encode(*f))
        .ok_or_else(|| {
            let tried: Vec<String> = options.formats.iter().map(|f| f.to_string()).collect();
            BackendError::EncoderUnavailable(tried.join(", "))
        })
}

/// Re-encode `source` so it fits `options.max_file_size` whenever achievable.
///
/// 1. Fit inside `max_width` x `max_height` (uniform scale, never upscale).
/// 2. Encode at `options.quality`.
/// 3. While over budget and quality > 10: lower quality by 10 and re-encode
///    at the same dimensions.
/// 4. Still over budget: shrink each side by `sqrt(budget / size)`, resample
///    from the original decoded pixels, and encode once at quality 70.
///
/// Step 4 is best effort and not guaranteed to meet the budget. If it
/// produces something larger than the quality-floor attempt, the smaller
/// of the two is returned.
pub fn reduce_image(
    backend: &impl ImageBackend,
    source: &[u8],
    options: &ReduceOptions,
) -> Result<ReducedImage> {
    let original = backend.decode(source)?;
    let format = select_format(backend, options)?;

    let original_dims = Dimensions::of(&original);
    let (width, height) = fit_within(
        original_dims.as_tuple(),
        (options.max_width, options.max_height),
    );
    let resized = if (width, height) == original_dims.as_tuple() {
        None
    } else {
        Some(backend.resize(&original, width, height))
    };
    let working = resized.as_ref().unwrap_or(&original);

    let mut quality = options.quality;
    let mut bytes = backend.encode(working, format, quality)?;
    while needs_compression(bytes.len(), options) && quality.value() > QUALITY_FLOOR {
        quality = quality.step_down(QUALITY_STEP);
        bytes = backend.encode(working, format, quality)?;
    }

    let best_effort = ReducedImage {
        bytes,
        format,
        dimensions: Dimensions { width, height },
        quality,
        shrunk: false,
    };
    if !needs_compression(best_effort.len(), options) {
        return Ok(best_effort);
    }

    let (small_w, small_h) = shrink_to_budget(
        (width, height),
        options.max_file_size,
        best_effort.len() as u64,
    );
    let smaller = backend.resize(&original, small_w, small_h);
    let bytes = backend.encode(&smaller, format, FALLBACK_QUALITY)?;
    if bytes.len() > best_effort.len() {
        return Ok(best_effort);
    }

    Ok(ReducedImage {
        bytes,
        format,
        dimensions: Dimensions {
            width: small_w,
            height: small_h,
        },
        quality: FALLBACK_QUALITY,
        shrunk: true,
    })
}
