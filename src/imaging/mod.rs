//! Image size reduction in pure Rust, entirely in memory.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (format sniffed from bytes) |
//! | **Resize** | Lanczos3 via `resize_exact` |
//! | **Encode** | AVIF (rav1e) when enabled, JPEG otherwise |
//! | **Reduce** | [`reduce_image`]: fit to bounds, step quality down, shrink once |
//! | **Pass-through** | [`already_reduced`]: preferred format, in bounds, in budget |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{fit_within, shrink_to_budget};
pub use operations::{
    ReducedImage, already_reduced, get_dimensions, needs_compression, reduce_image,
};
pub use params::{EncodeFormat, Quality, ReduceOptions};
pub use rust_backend::RustBackend;

/// Human-readable byte count: `0 Bytes`, `512 Bytes`, `1.5 KB`, `2 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
