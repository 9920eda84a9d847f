//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Scale `original` uniformly so it fits inside `bounds`, never upscaling.
///
/// The factor is `min(max_w / w, max_h / h, 1.0)` and each side is rounded
/// to the nearest pixel, never below 1.
///
/// # Examples
/// ```
/// # use tweetgen::imaging::fit_within;
/// // 4000x3000 landscape into 1200x1200 → 1200x900
/// assert_eq!(fit_within((4000, 3000), (1200, 1200)), (1200, 900));
///
/// // Already small enough → unchanged
/// assert_eq!(fit_within((640, 480), (1200, 1200)), (640, 480));
/// ```
pub fn fit_within(original: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    let (max_w, max_h) = bounds;
    if orig_w == 0 || orig_h == 0 {
        return original;
    }

    let ratio = (max_w as f64 / orig_w as f64)
        .min(max_h as f64 / orig_h as f64)
        .min(1.0);

    scale(original, ratio)
}

/// Dimensions for the terminal shrink step.
///
/// Encoded size grows roughly with pixel count, so shrinking each side by
/// `sqrt(budget / current_size)` targets the budget in one step.
pub fn shrink_to_budget(dimensions: (u32, u32), budget: u64, current_size: u64) -> (u32, u32) {
    if current_size == 0 || budget >= current_size {
        return dimensions;
    }
    let ratio = (budget as f64 / current_size as f64).sqrt();
    scale(dimensions, ratio)
}

fn scale((w, h): (u32, u32), ratio: f64) -> (u32, u32) {
    let new_w = ((w as f64 * ratio).round() as u32).max(1);
    let new_h = ((h as f64 * ratio).round() as u32).max(1);
    (new_w, new_h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_landscape_limited_by_width() {
        assert_eq!(fit_within((4000, 3000), (1200, 1200)), (1200, 900));
    }

    #[test]
    fn fit_portrait_limited_by_height() {
        assert_eq!(fit_within((3000, 4000), (1200, 1200)), (900, 1200));
    }

    #[test]
    fn fit_uses_tighter_bound() {
        // Width ratio 0.5, height ratio 0.25 → 0.25
        assert_eq!(fit_within((2000, 2000), (1000, 500)), (500, 500));
    }

    #[test]
    fn fit_never_upscales() {
        assert_eq!(fit_within((300, 200), (1200, 1200)), (300, 200));
    }

    #[test]
    fn fit_exact_bounds_unchanged() {
        assert_eq!(fit_within((1200, 1200), (1200, 1200)), (1200, 1200));
    }

    #[test]
    fn fit_keeps_at_least_one_pixel() {
        assert_eq!(fit_within((10000, 1), (100, 100)), (100, 1));
    }

    #[test]
    fn fit_preserves_aspect_ratio() {
        let (w, h) = fit_within((4032, 3024), (1200, 1200));
        let original = 4032.0 / 3024.0;
        let scaled = w as f64 / h as f64;
        assert!((original - scaled).abs() < 0.01);
    }

    #[test]
    fn shrink_quarter_budget_halves_sides() {
        assert_eq!(shrink_to_budget((1200, 800), 1_000, 4_000), (600, 400));
    }

    #[test]
    fn shrink_within_budget_is_noop() {
        assert_eq!(shrink_to_budget((1200, 800), 5_000, 4_000), (1200, 800));
    }

    #[test]
    fn shrink_zero_size_is_noop() {
        assert_eq!(shrink_to_budget((1200, 800), 5_000, 0), (1200, 800));
    }
}
