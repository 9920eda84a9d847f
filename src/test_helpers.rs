//! Shared test utilities for the tweetgen test suite.
//!
//! Provides in-memory image fixtures and request builders so unit tests in
//! different modules agree on what a "valid upload" looks like.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let png = noisy_png(64, 48);
//! let request = sample_request(vec![png]);
//! assert_eq!(request.menus, vec!["김치찌개"]);
//! ```

use chrono::{TimeZone, Utc};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

use crate::types::{
    GenerationRequest, ImageData, Satisfaction, ShareRequest, SharedTweetRecord, Tone,
    TweetVariation,
};

// =========================================================================
// Image fixtures
// =========================================================================

/// Deterministic noisy PNG. Noise keeps encoders from compressing it away,
/// so size-budget paths are actually exercised.
pub fn noisy_png(width: u32, height: u32) -> Vec<u8> {
    let mut state: u32 = 0x1234_5678;
    let img = RgbImage::from_fn(width, height, |_, _| {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let [r, g, b, _] = state.to_le_bytes();
        Rgb([r, g, b])
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

// =========================================================================
// Domain fixtures
// =========================================================================

pub fn variation(content: &str, tone: Tone) -> TweetVariation {
    TweetVariation {
        content: content.to_string(),
        tone,
    }
}

/// One-menu, "맛있음" request over the given image payloads.
pub fn sample_request(images: Vec<Vec<u8>>) -> GenerationRequest {
    GenerationRequest {
        images: images.into_iter().map(ImageData::new).collect(),
        restaurant_name: None,
        menus: vec!["김치찌개".to_string()],
        satisfaction: Satisfaction::Tasty,
    }
}

pub fn sample_share(menus: &[&str]) -> ShareRequest {
    ShareRequest {
        images: vec![ImageData::new(vec![0xff, 0xd8, 0xff, 0xe0])],
        restaurant_name: Some("을지로 노포".to_string()),
        menus: menus.iter().map(|m| m.to_string()).collect(),
        satisfaction: Satisfaction::Tasty,
        variations: vec![
            variation("오늘 김치찌개 진짜 맛있었음", Tone::Honest),
            variation("김치찌개 먹고 인생 2회차 시작함", Tone::Meme),
            variation("이 집 모르면 간첩", Tone::Extreme),
        ],
    }
}

pub fn sample_record(id: &str, menus: &[&str]) -> SharedTweetRecord {
    let share = sample_share(menus);
    SharedTweetRecord {
        id: id.to_string(),
        images: share.images,
        restaurant_name: share.restaurant_name,
        menus: share.menus,
        satisfaction: share.satisfaction,
        variations: share.variations,
        created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
    }
}
