//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Compress
//!
//! ```text
//! 001 dinner.png
//!     2.4 MB → 812.5 KB (jpg, 1200x900, quality 70%)
//! ```
//!
//! ## Generate
//!
//! ```text
//! 001 [솔직톤] 오늘 김치찌개 진짜 맛있었음
//! 002 [드립톤] 김치찌개 먹고 인생 2회차 시작함
//! 003 [극단톤] 이 집 모르면 간첩
//! ```
//!
//! ## Show
//!
//! ```text
//! V1StGXR8_Z5jdHi6B-myT 을지로 노포 (맛있음)
//!     Menus: 김치찌개, 된장찌개 외 1개
//!     Images: 1
//!     Created: 2026-03-01T12:00:00+00:00
//!     001 [솔직톤] 오늘 김치찌개 진짜 맛있었음
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::imaging::{ReducedImage, format_file_size};
use crate::preview::{DEFAULT_RESTAURANT, menu_list_text};
use crate::session::Notice;
use crate::types::{GenerationResponse, SharedTweetRecord, TweetVariation};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn variation_line(index: usize, variation: &TweetVariation) -> String {
    format!("{} [{}] {}", format_index(index), variation.tone, variation.content)
}

// ============================================================================
// Compress
// ============================================================================

pub fn format_compress_result(
    index: usize,
    name: &str,
    original_len: usize,
    reduced: &ReducedImage,
) -> Vec<String> {
    let mut detail = format!(
        "{}{} → {} ({}, {}x{}, quality {})",
        indent(1),
        format_file_size(original_len as u64),
        format_file_size(reduced.len() as u64),
        reduced.format,
        reduced.dimensions.width,
        reduced.dimensions.height,
        reduced.quality
    );
    if reduced.shrunk {
        detail.push_str(", shrunk");
    }
    vec![format!("{} {}", format_index(index), name), detail]
}

pub fn print_compress_result(index: usize, name: &str, original_len: usize, reduced: &ReducedImage) {
    for line in format_compress_result(index, name, original_len, reduced) {
        println!("{}", line);
    }
}

// ============================================================================
// Generate / share
// ============================================================================

pub fn format_variations(response: &GenerationResponse) -> Vec<String> {
    response
        .variations
        .iter()
        .enumerate()
        .map(|(i, v)| variation_line(i + 1, v))
        .collect()
}

pub fn print_variations(response: &GenerationResponse) {
    for line in format_variations(response) {
        println!("{}", line);
    }
}

pub fn format_share_link(url: &str) -> String {
    format!("Shared: {}", url)
}

pub fn print_share_link(url: &str) {
    println!("{}", format_share_link(url));
}

pub fn format_record(record: &SharedTweetRecord) -> Vec<String> {
    let restaurant = record
        .restaurant_name
        .as_deref()
        .unwrap_or(DEFAULT_RESTAURANT);
    let mut lines = vec![
        format!("{} {} ({})", record.id, restaurant, record.satisfaction),
        format!("{}Menus: {}", indent(1), menu_list_text(&record.menus)),
        format!("{}Images: {}", indent(1), record.images.len()),
        format!("{}Created: {}", indent(1), record.created_at.to_rfc3339()),
    ];
    lines.extend(
        record
            .variations
            .iter()
            .enumerate()
            .map(|(i, v)| format!("{}{}", indent(1), variation_line(i + 1, v))),
    );
    lines
}

pub fn print_record(record: &SharedTweetRecord) {
    for line in format_record(record) {
        println!("{}", line);
    }
}

// ============================================================================
// Notices
// ============================================================================

pub fn format_notice(notice: &Notice) -> String {
    format!("{}: {}", notice.title, notice.description)
}

pub fn print_notice(notice: &Notice) {
    eprintln!("{}", format_notice(notice));
}
