//! Share preview pages.
//!
//! `GET /shared/{id}` serves a small HTML document whose only job is to carry
//! Open Graph / Twitter card metadata for link unfurlers, then bounce a real
//! browser to the app (`/?share={id}`) after 100 ms.
//!
//! ## Derived Text
//!
//! | Piece | Rule |
//! |---|---|
//! | Restaurant | name, or `맛집` |
//! | Menu list | first two menus joined by `, `, plus ` 외 N개` for the rest |
//! | Title | `🍽️ {restaurant}에서 {menu list} 먹고 AI가 써준 트윗` |
//! | Description | first 80 characters of the first variation, satisfaction, variation count |
//!
//! Uses [maud](https://maud.lambda.xyz/) so every interpolated value is
//! escaped. The JSON-LD block is serialized with `serde_json`.

use maud::{DOCTYPE, Markup, PreEscaped, html};
use serde_json::json;

use crate::types::SharedTweetRecord;

pub const SITE_NAME: &str = "TweetGenAI";
/// Used when a record has no restaurant name.
pub const DEFAULT_RESTAURANT: &str = "맛집";
/// Characters of the first variation quoted in the description.
pub const EXCERPT_CHARS: usize = 80;
/// Delay before the browser is sent to the app.
pub const REDIRECT_DELAY_MS: u32 = 100;

const NOT_FOUND_TITLE: &str = "공유 링크를 찾을 수 없습니다 - TweetGenAI";
const NOT_FOUND_DESCRIPTION: &str = "요청하신 공유 링크를 찾을 수 없습니다.";
const ERROR_TITLE: &str = "오류 발생 - TweetGenAI";
const ERROR_DESCRIPTION: &str = "페이지를 불러오는 중 오류가 발생했습니다.";

/// `김치찌개, 된장찌개 외 1개`
pub fn menu_list_text(menus: &[String]) -> String {
    let shown = menus.iter().take(2).map(String::as_str).collect::<Vec<_>>().join(", ");
    if menus.len() > 2 {
        format!("{} 외 {}개", shown, menus.len() - 2)
    } else {
        shown
    }
}

/// First `max_chars` characters of `text`.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Title and description for a shared record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewText {
    pub restaurant: String,
    pub menu_list: String,
    pub title: String,
    pub description: String,
}

impl PreviewText {
    pub fn from_record(record: &SharedTweetRecord) -> Self {
        let restaurant = record
            .restaurant_name
            .clone()
            .unwrap_or_else(|| DEFAULT_RESTAURANT.to_string());
        let menu_list = menu_list_text(&record.menus);
        let title = format!("🍽️ {}에서 {} 먹고 AI가 써준 트윗", restaurant, menu_list);
        let quote = record
            .variations
            .first()
            .map(|v| excerpt(&v.content, EXCERPT_CHARS))
            .unwrap_or("");
        let description = format!(
            "\"{}...\" - {} 만족도로 {}가지 톤의 트윗을 생성했어요!",
            quote,
            record.satisfaction,
            record.variations.len()
        );
        Self {
            restaurant,
            menu_list,
            title,
            description,
        }
    }
}

/// Absolute URLs of a shared page and its preview image.
fn share_urls(record: &SharedTweetRecord, base_url: &str) -> (String, Option<String>) {
    let base = base_url.trim_end_matches('/');
    let page = format!("{}/shared/{}", base, record.id);
    let image = (!record.images.is_empty()).then(|| format!("{}/image", page));
    (page, image)
}

/// Serialize a value for inline `<script>` use.
fn script_json(value: &serde_json::Value) -> PreEscaped<String> {
    PreEscaped(value.to_string().replace("</", "<\\/"))
}

fn head_basics(title: &str, description: &str) -> Markup {
    html! {
        meta charset="UTF-8";
        meta name="viewport" content="width=device-width, initial-scale=1.0";
        title { (title) }
        meta name="description" content=(description);
    }
}

/// Preview document for an existing record.
pub fn render_shared_page(record: &SharedTweetRecord, base_url: &str) -> Markup {
    let text = PreviewText::from_record(record);
    let (page_url, image_url) = share_urls(record, base_url);
    let app_url = format!("/?share={}", record.id);

    let json_ld = json!({
        "@context": "https://schema.org",
        "@type": "Article",
        "headline": text.title,
        "description": text.description,
        "author": { "@type": "Organization", "name": SITE_NAME },
        "datePublished": record.created_at.to_rfc3339(),
        "url": page_url,
        "image": image_url.clone().unwrap_or_default(),
    });
    let redirect = format!(
        "setTimeout(function() {{ window.location.href = {}; }}, {});",
        json!(app_url),
        REDIRECT_DELAY_MS
    );

    html! {
        (DOCTYPE)
        html lang="ko" {
            head {
                (head_basics(&text.title, &text.description))

                meta property="og:type" content="article";
                meta property="og:url" content=(page_url);
                meta property="og:title" content=(text.title);
                meta property="og:description" content=(text.description);
                @if let Some(image) = &image_url {
                    meta property="og:image" content=(image);
                }
                meta property="og:image:width" content="1200";
                meta property="og:image:height" content="630";
                meta property="og:site_name" content=(SITE_NAME);

                meta name="twitter:card" content="summary_large_image";
                meta name="twitter:url" content=(page_url);
                meta name="twitter:title" content=(text.title);
                meta name="twitter:description" content=(text.description);
                @if let Some(image) = &image_url {
                    meta name="twitter:image" content=(image);
                }

                meta name="robots" content="index, follow";
                meta name="author" content=(SITE_NAME);

                script type="application/ld+json" { (script_json(&json_ld)) }
                script { (PreEscaped(redirect.replace("</", "<\\/"))) }
            }
            body {
                div style="text-align: center; padding: 50px; font-family: system-ui;" {
                    h2 { "🍽️ " (text.restaurant) }
                    p { (text.menu_list) }
                    p { "AI가 생성한 트윗을 확인하고 있습니다..." }
                    a href=(app_url) style="color: #3b82f6; text-decoration: underline;" {
                        "여기를 클릭하면 바로 확인할 수 있습니다"
                    }
                }
            }
        }
    }
}

/// Document served when no record matches the id.
pub fn render_not_found_page() -> Markup {
    html! {
        (DOCTYPE)
        html lang="ko" {
            head {
                (head_basics(NOT_FOUND_TITLE, NOT_FOUND_DESCRIPTION))
                meta property="og:title" content=(NOT_FOUND_TITLE);
                meta property="og:description" content=(NOT_FOUND_DESCRIPTION);
                meta property="og:type" content="website";
                meta name="twitter:card" content="summary";
            }
            body {
                div style="text-align: center; padding: 50px; font-family: system-ui;" {
                    h2 { (NOT_FOUND_DESCRIPTION) }
                    a href="/" { (SITE_NAME) }
                }
            }
        }
    }
}

/// Document served when the store fails.
pub fn render_error_page() -> Markup {
    html! {
        (DOCTYPE)
        html lang="ko" {
            head {
                (head_basics(ERROR_TITLE, ERROR_DESCRIPTION))
            }
            body {
                div style="text-align: center; padding: 50px; font-family: system-ui;" {
                    h2 { (ERROR_DESCRIPTION) }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::sample_record;

    fn menus(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn menu_list_truncates_after_two() {
        assert_eq!(
            menu_list_text(&menus(&["김치찌개", "된장찌개", "불고기"])),
            "김치찌개, 된장찌개 외 1개"
        );
        assert_eq!(menu_list_text(&menus(&["김치찌개", "된장찌개"])), "김치찌개, 된장찌개");
        assert_eq!(menu_list_text(&menus(&["라면"])), "라면");
        assert_eq!(menu_list_text(&menus(&["a", "b", "c", "d", "e"])), "a, b 외 3개");
    }

    #[test]
    fn excerpt_counts_characters() {
        let long = "가".repeat(100);
        assert_eq!(excerpt(&long, EXCERPT_CHARS).chars().count(), 80);
        assert_eq!(excerpt("짧음", EXCERPT_CHARS), "짧음");
        assert_eq!(excerpt("", 80), "");
    }

    #[test]
    fn title_and_description() {
        let record = sample_record("abc", &["김치찌개", "된장찌개", "불고기"]);
        let text = PreviewText::from_record(&record);
        assert_eq!(
            text.title,
            "🍽️ 을지로 노포에서 김치찌개, 된장찌개 외 1개 먹고 AI가 써준 트윗"
        );
        assert_eq!(
            text.description,
            "\"오늘 김치찌개 진짜 맛있었음...\" - 맛있음 만족도로 3가지 톤의 트윗을 생성했어요!"
        );
    }

    #[test]
    fn default_restaurant_label() {
        let mut record = sample_record("abc", &["냉면"]);
        record.restaurant_name = None;
        let text = PreviewText::from_record(&record);
        assert!(text.title.starts_with("🍽️ 맛집에서 냉면"));
    }

    #[test]
    fn description_without_variations() {
        let mut record = sample_record("abc", &["냉면"]);
        record.variations.clear();
        let text = PreviewText::from_record(&record);
        assert_eq!(
            text.description,
            "\"...\" - 맛있음 만족도로 0가지 톤의 트윗을 생성했어요!"
        );
    }

    #[test]
    fn shared_page_has_social_tags() {
        let record = sample_record("V1StGXR8_Z5jdHi6B-myT", &["김치찌개"]);
        let html = render_shared_page(&record, "https://tweetgen.example/").into_string();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"<meta property="og:type" content="article">"#));
        assert!(html.contains(
            r#"<meta property="og:url" content="https://tweetgen.example/shared/V1StGXR8_Z5jdHi6B-myT">"#
        ));
        assert!(html.contains(
            r#"content="https://tweetgen.example/shared/V1StGXR8_Z5jdHi6B-myT/image""#
        ));
        assert!(html.contains(r#"<meta property="og:image:width" content="1200">"#));
        assert!(html.contains(r#"<meta property="og:site_name" content="TweetGenAI">"#));
        assert!(html.contains(r#"<meta name="twitter:card" content="summary_large_image">"#));
        assert!(html.contains(r#""@type":"Article""#));
        assert!(html.contains(r#"window.location.href = "/?share=V1StGXR8_Z5jdHi6B-myT""#));
        assert!(html.contains(r#"href="/?share=V1StGXR8_Z5jdHi6B-myT""#));
        assert!(html.contains("여기를 클릭하면 바로 확인할 수 있습니다"));
    }

    #[test]
    fn shared_page_without_images_omits_image_tags() {
        let mut record = sample_record("abc", &["김치찌개"]);
        record.images.clear();
        let html = render_shared_page(&record, "http://localhost:5000").into_string();
        assert!(!html.contains("og:image\""));
        assert!(!html.contains("twitter:image"));
        assert!(html.contains(r#""image":"""#));
    }

    #[test]
    fn shared_page_escapes_user_text() {
        let mut record = sample_record("abc", &["<script>alert(1)</script>"]);
        record.restaurant_name = Some("\"quoted\" & co".to_string());
        record.variations[0].content = "</script><b>x</b>".to_string();
        let html = render_shared_page(&record, "http://localhost").into_string();

        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("&quot;quoted&quot; &amp; co"));
        assert!(!html.contains("</script><b>"));
    }

    #[test]
    fn not_found_page_tags() {
        let html = render_not_found_page().into_string();
        assert!(html.contains("<title>공유 링크를 찾을 수 없습니다 - TweetGenAI</title>"));
        assert!(html.contains(r#"<meta property="og:type" content="website">"#));
        assert!(html.contains(r#"<meta name="twitter:card" content="summary">"#));
    }

    #[test]
    fn error_page_title() {
        let html = render_error_page().into_string();
        assert!(html.contains("<title>오류 발생 - TweetGenAI</title>"));
    }
}
