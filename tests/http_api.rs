//! Router-level tests: real handlers, a scripted model, an in-memory store.
//!
//! Requests go through `tower::ServiceExt::oneshot`, so no socket is bound.
//! Upload compression is off unless a test builds the app with
//! [`app_compressing`]; the other payloads are not real images.

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::{Value, json};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use tweetgen::config::AppConfig;
use tweetgen::generation::{
    GenerationClient, ModelCapability, Prompt, UpstreamError, UpstreamErrorKind,
};
use tweetgen::server::{AppState, ErrorBody, HealthStatus, build_router};
use tweetgen::session::compress_files;
use tweetgen::share::{MemoryShareStore, ShareService};
use tweetgen::types::{GenerationResponse, ImageData, ShareResponse, SharedTweetRecord, Tone};

const HONEST_REPLY: &str = r#"{"variations":[{"content":"오늘 김치찌개 진짜 맛있었음","tone":"솔직톤"}]}"#;

struct FixedModel {
    reply: Result<String, UpstreamError>,
    prompts: Mutex<Vec<Prompt>>,
}

impl FixedModel {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing(kind: UpstreamErrorKind) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(UpstreamError::new(kind, "upstream said no")),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelCapability for FixedModel {
    async fn complete(&self, prompt: &Prompt) -> Result<String, UpstreamError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        self.reply.clone()
    }
}

fn app_with(model: Arc<FixedModel>) -> Router {
    let mut config = AppConfig::default();
    config.server.compress_uploads = false;
    router(config, model)
}

/// Stock config: uploads go through the size reducer.
fn app_compressing(model: Arc<FixedModel>) -> Router {
    router(AppConfig::default(), model)
}

fn router(config: AppConfig, model: Arc<FixedModel>) -> Router {
    let state = AppState::new(
        config,
        GenerationClient::new(model),
        ShareService::new(Arc::new(MemoryShareStore::new())),
    );
    build_router(state)
}

fn app() -> Router {
    app_with(FixedModel::replying(HONEST_REPLY))
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::HOST, "tweetgen.test")
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn images(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| ImageData::new(vec![0xFF, 0xD8, i as u8]).to_base64())
        .collect()
}

/// PNG of pseudo-random pixels, so encoders cannot shrink it much.
fn noisy_png(width: u32, height: u32) -> Vec<u8> {
    let mut state: u32 = 0x9e37_79b9;
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

fn generation_body(image_count: usize) -> Value {
    json!({
        "images": images(image_count),
        "restaurantName": "을지로 노포",
        "menus": ["김치찌개"],
        "satisfaction": "맛있음",
    })
}

/// Build a multipart body by hand: text fields, then `images` file parts.
fn multipart_request(fields: &[(&str, &str)], files: &[(&str, &[u8])]) -> Request<Body> {
    let boundary = "tweetgen-test-boundary";
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (i, (content_type, bytes)) in files.iter().enumerate() {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"photo-{i}.jpg\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/generate-tweet")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn create_share(app: &Router, image_count: usize) -> String {
    let payload = json!({
        "images": images(image_count),
        "restaurantName": "을지로 노포",
        "menus": ["김치찌개", "된장찌개"],
        "satisfaction": "맛있음",
        "variations": [{"content": "오늘 김치찌개 진짜 맛있었음", "tone": "솔직톤"}],
    });
    let response = app
        .clone()
        .oneshot(post_json("/api/share", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: ShareResponse = body_json(response).await;
    body.share_id
}

// =============================================================================
// Generation
// =============================================================================

#[tokio::test]
async fn json_generation_returns_variations() {
    let model = FixedModel::replying(HONEST_REPLY);
    let response = app_with(model.clone())
        .oneshot(post_json("/api/generate-tweet", &generation_body(1)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: GenerationResponse = body_json(response).await;
    assert_eq!(body.variations.len(), 1);
    assert_eq!(body.variations[0].tone, Tone::Honest);
    assert_eq!(body.variations[0].content, "오늘 김치찌개 진짜 맛있었음");
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn unusable_model_reply_is_empty_list() {
    let response = app_with(FixedModel::replying("sorry, no JSON today"))
        .oneshot(post_json("/api/generate-tweet", &generation_body(1)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = body_json(response).await;
    assert_eq!(body, json!({"variations": []}));
}

#[tokio::test]
async fn no_images_is_rejected_before_model_call() {
    let model = FixedModel::replying(HONEST_REPLY);
    let response = app_with(model.clone())
        .oneshot(post_json("/api/generate-tweet", &generation_body(0)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body.message, "이미지를 하나 이상 업로드해주세요.");
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn five_images_is_rejected() {
    let model = FixedModel::replying(HONEST_REPLY);
    let response = app_with(model.clone())
        .oneshot(post_json("/api/generate-tweet", &generation_body(5)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body.message, "이미지는 최대 4개까지 업로드할 수 있습니다.");
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn unknown_satisfaction_is_rejected() {
    let mut body = generation_body(1);
    body["satisfaction"] = json!("최고");
    let response = app()
        .oneshot(post_json("/api/generate-tweet", &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body.message, "만족도를 선택해주세요.");
}

#[tokio::test]
async fn upstream_failure_carries_kind() {
    let response = app_with(FixedModel::failing(UpstreamErrorKind::RateLimit))
        .oneshot(post_json("/api/generate-tweet", &generation_body(1)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body.kind, Some(UpstreamErrorKind::RateLimit));
}

#[tokio::test]
async fn multipart_generation_with_encoded_menus() {
    let model = FixedModel::replying(HONEST_REPLY);
    let request = multipart_request(
        &[
            ("restaurantName", "을지로 노포"),
            ("menus", r#"["김치찌개","계란말이"]"#),
            ("satisfaction", "맛있음"),
        ],
        &[("image/jpeg", &[0xFF, 0xD8, 0xFF]), ("image/png", &[0x89, b'P'])],
    );
    let response = app_with(model.clone()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: GenerationResponse = body_json(response).await;
    assert_eq!(body.variations.len(), 1);

    let prompts = model.prompts.lock().unwrap();
    assert_eq!(prompts[0].images.len(), 2);
    assert!(prompts[0].user_text.contains("김치찌개"));
    assert!(prompts[0].user_text.contains("계란말이"));
}

#[tokio::test]
async fn multipart_rejects_non_image_part() {
    let request = multipart_request(
        &[("menus", r#"["김치찌개"]"#), ("satisfaction", "맛있음")],
        &[("text/plain", b"hello")],
    );
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body.message, "이미지 파일만 업로드 가능합니다.");
}

#[tokio::test]
async fn malformed_json_body_gets_localized_message() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/generate-tweet")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"images\": 42"))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body.message, "요청 형식이 올바르지 않습니다.");
}

// =============================================================================
// Upload reduction
// =============================================================================

const MENU_FIELDS: [(&str, &str); 2] = [("menus", r#"["김치찌개"]"#), ("satisfaction", "맛있음")];

#[tokio::test]
async fn png_upload_reaches_model_as_jpeg_within_budget() {
    let model = FixedModel::replying(HONEST_REPLY);
    let png = noisy_png(400, 300);
    let request = multipart_request(&MENU_FIELDS, &[("image/png", &png)]);
    let response = app_compressing(model.clone()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let prompts = model.prompts.lock().unwrap();
    let sent = prompts[0].images[0].as_bytes();
    assert_eq!(&sent[..2], &[0xff, 0xd8], "model receives JPEG");
    assert!(sent.len() as u64 <= AppConfig::default().images.max_file_size);
    assert!(sent.len() < png.len());
}

#[tokio::test]
async fn client_reduced_upload_reaches_model_unchanged() {
    let model = FixedModel::replying(HONEST_REPLY);
    let options = AppConfig::default().images.to_reduce_options();
    let reduced = compress_files(&[noisy_png(400, 300)], &options).unwrap();
    let client_bytes = reduced[0].as_bytes().to_vec();

    let request = multipart_request(&MENU_FIELDS, &[("image/jpeg", &client_bytes)]);
    let response = app_compressing(model.clone()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let prompts = model.prompts.lock().unwrap();
    assert_eq!(prompts[0].images[0].as_bytes(), client_bytes.as_slice());
}

#[tokio::test]
async fn undecodable_upload_is_rejected_with_message() {
    let model = FixedModel::replying(HONEST_REPLY);
    let request = multipart_request(&MENU_FIELDS, &[("image/jpeg", b"not really a jpeg")]);
    let response = app_compressing(model.clone()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(
        body.message,
        "이미지를 처리할 수 없습니다. 다른 사진으로 시도해주세요."
    );
    assert_eq!(model.calls(), 0);
}

// =============================================================================
// Shares
// =============================================================================

#[tokio::test]
async fn share_round_trip() {
    let app = app();
    let id = create_share(&app, 1).await;
    assert_eq!(id.len(), 21);

    let response = app
        .oneshot(get(&format!("/api/share/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let record: SharedTweetRecord = body_json(response).await;
    assert_eq!(record.id, id);
    assert_eq!(record.restaurant_name.as_deref(), Some("을지로 노포"));
    assert_eq!(record.menus, vec!["김치찌개", "된장찌개"]);
    assert_eq!(record.variations.len(), 1);
    assert_eq!(record.images.len(), 1);
}

#[tokio::test]
async fn same_payload_twice_gives_two_ids() {
    let app = app();
    let first = create_share(&app, 1).await;
    let second = create_share(&app, 1).await;
    assert_ne!(first, second);
}

#[tokio::test]
async fn unknown_share_is_404_with_message() {
    let response = app()
        .oneshot(get("/api/share/unknown-id-xyz"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body.message, "공유 링크를 찾을 수 없습니다.");
    assert_eq!(body.kind, None);
}

#[tokio::test]
async fn malformed_share_id_is_400() {
    let response = app().oneshot(get("/api/share/bad.id")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body.message, "유효하지 않은 ID입니다.");
}

#[tokio::test]
async fn malformed_share_payload_is_400() {
    let response = app()
        .oneshot(post_json("/api/share", &json!({"menus": "nope"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Preview page and image
// =============================================================================

#[tokio::test]
async fn shared_page_has_preview_tags() {
    let app = app();
    let id = create_share(&app, 1).await;

    let response = app
        .oneshot(get(&format!("/shared/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/html"));

    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains(r#"<meta property="og:type" content="article">"#));
    assert!(html.contains(&format!(
        r#"<meta property="og:image" content="http://tweetgen.test/shared/{id}/image">"#
    )));
    assert!(html.contains("을지로 노포"));
}

#[tokio::test]
async fn shared_page_for_unknown_id_is_404_html() {
    let response = app().oneshot(get("/shared/unknown-id-xyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/html"));
}

#[tokio::test]
async fn shared_image_serves_first_image() {
    let app = app();
    let id = create_share(&app, 2).await;

    let response = app
        .oneshot(get(&format!("/shared/{id}/image")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "public, max-age=86400"
    );
    assert_eq!(body_bytes(response).await, vec![0xFF, 0xD8, 0]);
}

#[tokio::test]
async fn shared_image_content_type_follows_bytes() {
    let app = app();
    let png = noisy_png(8, 8);
    let payload = json!({
        "images": [ImageData::new(png.clone()).to_base64()],
        "menus": ["냉면"],
        "satisfaction": "개쩜",
        "variations": [],
    });
    let response = app
        .clone()
        .oneshot(post_json("/api/share", &payload))
        .await
        .unwrap();
    let ShareResponse { share_id } = body_json(response).await;

    let response = app
        .oneshot(get(&format!("/shared/{share_id}/image")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(body_bytes(response).await, png);
}

#[tokio::test]
async fn shared_image_without_images_is_404() {
    let app = app();
    let id = create_share(&app, 0).await;

    let response = app
        .oneshot(get(&format!("/shared/{id}/image")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_bytes(response).await, b"Image not found");
}

// =============================================================================
// Health and fallbacks
// =============================================================================

#[tokio::test]
async fn health_reports_environment() {
    let response = app().oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: HealthStatus = body_json(response).await;
    assert_eq!(body.status, "healthy");
    assert_eq!(body.service, "TweetGenAI");
    assert_eq!(body.environment, "development");
}

#[tokio::test]
async fn wrong_method_is_405_json() {
    let response = app().oneshot(get("/api/generate-tweet")).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body.message, "Method not allowed");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let response = app().oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
