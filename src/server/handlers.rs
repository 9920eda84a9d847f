//! Route handlers.

use axum::Json;
use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::AppState;
use super::error::{
    ApiError, MSG_GENERATION_FAILED, MSG_SHARE_CREATE_FAILED, MSG_SHARE_FETCH_FAILED,
};
use crate::imaging::{BackendError, ReduceOptions, RustBackend, already_reduced, reduce_image};
use crate::preview::{render_error_page, render_not_found_page, render_shared_page};
use crate::share::ShareError;
use crate::types::{
    GenerationResponse, ImageData, ShareRequest, ShareResponse, SharedTweetRecord,
};
use crate::validate::{MenusField, RawGenerationFields, validate_generation};

pub const MSG_NOT_AN_IMAGE: &str = "이미지 파일만 업로드 가능합니다.";
pub const MSG_FILE_TOO_LARGE: &str = "파일 크기는 10MB 이하여야 합니다.";
pub const MSG_IMAGE_UNREADABLE: &str = "이미지를 처리할 수 없습니다. 다른 사진으로 시도해주세요.";
pub const MSG_BAD_SHARE_PAYLOAD: &str = "공유 데이터 형식이 올바르지 않습니다.";
pub const MSG_BAD_REQUEST: &str = "요청 형식이 올바르지 않습니다.";
pub const MSG_IMAGE_NOT_FOUND: &str = "Image not found";

/// Cache policy for served preview images.
pub const IMAGE_CACHE_CONTROL: &str = "public, max-age=86400";

/// Run synchronous work (image codecs, SQLite) on the blocking pool.
async fn blocking<T, F>(failure: &'static str, op: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| ApiError::internal(failure, e))
}

/// Body or form field that could not be read.
fn bad_request(detail: String) -> ApiError {
    warn!(error = %detail, "rejecting malformed request");
    ApiError::Validation(MSG_BAD_REQUEST.to_string())
}

async fn lookup_share(
    state: &AppState,
    id: &str,
) -> Result<Result<SharedTweetRecord, ShareError>, ApiError> {
    let shares = state.shares.clone();
    let id = id.to_string();
    blocking(MSG_SHARE_FETCH_FAILED, move || shares.get_share(&id)).await
}

// =============================================================================
// POST /api/generate-tweet
// =============================================================================

/// Accepts multipart uploads or a JSON body with base64 images.
pub async fn generate_tweet(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<GenerationResponse>, ApiError> {
    let limit = state.config.server.upload_max_bytes;
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let fields = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| bad_request(e.body_text()))?;
        read_multipart(multipart, limit).await?
    } else {
        let Json(fields) = Json::<RawGenerationFields>::from_request(request, &state)
            .await
            .map_err(|e| bad_request(e.body_text()))?;
        if fields.images.iter().any(|image| image.len() > limit) {
            return Err(ApiError::Validation(MSG_FILE_TOO_LARGE.to_string()));
        }
        fields
    };

    let mut request = validate_generation(fields)?;
    if state.config.server.compress_uploads {
        let options = state.config.images.to_reduce_options();
        request.images = compress_images(request.images, options).await?;
    }

    info!(
        images = request.images.len(),
        menus = request.menus.len(),
        satisfaction = %request.satisfaction,
        "generating tweets"
    );
    let response = state.generation.generate(&request).await?;
    if response.variations.is_empty() {
        warn!("model returned no usable variations");
    }
    Ok(Json(response))
}

/// Collect form fields. Repeated `menus` fields form a list; a single one is
/// treated as a JSON-encoded list.
async fn read_multipart(
    mut multipart: Multipart,
    limit: usize,
) -> Result<RawGenerationFields, ApiError> {
    let mut fields = RawGenerationFields::default();
    let mut menus: Vec<String> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "images" => {
                let is_image = field
                    .content_type()
                    .is_some_and(|ct| ct.starts_with("image/"));
                if !is_image {
                    return Err(ApiError::Validation(MSG_NOT_AN_IMAGE.to_string()));
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(e.body_text()))?;
                if bytes.len() > limit {
                    return Err(ApiError::Validation(MSG_FILE_TOO_LARGE.to_string()));
                }
                fields.images.push(ImageData::new(bytes.to_vec()));
            }
            "restaurantName" | "menus" | "satisfaction" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| bad_request(e.body_text()))?;
                match name.as_str() {
                    "restaurantName" => fields.restaurant_name = Some(text),
                    "menus" => menus.push(text),
                    _ => fields.satisfaction = Some(text),
                }
            }
            _ => {}
        }
    }

    fields.menus = match menus.len() {
        0 => None,
        1 => menus.pop().map(MenusField::Encoded),
        _ => Some(MenusField::List(menus)),
    };
    Ok(fields)
}

/// Run every image through the size reducer on a blocking thread, in order.
///
/// Uploads that are already in a preferred format, inside the bounds, and
/// within budget (what the client workflow sends) are kept byte-for-byte.
async fn compress_images(
    images: Vec<ImageData>,
    options: ReduceOptions,
) -> Result<Vec<ImageData>, ApiError> {
    let reduced = blocking(MSG_GENERATION_FAILED, move || {
        let backend = RustBackend::new();
        images
            .into_iter()
            .map(|image| -> Result<ImageData, BackendError> {
                if already_reduced(&backend, image.as_bytes(), &options)? {
                    return Ok(image);
                }
                let reduced = reduce_image(&backend, image.as_bytes(), &options)?;
                Ok(ImageData::new(reduced.bytes))
            })
            .collect::<Result<Vec<_>, _>>()
    })
    .await?;

    match reduced {
        Ok(images) => Ok(images),
        Err(BackendError::Decode(e)) => {
            warn!(error = %e, "rejecting undecodable upload");
            Err(ApiError::Validation(MSG_IMAGE_UNREADABLE.to_string()))
        }
        Err(e) => Err(ApiError::internal(MSG_GENERATION_FAILED, e)),
    }
}

// =============================================================================
// Shares
// =============================================================================

/// `POST /api/share`
pub async fn create_share(
    State(state): State<AppState>,
    payload: Result<Json<ShareRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<ShareResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| {
        warn!(error = %e.body_text(), "rejecting share payload");
        ApiError::Validation(MSG_BAD_SHARE_PAYLOAD.to_string())
    })?;
    let shares = state.shares.clone();
    let share_id = blocking(MSG_SHARE_CREATE_FAILED, move || shares.create_share(request))
        .await?
        .map_err(|e| ApiError::internal(MSG_SHARE_CREATE_FAILED, e))?;
    Ok(Json(ShareResponse { share_id }))
}

/// `GET /api/share/{id}`
pub async fn get_share(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let record = lookup_share(&state, &id)
        .await?
        .map_err(ApiError::from_share_lookup)?;
    Ok(Json(record).into_response())
}

/// `GET /shared/{id}`: preview HTML for link unfurlers.
pub async fn shared_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let lookup = match lookup_share(&state, &id).await {
        Ok(lookup) => lookup,
        Err(e) => {
            error!(error = %e, share_id = %id, "shared page lookup failed");
            return error_page();
        }
    };
    match lookup {
        Ok(record) => {
            let base_url = state.public_base_url(&headers);
            Html(render_shared_page(&record, &base_url).into_string()).into_response()
        }
        Err(ShareError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Html(render_not_found_page().into_string()),
        )
            .into_response(),
        Err(ShareError::InvalidId(_)) => (
            StatusCode::BAD_REQUEST,
            Html(render_not_found_page().into_string()),
        )
            .into_response(),
        Err(ShareError::Store(e)) => {
            error!(error = %e, share_id = %id, "shared page lookup failed");
            error_page()
        }
    }
}

fn error_page() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(render_error_page().into_string()),
    )
        .into_response()
}

/// `GET /shared/{id}/image`: first image of the record, typed by its bytes.
pub async fn shared_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let record = match lookup_share(&state, &id).await? {
        Ok(record) => record,
        Err(ShareError::NotFound(_)) => return Ok(image_not_found()),
        Err(e) => return Err(ApiError::from_share_lookup(e)),
    };
    let Some(image) = record.images.into_iter().next() else {
        return Ok(image_not_found());
    };
    Ok((
        [
            (header::CONTENT_TYPE, image.mime_type()),
            (header::CACHE_CONTROL, IMAGE_CACHE_CONTROL),
        ],
        image.into_bytes(),
    )
        .into_response())
}

fn image_not_found() -> Response {
    (StatusCode::NOT_FOUND, MSG_IMAGE_NOT_FOUND).into_response()
}

// =============================================================================
// Health and fallbacks
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub service: String,
    pub version: String,
    pub environment: String,
}

/// `GET|HEAD /api/health`
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        service: "TweetGenAI".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.environment.clone(),
    })
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}

/// Origin of the current request, honouring reverse-proxy headers.
pub fn base_url_from_headers(headers: &HeaderMap) -> String {
    let get = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(',').next().unwrap_or(v).trim().to_string())
            .filter(|v| !v.is_empty())
    };
    let proto = get("x-forwarded-proto").unwrap_or_else(|| "http".to_string());
    let host = get("x-forwarded-host")
        .or_else(|| get("host"))
        .unwrap_or_else(|| "localhost".to_string());
    format!("{}://{}", proto, host)
}
