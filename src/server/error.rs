//! HTTP error mapping.
//!
//! Every failure leaves the server as `{"message": ...}` with a status code
//! chosen here. Upstream model failures also carry `"kind"` so clients can
//! pick a notice without reading the message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::generation::{UpstreamError, UpstreamErrorKind};
use crate::share::ShareError;
use crate::validate::ValidationError;

pub const MSG_GENERATION_FAILED: &str = "트윗 생성 중 오류가 발생했습니다";
pub const MSG_SHARE_CREATE_FAILED: &str = "공유 링크 생성 중 오류가 발생했습니다.";
pub const MSG_SHARE_FETCH_FAILED: &str = "공유 트윗을 가져오는 중 오류가 발생했습니다.";
pub const MSG_SHARE_NOT_FOUND: &str = "공유 링크를 찾을 수 없습니다.";
pub const MSG_INVALID_ID: &str = "유효하지 않은 ID입니다.";
pub const MSG_METHOD_NOT_ALLOWED: &str = "Method not allowed";

/// Wire shape of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<UpstreamErrorKind>,
}

#[derive(Error, Debug)]
pub enum ApiError {
    /// Input rejected. HTTP 400.
    #[error("{0}")]
    Validation(String),
    /// No such resource. HTTP 404.
    #[error("{0}")]
    NotFound(String),
    /// HTTP 405.
    #[error("method not allowed")]
    MethodNotAllowed,
    /// Model call failed. HTTP 500.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    /// Storage or other server-side failure. HTTP 500.
    #[error("{message}: {detail}")]
    Internal { message: String, detail: String },
}

impl ApiError {
    pub fn internal(message: &str, detail: impl ToString) -> Self {
        ApiError::Internal {
            message: message.to_string(),
            detail: detail.to_string(),
        }
    }

    /// Map a share lookup failure.
    pub fn from_share_lookup(err: ShareError) -> Self {
        match err {
            ShareError::InvalidId(_) => ApiError::Validation(MSG_INVALID_ID.to_string()),
            ShareError::NotFound(_) => ApiError::NotFound(MSG_SHARE_NOT_FOUND.to_string()),
            ShareError::Store(e) => ApiError::internal(MSG_SHARE_FETCH_FAILED, e),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Upstream(_) | ApiError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::Validation(message) | ApiError::NotFound(message) => ErrorBody {
                message: message.clone(),
                kind: None,
            },
            ApiError::MethodNotAllowed => ErrorBody {
                message: MSG_METHOD_NOT_ALLOWED.to_string(),
                kind: None,
            },
            ApiError::Upstream(e) => ErrorBody {
                message: format!("{}: {}", MSG_GENERATION_FAILED, e.message),
                kind: Some(e.kind),
            },
            ApiError::Internal { message, .. } => ErrorBody {
                message: message.clone(),
                kind: None,
            },
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.user_message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(self.body())).into_response()
    }
}
