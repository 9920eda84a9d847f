//! Client-side workflow: compress, submit, cache, regenerate, share.
//!
//! This is what the browser client did around the HTTP API, expressed
//! against the [`TweetApi`] trait so the CLI and tests can drive it. Every
//! failure ends up as a localized [`Notice`]; the mapping switches on
//! [`UpstreamErrorKind`] and never inspects message text.

use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::cache::{CachedGeneration, SessionCache};
use crate::generation::UpstreamErrorKind;
use crate::imaging::{BackendError, ReduceOptions, RustBackend, reduce_image};
use crate::types::{
    GenerationRequest, GenerationResponse, ImageData, ShareRequest, SharedTweetRecord,
};
use crate::validate::{RawGenerationFields, ValidationError, validate_generation};

#[derive(Error, Debug)]
pub enum ClientError {
    /// The server answered with an error body.
    #[error("server returned {status}: {message}")]
    Api {
        status: u16,
        message: String,
        kind: Option<UpstreamErrorKind>,
    },
    /// The server could not be reached.
    #[error("network error: {0}")]
    Network(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Image(#[from] BackendError),
    /// The server answered 2xx with a body we could not read.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Category for notice selection.
    pub fn kind(&self) -> Option<UpstreamErrorKind> {
        match self {
            ClientError::Api { kind, .. } => *kind,
            ClientError::Network(_) => Some(UpstreamErrorKind::Network),
            ClientError::Image(_) => Some(UpstreamErrorKind::Image),
            ClientError::Validation(_) | ClientError::Decode(_) => None,
        }
    }

    /// Message suitable for display.
    pub fn display_message(&self) -> String {
        match self {
            ClientError::Api { message, .. } => message.clone(),
            ClientError::Validation(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// The HTTP API as seen by a client.
#[async_trait::async_trait]
pub trait TweetApi: Send + Sync {
    async fn generate(&self, request: &GenerationRequest)
    -> Result<GenerationResponse, ClientError>;
    async fn share(&self, request: &ShareRequest) -> Result<String, ClientError>;
    async fn get_share(&self, id: &str) -> Result<SharedTweetRecord, ClientError>;
}

/// A user-facing message: short title plus one sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
}

impl Notice {
    fn new(title: &str, description: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            description: description.into(),
        }
    }
}

pub const NOTICE_GENERATION_FAILED: &str = "재생성 실패";
pub const NOTICE_SHARE_FAILED: &str = "공유 실패";

pub fn notice_for_error(err: &ClientError) -> Notice {
    match err.kind() {
        Some(UpstreamErrorKind::ApiKey) => {
            Notice::new("API 키 오류", "OpenAI API 키를 확인해주세요.")
        }
        Some(UpstreamErrorKind::Network) => Notice::new(
            "네트워크 오류",
            "인터넷 연결을 확인하고 다시 시도해주세요.",
        ),
        Some(UpstreamErrorKind::RateLimit) => {
            Notice::new("요청 한도 초과", "잠시 후 다시 시도해주세요.")
        }
        Some(UpstreamErrorKind::Image) => Notice::new(
            "이미지 오류",
            "이미지를 처리할 수 없습니다. 다른 사진으로 시도해주세요.",
        ),
        Some(UpstreamErrorKind::Other) | None => {
            Notice::new(NOTICE_GENERATION_FAILED, err.display_message())
        }
    }
}

pub fn notice_for_empty_result() -> Notice {
    Notice::new(
        NOTICE_GENERATION_FAILED,
        "AI가 트윗을 생성하지 못했습니다. 다시 시도해주세요.",
    )
}

fn notice_for_missing_result() -> Notice {
    Notice::new(NOTICE_GENERATION_FAILED, "먼저 트윗을 생성해주세요.")
}

/// Shrink every file under the budget, one at a time, in order.
pub fn compress_files(
    files: &[Vec<u8>],
    options: &ReduceOptions,
) -> Result<Vec<ImageData>, BackendError> {
    let backend = RustBackend::new();
    files
        .iter()
        .map(|bytes| {
            let reduced = reduce_image(&backend, bytes, options)?;
            debug!(
                before = bytes.len(),
                after = reduced.len(),
                quality = %reduced.quality,
                "compressed upload"
            );
            Ok(ImageData::new(reduced.bytes))
        })
        .collect()
}

/// Drives one or more client sessions against a [`TweetApi`].
pub struct Workflow<A> {
    api: A,
    cache: SessionCache,
    options: ReduceOptions,
    compress: bool,
}

impl<A: TweetApi> Workflow<A> {
    pub fn new(api: A, options: ReduceOptions, ttl: Duration) -> Self {
        Self {
            api,
            cache: SessionCache::new(ttl),
            options,
            compress: true,
        }
    }

    /// Send files as given, skipping the size reducer.
    pub fn without_compression(mut self) -> Self {
        self.compress = false;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    /// Compress, validate, submit, and cache the result under `token`.
    ///
    /// `fields.images` is ignored; the images are `files`. A response with
    /// no variations is reported as a notice and not cached.
    pub async fn generate(
        &mut self,
        token: &str,
        files: Vec<Vec<u8>>,
        mut fields: RawGenerationFields,
    ) -> Result<GenerationResponse, Notice> {
        fields.images = if self.compress {
            let options = self.options.clone();
            tokio::task::spawn_blocking(move || compress_files(&files, &options))
                .await
                .map_err(|e| Notice::new(NOTICE_GENERATION_FAILED, e.to_string()))?
                .map_err(|e| notice_for_error(&ClientError::Image(e)))?
        } else {
            files.into_iter().map(ImageData::new).collect()
        };

        let request = validate_generation(fields)
            .map_err(|e| notice_for_error(&ClientError::Validation(e)))?;
        self.submit(token, request).await
    }

    /// A fresh, independent call with the cached inputs for `token`.
    pub async fn regenerate(&mut self, token: &str) -> Result<GenerationResponse, Notice> {
        let cached = self.cache.get(token).ok_or_else(notice_for_missing_result)?;
        self.submit(token, cached.request).await
    }

    async fn submit(
        &mut self,
        token: &str,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, Notice> {
        let response = self
            .api
            .generate(&request)
            .await
            .map_err(|e| notice_for_error(&e))?;
        if response.variations.is_empty() {
            return Err(notice_for_empty_result());
        }
        info!(token, variations = response.variations.len(), "generation cached");
        self.cache.put(
            token,
            CachedGeneration {
                request,
                response: response.clone(),
            },
        );
        Ok(response)
    }

    /// Share the cached result for `token`; returns `{origin}/shared/{id}`.
    pub async fn share(&mut self, token: &str, origin: &str) -> Result<String, Notice> {
        let cached = self.cache.get(token).ok_or_else(notice_for_missing_result)?;
        let request = ShareRequest::from_generation(&cached.request, cached.response.variations);
        let id = self
            .api
            .share(&request)
            .await
            .map_err(|e| Notice::new(NOTICE_SHARE_FAILED, e.display_message()))?;
        Ok(share_url(origin, &id))
    }

    pub fn cached(&mut self, token: &str) -> Option<CachedGeneration> {
        self.cache.get(token)
    }
}

pub fn share_url(origin: &str, id: &str) -> String {
    format!("{}/shared/{}", origin.trim_end_matches('/'), id)
}
