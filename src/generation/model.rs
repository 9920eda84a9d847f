//! The model capability seam.
//!
//! [`ModelCapability`] is the only thing the generation client knows about
//! the text model: one prompt in, one text blob out. Failures carry an
//! [`UpstreamErrorKind`] chosen by the implementation that observed them,
//! so callers branch on the kind rather than on message text.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::types::ImageData;

/// A fully assembled multimodal prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user_text: String,
    /// Attached after `user_text`, in upload order.
    pub images: Vec<ImageData>,
}

/// Failure category of an upstream model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamErrorKind {
    /// Missing, invalid, or unauthorized credential.
    ApiKey,
    /// Transport failure: DNS, connect, TLS, timeout.
    Network,
    /// Provider throttled the request or the quota is exhausted.
    RateLimit,
    /// Provider rejected an attached image.
    Image,
    Other,
}

impl fmt::Display for UpstreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UpstreamErrorKind::ApiKey => "api_key",
            UpstreamErrorKind::Network => "network",
            UpstreamErrorKind::RateLimit => "rate_limit",
            UpstreamErrorKind::Image => "image",
            UpstreamErrorKind::Other => "other",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct UpstreamError {
    pub kind: UpstreamErrorKind,
    pub message: String,
}

impl UpstreamError {
    pub fn new(kind: UpstreamErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// A text model that accepts a system instruction, user text, and images,
/// and returns a single text completion.
#[async_trait::async_trait]
pub trait ModelCapability: Send + Sync {
    async fn complete(&self, prompt: &Prompt) -> Result<String, UpstreamError>;
}
