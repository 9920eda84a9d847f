//! OpenAI-compatible chat completions backend.
//!
//! Sends one `POST {api_base}/chat/completions` per prompt with
//! `response_format = json_object`. Images are inlined as
//! base64 `data:` URLs typed by their leading bytes. The HTTP status and the provider's
//! `error.code` decide the [`UpstreamErrorKind`].

use reqwest::StatusCode;
use serde_json::{Value, json};
use tracing::debug;

use super::model::{ModelCapability, Prompt, UpstreamError, UpstreamErrorKind};
use crate::config::ModelConfig;

pub struct OpenAiChat {
    http: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
}

impl OpenAiChat {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }

    /// Request body for `prompt`.
    pub fn build_body(&self, prompt: &Prompt) -> Value {
        let mut user_content = vec![json!({ "type": "text", "text": prompt.user_text })];
        user_content.extend(prompt.images.iter().map(|image| {
            json!({
                "type": "image_url",
                "image_url": { "url": image.to_data_url() },
            })
        }));

        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": prompt.system },
                { "role": "user", "content": user_content },
            ],
            "response_format": { "type": "json_object" },
            "max_tokens": self.max_tokens,
        })
    }
}

/// Map a non-success response to an error kind.
pub fn classify_status(status: StatusCode, provider_code: Option<&str>) -> UpstreamErrorKind {
    if let Some(code) = provider_code {
        if code == "invalid_api_key" {
            return UpstreamErrorKind::ApiKey;
        }
        if code == "insufficient_quota" || code == "rate_limit_exceeded" {
            return UpstreamErrorKind::RateLimit;
        }
        if code.contains("image") {
            return UpstreamErrorKind::Image;
        }
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UpstreamErrorKind::ApiKey,
        StatusCode::TOO_MANY_REQUESTS => UpstreamErrorKind::RateLimit,
        _ => UpstreamErrorKind::Other,
    }
}

/// Pull `error.message` and `error.code` out of a provider error body.
fn provider_error(body: &str) -> (Option<String>, Option<String>) {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return (None, None);
    };
    let error = &value["error"];
    (
        error["message"].as_str().map(str::to_string),
        error["code"].as_str().map(str::to_string),
    )
}

#[async_trait::async_trait]
impl ModelCapability for OpenAiChat {
    async fn complete(&self, prompt: &Prompt) -> Result<String, UpstreamError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            UpstreamError::new(UpstreamErrorKind::ApiKey, "OPENAI_API_KEY is not set")
        })?;

        debug!(model = %self.model, images = prompt.images.len(), "calling chat completions");
        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&self.build_body(prompt))
            .send()
            .await
            .map_err(|e| UpstreamError::new(UpstreamErrorKind::Network, e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let (message, code) = provider_error(&body);
            let kind = classify_status(status, code.as_deref());
            let message = message.unwrap_or_else(|| format!("model endpoint returned {}", status));
            return Err(UpstreamError::new(kind, message));
        }

        let body: Value = resp.json().await.map_err(|e| {
            UpstreamError::new(
                UpstreamErrorKind::Other,
                format!("completion response parse failed: {}", e),
            )
        })?;

        Ok(body["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("{}")
            .to_string())
    }
}
