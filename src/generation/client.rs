//! Tweet generation client.
//!
//! Validated request → prompt → one model call → parsed variations. The
//! model's reply is untrusted text: anything that is not the expected JSON
//! shape degrades to fewer (possibly zero) variations instead of an error.

use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use super::model::{ModelCapability, UpstreamError};
use super::prompt::build_prompt;
use crate::types::{GenerationRequest, GenerationResponse, TweetVariation};
use crate::validate::{RawGenerationFields, ValidationError, validate_generation};

/// At most one variation per tone.
pub const MAX_VARIATIONS: usize = 3;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

#[derive(Clone)]
pub struct GenerationClient {
    model: Arc<dyn ModelCapability>,
}

impl GenerationClient {
    pub fn new(model: Arc<dyn ModelCapability>) -> Self {
        Self { model }
    }

    /// Generate variations for an already validated request.
    ///
    /// Exactly one model call, no retry.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, UpstreamError> {
        let prompt = build_prompt(request);
        let text = self.model.complete(&prompt).await?;
        Ok(GenerationResponse {
            variations: parse_variations(&text),
        })
    }

    /// Validate `fields`, then [`generate`](Self::generate). Invalid input
    /// never reaches the model.
    pub async fn generate_from_fields(
        &self,
        fields: RawGenerationFields,
    ) -> Result<(GenerationRequest, GenerationResponse), GenerateError> {
        let request = validate_generation(fields)?;
        let response = self.generate(&request).await?;
        Ok((request, response))
    }
}

/// Extract `variations` from a model reply.
///
/// Invalid JSON, a missing field, or a non-array yields an empty list.
/// Entries that are not `{content, tone}` with a known tone are skipped.
pub fn parse_variations(text: &str) -> Vec<TweetVariation> {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "model reply is not JSON, returning no variations");
            return Vec::new();
        }
    };

    let Some(entries) = value.get("variations").and_then(Value::as_array) else {
        warn!("model reply has no variations array");
        return Vec::new();
    };

    let mut variations = Vec::with_capacity(MAX_VARIATIONS);
    for entry in entries {
        match serde_json::from_value::<TweetVariation>(entry.clone()) {
            Ok(variation) => variations.push(variation),
            Err(e) => warn!(error = %e, "skipping malformed variation"),
        }
        if variations.len() == MAX_VARIATIONS {
            break;
        }
    }
    variations
}
