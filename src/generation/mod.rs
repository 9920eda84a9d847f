//! Tweet draft generation.
//!
//! - **Model**: [`ModelCapability`] trait, [`UpstreamError`] and its kinds
//! - **Prompt**: fixed system instruction and per-request user text
//! - **OpenAI**: [`OpenAiChat`], the reqwest-backed model
//! - **Client**: [`GenerationClient`], prompt → call → soft-degrade parse

pub mod client;
pub mod model;
pub mod openai;
pub mod prompt;

pub use client::{GenerateError, GenerationClient, MAX_VARIATIONS, parse_variations};
pub use model::{ModelCapability, Prompt, UpstreamError, UpstreamErrorKind};
pub use openai::OpenAiChat;
pub use prompt::{SYSTEM_PROMPT, build_prompt, user_prompt};
