//! # TweetGen
//!
//! A small web service that turns food photographs into short tweet drafts
//! in three tones (솔직톤, 드립톤, 극단톤), with shareable links that render
//! Open Graph and Twitter-card previews.
//!
//! # Architecture: Request Flow
//!
//! ```text
//! client   photos  →  reducer  →  multipart POST /api/generate-tweet
//! server   fields  →  validate →  prompt → model → parse → 0..3 variations
//! share    result  →  POST /api/share → store → /shared/{id} preview page
//! ```
//!
//! Every stage past the HTTP edge works on owned, validated types, so the
//! generation and share logic can be tested without a socket: the model sits
//! behind [`generation::ModelCapability`] and storage behind
//! [`share::ShareStore`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | Wire types: requests, variations, share records |
//! | [`validate`] | Normalizes raw form/JSON fields into a [`types::GenerationRequest`] |
//! | [`imaging`] | Pure-Rust image reducer: fit, quality ladder, shrink fallback |
//! | [`generation`] | Prompt construction, OpenAI chat client, variation parsing |
//! | [`share`] | Share ids, SQLite and in-memory stores |
//! | [`preview`] | Maud-rendered preview page for shared links |
//! | [`server`] | axum router, handlers, and the JSON error envelope |
//! | [`config`] | `tweetgen.toml` loading, environment overrides, validation |
//! | [`session`] | Client workflow: compress, generate, regenerate, share |
//! | [`cache`] | Per-session TTL cache of the last generation |
//! | [`api_client`] | reqwest implementation of [`session::TweetApi`] |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Soft Degradation on Model Output
//!
//! The model is asked for a JSON object but is not trusted to produce one.
//! Unparseable output, missing fields, or an unexpected shape all yield an
//! empty variation list with a warning in the log, never a server error. The
//! client turns an empty list into a "try again" notice.
//!
//! ## Upstream Error Kinds
//!
//! Failures from the model provider are classified once, in
//! [`generation::openai`], into a small [`generation::UpstreamErrorKind`]
//! set. The kind travels in the error body so clients can pick a localized
//! message without string matching.
//!
//! ## Pure-Rust Imaging
//!
//! The reducer uses the `image` crate only. No system libraries are needed
//! to build or run the binary.

pub mod api_client;
pub mod cache;
pub mod config;
pub mod generation;
pub mod imaging;
pub mod output;
pub mod preview;
pub mod server;
pub mod session;
pub mod share;
pub mod types;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
