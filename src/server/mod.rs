//! HTTP surface.
//!
//! | Route | Handler |
//! |---|---|
//! | `POST /api/generate-tweet` | [`handlers::generate_tweet`] |
//! | `POST /api/share` | [`handlers::create_share`] |
//! | `GET /api/share/{id}` | [`handlers::get_share`] |
//! | `GET /shared/{id}` | [`handlers::shared_page`] |
//! | `GET /shared/{id}/image` | [`handlers::shared_image`] |
//! | `GET /api/health` | [`handlers::health`] |
//!
//! Any other method on a known route answers 405 with a JSON body.

pub mod error;
pub mod handlers;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::AppConfig;
use crate::generation::GenerationClient;
use crate::share::ShareService;
use crate::validate::MAX_IMAGES;

pub use error::{ApiError, ErrorBody};
pub use handlers::{HealthStatus, base_url_from_headers};

/// Shared, immutable per-process dependencies.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub generation: GenerationClient,
    pub shares: ShareService,
}

impl AppState {
    pub fn new(config: AppConfig, generation: GenerationClient, shares: ShareService) -> Self {
        Self {
            config: Arc::new(config),
            generation,
            shares,
        }
    }

    /// Configured public origin, or the request's own origin.
    pub fn public_base_url(&self, headers: &HeaderMap) -> String {
        match &self.config.server.public_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => base_url_from_headers(headers),
        }
    }
}

/// Whole-request cap: every image at the per-file limit, base64-inflated,
/// plus form overhead.
fn body_limit(config: &AppConfig) -> usize {
    config.server.upload_max_bytes.saturating_mul(MAX_IMAGES + 2)
}

pub fn build_router(state: AppState) -> Router {
    let limit = body_limit(&state.config);
    Router::new()
        .route(
            "/api/generate-tweet",
            post(handlers::generate_tweet).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/share",
            post(handlers::create_share).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/share/{id}",
            get(handlers::get_share).fallback(handlers::method_not_allowed),
        )
        .route(
            "/shared/{id}",
            get(handlers::shared_page).fallback(handlers::method_not_allowed),
        )
        .route(
            "/shared/{id}/image",
            get(handlers::shared_image).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/health",
            get(handlers::health).fallback(handlers::method_not_allowed),
        )
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

/// Bind `config.server.listen` and serve until Ctrl-C.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let listen = state.config.server.listen.clone();
    let listener = TcpListener::bind(&listen).await?;
    info!(
        listen = %listener.local_addr()?,
        environment = %state.config.environment,
        model = %state.config.model.model,
        "tweetgen listening"
    );
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
}
