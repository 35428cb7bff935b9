pub mod analysis;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod mime_detection;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod services;
pub mod swagger;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

#[cfg(test)]
mod tests;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use analysis::DocumentAnalyzer;
use config::Config;
use db::Database;
use services::{captcha::CaptchaVerifier, notifications::EmailNotifier};

/// Multipart framing and the text fields ride on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub analyzer: Arc<dyn DocumentAnalyzer>,
    pub notifier: Option<EmailNotifier>,
    pub captcha: Option<CaptchaVerifier>,
}

/// Health check endpoint for monitoring
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    if !state.db.check_pool_health().await {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(Json(serde_json::json!({
        "status": "ok",
        "analyzer": state.analyzer.name(),
        "database": state.db.get_pool_health(),
    })))
}

pub fn create_app(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_file_size_bytes() as usize + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/api/health", get(health_check))
        .nest("/api/auth", routes::auth::router())
        .nest("/api/documents", routes::documents::router())
        .nest("/api/usage", routes::usage::router())
        .merge(swagger::create_swagger_router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
