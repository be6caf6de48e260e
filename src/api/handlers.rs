//! Service-level handlers

use crate::api::models::{HealthResponse, ProviderStatus};
use crate::api::routes::ApiDoc;
use crate::AppState;
use axum::{extract::State, Json};
use std::sync::Arc;
use utoipa::OpenApi;

/// Landing text
pub async fn root() -> &'static str {
    "Welcome to the server template!"
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let providers = ProviderStatus {
        openai: state.openai.is_configured(),
        anthropic: state.anthropic.is_configured(),
        replicate: state.replicate.is_configured(),
        storage: state.storage.is_some(),
    };

    let all_configured =
        providers.openai && providers.anthropic && providers.replicate && providers.storage;

    Json(HealthResponse {
        status: if all_configured { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        providers,
    })
}

/// OpenAPI document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
