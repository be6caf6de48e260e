//! HTTP route definitions

use crate::api::models::*;
use crate::api::{audio_handlers, handlers, image_handlers, text_handlers, video_handlers};
use crate::config::CorsConfig;
use crate::error::AppError;
use crate::pipeline::NarrationResult;
use crate::AppState;
use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    BoxError, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower::{timeout::error::Elapsed, timeout::TimeoutLayer, ServiceBuilder};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "AI Relay Gateway API",
        description = "Relay for OpenAI, Anthropic and Replicate with media storage.",
        license(name = "MIT"),
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        handlers::health_check,
        text_handlers::openai_text,
        text_handlers::anthropic_text,
        image_handlers::openai_image,
        image_handlers::flux_image,
        image_handlers::image_to_text,
        audio_handlers::transcribe,
        audio_handlers::speech,
        video_handlers::video_to_text,
    ),
    components(schemas(
        PromptRequest,
        ImageToTextRequest,
        VideoToTextRequest,
        TranscribeForm,
        TextResponse,
        ImageResponse,
        TranscriptionResponse,
        ImageDescriptionResponse,
        NarrationResult,
        ErrorResponse,
        HealthResponse,
        ProviderStatus,
    )),
    tags(
        (name = "Text", description = "Text generation endpoints"),
        (name = "Images", description = "Image generation endpoints"),
        (name = "Vision", description = "Image and video understanding endpoints"),
        (name = "Audio", description = "Transcription and speech endpoints"),
        (name = "Health", description = "Health and monitoring endpoints"),
    )
)]
pub struct ApiDoc;

/// Render errors raised by the middleware stack in the usual envelope
async fn handle_middleware_error(err: BoxError) -> AppError {
    if err.is::<Elapsed>() {
        AppError::Timeout
    } else {
        AppError::Internal(format!("Unhandled middleware error: {}", err))
    }
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let server = state.settings.server.clone();
    let cors = state.settings.cors.clone();

    let router = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/api-docs/openapi.json", get(handlers::openapi_json))
        .route("/openai/text", post(text_handlers::openai_text))
        .route("/anthropic/text", post(text_handlers::anthropic_text))
        .route("/openai/image", post(image_handlers::openai_image))
        .route("/flux/image", post(image_handlers::flux_image))
        .route("/openai/image-to-text", post(image_handlers::image_to_text))
        .route("/openai/video-to-text", post(video_handlers::video_to_text))
        .route("/openai/transcribe", post(audio_handlers::transcribe))
        .route("/openai/speech", post(audio_handlers::speech))
        // Add shared state
        .with_state(state)
        .layer(DefaultBodyLimit::max(server.max_body_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .layer(TimeoutLayer::new(Duration::from_secs(server.request_timeout_secs))),
        );

    let router = if cors.enabled {
        router.layer(cors_layer(&cors))
    } else {
        router
    };

    // Add tracing layer
    router.layer(TraceLayer::new_for_http())
}
