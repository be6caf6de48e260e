//! Video narration handler

use crate::api::models::{json_body, VideoToTextRequest};
use crate::error::AppError;
use crate::pipeline::{NarrationResult, VideoNarrator};
use crate::AppState;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use std::sync::Arc;
use tracing::info;

/// Describe and narrate a video, uploading the voiceover
#[utoipa::path(
    post,
    path = "/openai/video-to-text",
    tag = "Vision",
    request_body = VideoToTextRequest,
    responses(
        (status = 200, description = "Description and narration URL", body = NarrationResult),
        (status = 400, description = "Missing videoUrl", body = ErrorResponse),
        (status = 401, description = "Vendor rejected the API key", body = ErrorResponse),
        (status = 500, description = "Pipeline failure", body = ErrorResponse)
    )
)]
pub async fn video_to_text(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VideoToTextRequest>, JsonRejection>,
) -> Result<Json<NarrationResult>, AppError> {
    let video_url = json_body(payload)?.video_url;
    if video_url.is_empty() {
        return Err(AppError::InvalidRequest("No video URL provided".to_string()));
    }

    let result = VideoNarrator::new(&state)?.narrate(&video_url).await?;
    info!(audio_url = %result.audio_url, "Video narration completed");

    Ok(Json(result))
}
