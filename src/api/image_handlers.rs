//! Image generation and image understanding handlers

use crate::api::models::{
    json_body, ImageDescriptionResponse, ImageResponse, ImageToTextRequest, PromptRequest,
};
use crate::backend::{ChatCompletionRequest, ChatMessage, ContentPart, ImageRequest};
use crate::error::AppError;
use crate::AppState;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

const VISION_PROMPT: &str = "What's in this image?";

/// Generate an image with OpenAI
#[utoipa::path(
    post,
    path = "/openai/image",
    tag = "Images",
    request_body = PromptRequest,
    responses(
        (status = 200, description = "Image URL", body = ImageResponse),
        (status = 400, description = "Missing prompt", body = ErrorResponse),
        (status = 500, description = "Vendor failure", body = ErrorResponse)
    )
)]
pub async fn openai_image(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Json<ImageResponse>, AppError> {
    let prompt = PromptRequest::require(payload)?;
    let config = &state.settings.openai;

    info!(model = %config.image_model, "Generating image using OpenAI");

    let image_url = state
        .openai
        .generate_image(&ImageRequest {
            model: config.image_model.clone(),
            prompt,
            size: config.image_size.clone(),
            quality: config.image_quality.clone(),
        })
        .await?;

    Ok(Json(ImageResponse { image_url }))
}

/// Generate an image with Flux on Replicate
#[utoipa::path(
    post,
    path = "/flux/image",
    tag = "Images",
    request_body = PromptRequest,
    responses(
        (status = 200, description = "Image URL", body = ImageResponse),
        (status = 400, description = "Missing prompt", body = ErrorResponse),
        (status = 500, description = "Vendor failure or empty output", body = ErrorResponse)
    )
)]
pub async fn flux_image(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Json<ImageResponse>, AppError> {
    let prompt = PromptRequest::require(payload)?;
    let config = &state.settings.replicate;

    info!(model = %config.flux_model, "Generating image using Flux");

    let input = json!({
        "prompt": prompt,
        "num_outputs": 1,
        "aspect_ratio": config.aspect_ratio,
        "output_format": config.output_format,
        "output_quality": config.output_quality,
    });

    let image_url = state
        .replicate
        .run(&config.flux_model, &input)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Internal("No image URL returned from the model".to_string()))?;

    Ok(Json(ImageResponse { image_url }))
}

/// Describe an image by URL
#[utoipa::path(
    post,
    path = "/openai/image-to-text",
    tag = "Vision",
    request_body = ImageToTextRequest,
    responses(
        (status = 200, description = "Image description", body = ImageDescriptionResponse),
        (status = 400, description = "Missing imageUrl", body = ErrorResponse),
        (status = 500, description = "Vendor failure", body = ErrorResponse)
    )
)]
pub async fn image_to_text(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ImageToTextRequest>, JsonRejection>,
) -> Result<Json<ImageDescriptionResponse>, AppError> {
    let image_url = json_body(payload)?.image_url;
    if image_url.is_empty() {
        return Err(AppError::InvalidRequest("No image URL provided".to_string()));
    }

    let config = &state.settings.openai;
    info!(model = %config.vision_model, image_url = %image_url, "Describing image");

    let request = ChatCompletionRequest {
        model: config.vision_model.clone(),
        messages: vec![ChatMessage::user_parts(vec![
            ContentPart::text(VISION_PROMPT),
            ContentPart::image_url(image_url),
        ])],
        max_tokens: Some(config.vision_max_tokens),
    };

    let content = state.openai.chat_completion(&request).await?;

    Ok(Json(ImageDescriptionResponse {
        title: content.clone(),
        content,
    }))
}
