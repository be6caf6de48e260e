//! Text generation handlers

use crate::api::models::{PromptRequest, TextResponse};
use crate::backend::{ChatCompletionRequest, ChatMessage, MessagesRequest};
use crate::error::AppError;
use crate::AppState;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use std::sync::Arc;
use tracing::{debug, info};

/// Generate text with OpenAI
#[utoipa::path(
    post,
    path = "/openai/text",
    tag = "Text",
    request_body = PromptRequest,
    responses(
        (status = 200, description = "Generated text", body = TextResponse),
        (status = 400, description = "Missing prompt", body = ErrorResponse),
        (status = 500, description = "Vendor failure", body = ErrorResponse)
    )
)]
pub async fn openai_text(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Json<TextResponse>, AppError> {
    let prompt = PromptRequest::require(payload)?;
    let config = &state.settings.openai;

    info!(model = %config.text_model, prompt_len = prompt.len(), "Generating text using OpenAI");

    let request = ChatCompletionRequest {
        model: config.text_model.clone(),
        messages: vec![
            ChatMessage::system(config.system_prompt.clone()),
            ChatMessage::user(prompt),
        ],
        max_tokens: None,
    };

    let response = state.openai.chat_completion(&request).await?;
    let response = response.trim().to_string();
    debug!(response_len = response.len(), "Generated response");

    Ok(Json(TextResponse { response }))
}

/// Generate text with Anthropic
#[utoipa::path(
    post,
    path = "/anthropic/text",
    tag = "Text",
    request_body = PromptRequest,
    responses(
        (status = 200, description = "Generated text", body = TextResponse),
        (status = 400, description = "Missing prompt", body = ErrorResponse),
        (status = 500, description = "Vendor failure", body = ErrorResponse)
    )
)]
pub async fn anthropic_text(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Json<TextResponse>, AppError> {
    let prompt = PromptRequest::require(payload)?;
    let request = MessagesRequest::single_turn(&state.settings.anthropic, prompt);

    info!(model = %request.model, "Generating text using Anthropic");

    let response = state.anthropic.create_message(&request).await?;

    Ok(Json(TextResponse { response }))
}
