//! Speech-to-text and text-to-speech handlers

use crate::api::models::{PromptRequest, TranscriptionResponse, BODY_TOO_LARGE};
use crate::backend::{AudioUpload, SpeechRequest};
use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::JsonRejection,
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

const SPEECH_FILE_NAME: &str = "tts_output.mp3";

/// Name passed upstream; files without an extension are sent as `.tmp`
pub fn upload_file_name(file_name: &str) -> String {
    if Path::new(file_name).extension().is_some() {
        file_name.to_string()
    } else {
        format!("{}.tmp", file_name)
    }
}

fn multipart_error(context: &str, err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(BODY_TOO_LARGE.to_string())
    } else {
        AppError::InvalidRequest(format!("{}: {}", context, err))
    }
}

/// Transcribe an uploaded audio file
#[utoipa::path(
    post,
    path = "/openai/transcribe",
    tag = "Audio",
    request_body(content = TranscribeForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Transcript", body = TranscriptionResponse),
        (status = 400, description = "No file uploaded", body = ErrorResponse),
        (status = 413, description = "Upload exceeds the body limit", body = ErrorResponse),
        (status = 500, description = "Vendor failure", body = ErrorResponse)
    )
)]
pub async fn transcribe(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<TranscriptionResponse>, AppError> {
    let mut multipart = multipart.map_err(|_| AppError::InvalidRequest("No file part".to_string()))?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Malformed multipart body", e))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error("Failed to read file part", e))?;

        upload = Some((file_name, content_type, data));
        break;
    }

    let (file_name, content_type, data) =
        upload.ok_or_else(|| AppError::InvalidRequest("No file part".to_string()))?;
    if file_name.is_empty() {
        return Err(AppError::InvalidRequest("No selected file".to_string()));
    }

    let model = &state.settings.openai.transcription_model;
    info!(model = %model, file_name = %file_name, bytes = data.len(), "Transcribing audio");

    let transcription = state
        .openai
        .transcribe(
            model,
            AudioUpload {
                file_name: upload_file_name(&file_name),
                content_type,
                data: data.to_vec(),
            },
        )
        .await?;

    Ok(Json(TranscriptionResponse { transcription }))
}

/// Synthesize speech and return it as an MP3 attachment
#[utoipa::path(
    post,
    path = "/openai/speech",
    tag = "Audio",
    request_body = PromptRequest,
    responses(
        (status = 200, description = "MP3 attachment (audio/mpeg)"),
        (status = 400, description = "Missing prompt", body = ErrorResponse),
        (status = 401, description = "Vendor rejected the API key", body = ErrorResponse),
        (status = 500, description = "Vendor failure", body = ErrorResponse)
    )
)]
pub async fn speech(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let prompt = PromptRequest::require(payload)?;
    let config = &state.settings.openai;

    info!(model = %config.speech_model, voice = %config.voice, "Synthesizing speech");

    let audio = state
        .openai
        .speech(&SpeechRequest {
            model: config.speech_model.clone(),
            input: prompt,
            voice: config.voice.clone(),
            speed: None,
        })
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "audio/mpeg".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", SPEECH_FILE_NAME),
            ),
        ],
        audio.data,
    )
        .into_response())
}
