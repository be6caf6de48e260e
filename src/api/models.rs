//! API request and response models

use axum::{extract::rejection::JsonRejection, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, Result};

pub(crate) const BODY_TOO_LARGE: &str = "Request body is too large";

/// Unwrap a JSON body
///
/// An unreadable body counts as empty, except one cut off by the body limit.
pub fn json_body<T: Default>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            Err(AppError::PayloadTooLarge(BODY_TOO_LARGE.to_string()))
        }
        Err(_) => Ok(T::default()),
    }
}

/// Body of every prompt-driven route
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct PromptRequest {
    /// Text sent to the vendor
    #[serde(default)]
    pub prompt: String,
}

impl PromptRequest {
    /// Extract a non-empty prompt
    pub fn require(payload: std::result::Result<Json<Self>, JsonRejection>) -> Result<String> {
        let prompt = json_body(payload)?.prompt;
        if prompt.is_empty() {
            return Err(AppError::InvalidRequest("Please provide a prompt".to_string()));
        }
        Ok(prompt)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct ImageToTextRequest {
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct VideoToTextRequest {
    #[serde(rename = "videoUrl", default)]
    pub video_url: String,
}

/// Multipart form for transcription
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct TranscribeForm {
    /// Audio file; its extension tells the vendor the format
    #[schema(format = Binary)]
    pub file: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct TextResponse {
    pub response: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ImageResponse {
    pub image_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct TranscriptionResponse {
    pub transcription: String,
}

/// Vision answer; both fields carry the same text
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ImageDescriptionResponse {
    pub title: String,
    pub content: String,
}

/// Error envelope shared by every route
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check response
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub providers: ProviderStatus,
}

/// Which vendors have credentials loaded
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ProviderStatus {
    pub openai: bool,
    pub anthropic: bool,
    pub replicate: bool,
    pub storage: bool,
}
