//! Unit tests for the error envelope

use ai_relay_gateway::AppError;
use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};
use serde_json::Value;

async fn envelope(err: AppError) -> (StatusCode, Value) {
    let response = err.into_response();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_invalid_request_envelope() {
    let (status, body) = envelope(AppError::InvalidRequest("Please provide a prompt".into())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, serde_json::json!({ "error": "Please provide a prompt" }));
}

#[tokio::test]
async fn test_unauthorized_envelope() {
    let (status, body) =
        envelope(AppError::Unauthorized("Unauthorized access to OpenAI API".into())).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized access to OpenAI API");
}

#[tokio::test]
async fn test_missing_credential_envelope() {
    let (status, body) = envelope(AppError::MissingCredential("OPENAI_API_KEY".into())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "OPENAI_API_KEY is not configured");
}

#[tokio::test]
async fn test_upstream_envelope_keeps_vendor_body() {
    let (status, body) = envelope(AppError::Upstream {
        vendor: "Anthropic",
        status: 529,
        body: "overloaded".into(),
    })
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Anthropic returned 529: overloaded");
}

#[tokio::test]
async fn test_io_error_converts() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.mp4");
    let err: AppError = io.into();

    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(err.to_string().starts_with("IO error:"));
}
