//! Shared HTTP plumbing for vendor clients

use reqwest::{Client, Response};
use std::time::Duration;
use tracing::error;

use crate::error::{AppError, Result};

/// Build a client with the vendor's request timeout
pub fn build_client(timeout_ms: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))
}

/// Pass successful responses through, turn anything else into `AppError::Upstream`
pub async fn check_status(vendor: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!(vendor = vendor, status = %status, "Vendor request failed");

    Err(AppError::Upstream {
        vendor,
        status: status.as_u16(),
        body,
    })
}

/// Join a base URL and an endpoint path without doubling slashes
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
