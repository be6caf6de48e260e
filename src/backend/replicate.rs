//! Replicate predictions client

use reqwest::{header::AUTHORIZATION, Client};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::backend::http::{build_client, check_status, endpoint};
use crate::config::ReplicateConfig;
use crate::error::{AppError, Result};

const VENDOR: &str = "Replicate";

#[derive(Debug, Serialize)]
struct PredictionRequest<'a> {
    input: &'a Value,
}

/// Prediction as reported by the API
#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub urls: Option<PredictionUrls>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictionUrls {
    pub get: String,
}

impl Prediction {
    pub fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "succeeded" | "failed" | "canceled")
    }
}

/// Normalize prediction output to a list of URLs
///
/// Models answer with either a single URL or an array of them.
pub fn output_urls(output: Option<&Value>) -> Vec<String> {
    match output {
        Some(Value::String(url)) => vec![url.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => vec![],
    }
}

/// Replicate REST client
pub struct ReplicateClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    api_key_env: String,
    timeout: Duration,
    poll_interval: Duration,
}

impl ReplicateClient {
    pub fn new(config: &ReplicateConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_ms)?,
            base_url: config.base_url.clone(),
            api_key: config.api_key(),
            api_key_env: config.api_key_env.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn bearer(&self) -> Result<String> {
        self.api_key
            .as_ref()
            .map(|key| format!("Bearer {}", key))
            .ok_or_else(|| AppError::MissingCredential(self.api_key_env.clone()))
    }

    /// Run `model` (`owner/name`) to completion and return its output URLs
    pub async fn run(&self, model: &str, input: &Value) -> Result<Vec<String>> {
        let auth = self.bearer()?;
        let url = endpoint(&self.base_url, &format!("models/{}/predictions", model));
        let started = Instant::now();

        debug!(model = %model, "Creating prediction");

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, &auth)
            .header("Prefer", "wait")
            .json(&PredictionRequest { input })
            .send()
            .await?;

        let mut prediction: Prediction = check_status(VENDOR, response).await?.json().await?;

        while !prediction.is_terminal() {
            if started.elapsed() >= self.timeout {
                warn!(id = %prediction.id, status = %prediction.status, "Prediction timed out");
                return Err(AppError::Internal(format!(
                    "Replicate prediction {} did not finish within {}s",
                    prediction.id,
                    self.timeout.as_secs()
                )));
            }

            let poll_url = prediction
                .urls
                .as_ref()
                .map(|urls| urls.get.clone())
                .ok_or_else(|| {
                    AppError::Internal(format!(
                        "Replicate prediction {} has no status URL",
                        prediction.id
                    ))
                })?;

            tokio::time::sleep(self.poll_interval).await;
            debug!(id = %prediction.id, status = %prediction.status, "Polling prediction");

            let response = self
                .client
                .get(&poll_url)
                .header(AUTHORIZATION, &auth)
                .send()
                .await?;
            prediction = check_status(VENDOR, response).await?.json().await?;
        }

        if prediction.status != "succeeded" {
            let reason = prediction
                .error
                .as_ref()
                .map(|e| e.as_str().map(str::to_string).unwrap_or_else(|| e.to_string()))
                .unwrap_or_else(|| "no error reported".to_string());
            return Err(AppError::Internal(format!(
                "Replicate prediction {} {}: {}",
                prediction.id, prediction.status, reason
            )));
        }

        Ok(output_urls(prediction.output.as_ref()))
    }
}
