//! Anthropic Messages API client

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::http::{build_client, check_status, endpoint};
use crate::config::AnthropicConfig;
use crate::error::{AppError, Result};

const VENDOR: &str = "Anthropic";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, Serialize)]
pub struct AnthropicMessage {
    pub role: String,
    pub content: String,
}

/// Messages API request body
#[derive(Debug, Clone, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<AnthropicMessage>,
}

impl MessagesRequest {
    /// Single-turn request built from the configured defaults
    pub fn single_turn(config: &AnthropicConfig, prompt: impl Into<String>) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            system: Some(config.system_prompt.clone()).filter(|s| !s.is_empty()),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: prompt.into(),
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Anthropic REST client
pub struct AnthropicClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    api_key_env: String,
}

impl AnthropicClient {
    pub fn new(config: &AnthropicConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_ms)?,
            base_url: config.base_url.clone(),
            api_key: config.api_key(),
            api_key_env: config.api_key_env.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send a message and return the text of the first content block
    ///
    /// An empty string is returned when the reply carries no text block first.
    pub async fn create_message(&self, request: &MessagesRequest) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::MissingCredential(self.api_key_env.clone()))?;
        let url = endpoint(&self.base_url, "messages");

        debug!(model = %request.model, max_tokens = request.max_tokens, "Sending messages request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(request)
            .send()
            .await?;

        let result: MessagesResponse = check_status(VENDOR, response).await?.json().await?;

        Ok(result
            .content
            .into_iter()
            .next()
            .filter(|block| block.kind == "text")
            .and_then(|block| block.text)
            .unwrap_or_default())
    }
}
