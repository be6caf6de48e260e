//! OpenAI client: chat completions, image generation, transcription and speech

use reqwest::{
    header::AUTHORIZATION,
    multipart::{Form, Part},
    Client, StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::backend::http::{build_client, check_status, endpoint};
use crate::config::OpenAiConfig;
use crate::error::{AppError, Result};

const VENDOR: &str = "OpenAI";

/// Chat message for completion requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Parts(parts),
        }
    }
}

/// Plain text or multimodal message content
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: url.into(),
                detail: None,
            },
        }
    }

    /// Inline JPEG, as produced by frame extraction
    pub fn jpeg_base64(data: &str) -> Self {
        Self::image_url(format!("data:image/jpeg;base64,{}", data))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Chat completion request (OpenAI compatible)
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    quality: &'a str,
    n: u32,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    #[serde(default)]
    url: Option<String>,
}

/// Parameters for a single image generation
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    pub size: String,
    pub quality: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Audio handed to the transcription endpoint
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Text-to-speech request body
#[derive(Debug, Clone, Serialize)]
pub struct SpeechRequest {
    pub model: String,
    pub input: String,
    pub voice: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
}

/// Synthesized MP3 audio as returned by the vendor
#[derive(Debug, Clone)]
pub struct SpeechAudio {
    pub data: Vec<u8>,
}

/// OpenAI REST client
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    api_key_env: String,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
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

    fn bearer(&self) -> Result<String> {
        self.api_key
            .as_ref()
            .map(|key| format!("Bearer {}", key))
            .ok_or_else(|| AppError::MissingCredential(self.api_key_env.clone()))
    }

    /// Run a chat completion and return the first choice's text
    pub async fn chat_completion(&self, request: &ChatCompletionRequest) -> Result<String> {
        let auth = self.bearer()?;
        let url = endpoint(&self.base_url, "chat/completions");

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, auth)
            .json(request)
            .send()
            .await?;

        let result: ChatCompletionResponse = check_status(VENDOR, response).await?.json().await?;

        let choice = result.choices.into_iter().next().ok_or_else(|| {
            error!(model = %request.model, "Chat completion returned no choices");
            AppError::Internal("OpenAI returned no choices".to_string())
        })?;

        Ok(choice.message.content.unwrap_or_default())
    }

    /// Generate one image and return its URL
    pub async fn generate_image(&self, request: &ImageRequest) -> Result<String> {
        let auth = self.bearer()?;
        let url = endpoint(&self.base_url, "images/generations");

        debug!(model = %request.model, size = %request.size, "Sending image generation request");

        let body = ImageGenerationRequest {
            model: &request.model,
            prompt: &request.prompt,
            size: &request.size,
            quality: &request.quality,
            n: 1,
        };

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, auth)
            .json(&body)
            .send()
            .await?;

        let result: ImageGenerationResponse = check_status(VENDOR, response).await?.json().await?;

        result
            .data
            .into_iter()
            .next()
            .and_then(|image| image.url)
            .ok_or_else(|| AppError::Internal("OpenAI returned no image URL".to_string()))
    }

    /// Transcribe an uploaded audio file
    pub async fn transcribe(&self, model: &str, audio: AudioUpload) -> Result<String> {
        let auth = self.bearer()?;
        let url = endpoint(&self.base_url, "audio/transcriptions");

        debug!(
            model = %model,
            file_name = %audio.file_name,
            bytes = audio.data.len(),
            "Sending transcription request"
        );

        let mut part = Part::bytes(audio.data).file_name(audio.file_name);
        if let Some(content_type) = audio.content_type.as_deref() {
            part = part.mime_str(content_type).map_err(|e| {
                AppError::InvalidRequest(format!("Invalid content type '{}': {}", content_type, e))
            })?;
        }

        let form = Form::new().text("model", model.to_string()).part("file", part);

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, auth)
            .multipart(form)
            .send()
            .await?;

        let result: TranscriptionResponse = check_status(VENDOR, response).await?.json().await?;
        Ok(result.text)
    }

    /// Synthesize speech for `request.input`
    pub async fn speech(&self, request: &SpeechRequest) -> Result<SpeechAudio> {
        let auth = self.bearer()?;
        let url = endpoint(&self.base_url, "audio/speech");

        debug!(
            model = %request.model,
            voice = %request.voice,
            input_len = request.input.len(),
            "Sending speech request"
        );

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, auth)
            .json(request)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(AppError::Unauthorized(
                "Unauthorized access to OpenAI API".to_string(),
            ));
        }

        let data = check_status(VENDOR, response).await?.bytes().await?.to_vec();
        debug!(bytes = data.len(), "Speech synthesis complete");

        Ok(SpeechAudio { data })
    }
}
