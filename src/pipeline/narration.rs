//! Video narration: frames in, description and voiceover out

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::backend::http::check_status;
use crate::backend::{ChatCompletionRequest, ChatMessage, ContentPart, SpeechRequest};
use crate::error::{AppError, Result};
use crate::storage::ObjectStore;
use crate::AppState;

const DESCRIPTION_PROMPT: &str = "These are frames from a video that I want to upload. \
Generate a compelling description that I can upload along with the video.";
const DESCRIPTION_MAX_TOKENS: u32 = 200;
const SCRIPT_MAX_TOKENS: u32 = 500;
const NARRATION_SPEED: f32 = 1.0;

fn script_prompt(duration_secs: f64) -> String {
    format!(
        "These are frames of a video that is {:.2} seconds long. Create a short voiceover \
script in the style of David Attenborough that matches this duration. Only include the narration.",
        duration_secs
    )
}

/// Outcome of a narration run
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NarrationResult {
    pub video_url: String,
    pub description: String,
    pub audio_url: String,
}

/// One request's walk through download, frames, chat, speech and upload
pub struct VideoNarrator<'a> {
    state: &'a AppState,
    store: &'a dyn ObjectStore,
}

impl<'a> VideoNarrator<'a> {
    pub fn new(state: &'a AppState) -> Result<Self> {
        let store = state
            .storage
            .as_deref()
            .ok_or_else(|| AppError::Storage("object storage is not configured".to_string()))?;
        Ok(Self { state, store })
    }

    pub async fn narrate(&self, video_url: &str) -> Result<NarrationResult> {
        let settings = &self.state.settings;
        let media = &self.state.media;

        info!(video_url = %video_url, "Processing video");

        // Temp files are removed when these handles drop, on every exit path
        let video_file = tempfile::Builder::new().suffix(".mp4").tempfile()?;
        self.download(video_url, video_file.path()).await?;

        let mut frames = media
            .extract_frames(
                video_file.path(),
                settings.media.frame_interval,
                settings.media.frame_max_width,
            )
            .await?;
        if settings.media.max_frames > 0 {
            frames.truncate(settings.media.max_frames);
        }
        if frames.is_empty() {
            return Err(AppError::Media(
                "No frames could be extracted from the video".to_string(),
            ));
        }
        let frames: Vec<String> = frames.iter().map(|frame| STANDARD.encode(frame)).collect();

        let duration = media.probe_duration(video_file.path()).await?;
        info!(frames = frames.len(), duration_secs = duration, "Sampled video");

        let description = self
            .describe(DESCRIPTION_PROMPT.to_string(), &frames, DESCRIPTION_MAX_TOKENS)
            .await?;
        let script = self
            .describe(script_prompt(duration), &frames, SCRIPT_MAX_TOKENS)
            .await?;
        debug!(script_len = script.len(), "Generated voiceover script");

        let speech = self
            .state
            .openai
            .speech(&SpeechRequest {
                model: settings.openai.speech_model.clone(),
                input: script,
                voice: settings.openai.voice.clone(),
                speed: Some(NARRATION_SPEED),
            })
            .await?;

        let raw_audio = tempfile::Builder::new().suffix(".mp3").tempfile()?;
        tokio::fs::write(raw_audio.path(), &speech.data).await?;
        let fitted_audio = tempfile::Builder::new().suffix(".mp3").tempfile()?;
        media
            .fit_duration(raw_audio.path(), fitted_audio.path(), duration)
            .await?;
        let audio = tokio::fs::read(fitted_audio.path()).await?;

        let object = format!("{}{}.mp3", settings.storage.object_prefix, Uuid::new_v4());
        self.store.upload(&object, audio, "audio/mpeg").await?;
        self.store.make_public(&object).await?;
        let audio_url = self.store.public_url(&object);

        info!(object = %object, "Narration uploaded");

        Ok(NarrationResult {
            video_url: video_url.to_string(),
            description,
            audio_url,
        })
    }

    async fn download(&self, url: &str, path: &Path) -> Result<()> {
        let response = self.state.http.get(url).send().await?;
        let bytes = check_status("Video host", response).await?.bytes().await?;
        debug!(bytes = bytes.len(), "Downloaded video");
        tokio::fs::write(path, &bytes).await?;
        Ok(())
    }

    async fn describe(&self, prompt: String, frames: &[String], max_tokens: u32) -> Result<String> {
        let mut parts = Vec::with_capacity(frames.len() + 1);
        parts.push(ContentPart::text(prompt));
        parts.extend(frames.iter().map(|frame| ContentPart::jpeg_base64(frame)));

        let request = ChatCompletionRequest {
            model: self.state.settings.openai.narration_model.clone(),
            messages: vec![ChatMessage::user_parts(parts)],
            max_tokens: Some(max_tokens),
        };

        self.state.openai.chat_completion(&request).await
    }
}
