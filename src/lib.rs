//! AI Relay Gateway
//!
//! A stateless HTTP relay that forwards requests to AI vendor APIs (OpenAI,
//! Anthropic, Replicate) and to a cloud storage bucket, answering in a
//! normalized JSON envelope.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod media;
pub mod pipeline;
pub mod storage;

pub use error::{AppError, Result};

use std::sync::Arc;
use tracing::{error, info};

use backend::{AnthropicClient, OpenAiClient, ReplicateClient};
use media::{FfmpegToolkit, MediaToolkit};
use storage::{GcsStore, ObjectStore};

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<config::Settings>,
    pub openai: Arc<OpenAiClient>,
    pub anthropic: Arc<AnthropicClient>,
    pub replicate: Arc<ReplicateClient>,
    pub storage: Option<Arc<dyn ObjectStore>>,
    pub media: Arc<dyn MediaToolkit>,
    /// Plain client for fetching caller-supplied media URLs
    pub http: reqwest::Client,
}

impl AppState {
    /// Build the state with explicit storage and media implementations
    pub fn new(
        settings: config::Settings,
        storage: Option<Arc<dyn ObjectStore>>,
        media: Arc<dyn MediaToolkit>,
    ) -> Result<Self> {
        let http = backend::http::build_client(settings.media.download_timeout_ms)?;

        Ok(Self {
            openai: Arc::new(OpenAiClient::new(&settings.openai)?),
            anthropic: Arc::new(AnthropicClient::new(&settings.anthropic)?),
            replicate: Arc::new(ReplicateClient::new(&settings.replicate)?),
            settings: Arc::new(settings),
            storage,
            media,
            http,
        })
    }

    /// Build the production state: Cloud Storage and ffmpeg
    ///
    /// Missing or broken credentials are logged, never fatal; the routes that
    /// need them answer with an error instead.
    pub fn from_settings(settings: config::Settings) -> Result<Self> {
        log_credential(&settings.openai.api_key_env, settings.openai.api_key().is_some());
        log_credential(&settings.anthropic.api_key_env, settings.anthropic.api_key().is_some());
        log_credential(&settings.replicate.api_key_env, settings.replicate.api_key().is_some());

        let storage: Option<Arc<dyn ObjectStore>> = match GcsStore::from_config(&settings.storage) {
            Ok(Some(store)) => {
                info!(bucket = %store.bucket(), "Object storage ready");
                Some(Arc::new(store))
            }
            Ok(None) => {
                error!(
                    env = %settings.storage.bucket_env,
                    "No storage bucket configured; video narration is unavailable"
                );
                None
            }
            Err(e) => {
                error!(error = %e, "Failed to initialize object storage");
                None
            }
        };

        let media: Arc<dyn MediaToolkit> = Arc::new(FfmpegToolkit::new(&settings.media));

        Self::new(settings, storage, media)
    }
}

fn log_credential(env: &str, present: bool) {
    if present {
        info!("{} loaded successfully.", env);
    } else {
        error!("{} is not set in the environment variables.", env);
    }
}
