//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming an alternative settings file
pub const CONFIG_PATH_ENV: &str = "AI_RELAY_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config/relay.yaml";
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub anthropic: AnthropicConfig,
    #[serde(default)]
    pub replicate: ReplicateConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound for a whole request, video narration included
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    300
}

fn default_max_body_bytes() -> usize {
    25 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Cross-origin configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Empty means any origin
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec![],
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// OpenAI credentials and the models each route uses
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_key_env: String,
    pub timeout_ms: u64,
    pub system_prompt: String,
    pub text_model: String,
    pub vision_model: String,
    pub vision_max_tokens: u32,
    pub narration_model: String,
    pub image_model: String,
    pub image_size: String,
    pub image_quality: String,
    pub transcription_model: String,
    pub speech_model: String,
    pub voice: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_ms: 120_000,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            text_model: "gpt-4o".to_string(),
            vision_model: "gpt-4o-mini".to_string(),
            vision_max_tokens: 300,
            narration_model: "gpt-4o".to_string(),
            image_model: "dall-e-3".to_string(),
            image_size: "1024x1024".to_string(),
            image_quality: "standard".to_string(),
            transcription_model: "whisper-1".to_string(),
            speech_model: "tts-1-1106".to_string(),
            voice: "onyx".to_string(),
        }
    }
}

impl OpenAiConfig {
    pub fn api_key(&self) -> Option<String> {
        resolve_secret(self.api_key.as_deref(), &self.api_key_env)
    }
}

/// Anthropic credentials and message defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnthropicConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_key_env: String,
    pub timeout_ms: u64,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system_prompt: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com/v1".to_string(),
            api_key: None,
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            timeout_ms: 120_000,
            model: "claude-3-sonnet-20240229".to_string(),
            max_tokens: 1000,
            temperature: 0.0,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl AnthropicConfig {
    pub fn api_key(&self) -> Option<String> {
        resolve_secret(self.api_key.as_deref(), &self.api_key_env)
    }
}

/// Replicate credentials and Flux input defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReplicateConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_key_env: String,
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub flux_model: String,
    pub aspect_ratio: String,
    pub output_format: String,
    pub output_quality: u32,
}

impl Default for ReplicateConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.replicate.com/v1".to_string(),
            api_key: None,
            api_key_env: "REPLICATE_API_TOKEN".to_string(),
            timeout_ms: 120_000,
            poll_interval_ms: 500,
            flux_model: "black-forest-labs/flux-schnell".to_string(),
            aspect_ratio: "1:1".to_string(),
            output_format: "webp".to_string(),
            output_quality: 80,
        }
    }
}

impl ReplicateConfig {
    pub fn api_key(&self) -> Option<String> {
        resolve_secret(self.api_key.as_deref(), &self.api_key_env)
    }
}

/// Object storage (Firebase / Google Cloud Storage) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub bucket: Option<String>,
    pub bucket_env: String,
    /// Variable holding a service account JSON document or a path to one
    pub credentials_env: String,
    /// Bypasses the service account flow, e.g. against an emulator
    pub access_token: Option<String>,
    pub object_prefix: String,
    pub upload_base_url: String,
    pub api_base_url: String,
    pub public_base_url: String,
    /// Overrides the token endpoint named in the service account
    pub token_uri: Option<String>,
    pub timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            bucket_env: "FIREBASE_STORAGE_BUCKET".to_string(),
            credentials_env: "GOOGLE_APPLICATION_CREDENTIALS".to_string(),
            access_token: None,
            object_prefix: "audio/".to_string(),
            upload_base_url: "https://storage.googleapis.com/upload/storage/v1".to_string(),
            api_base_url: "https://storage.googleapis.com/storage/v1".to_string(),
            public_base_url: "https://storage.googleapis.com".to_string(),
            token_uri: None,
            timeout_ms: 60_000,
        }
    }
}

impl StorageConfig {
    pub fn bucket(&self) -> Option<String> {
        resolve_secret(self.bucket.as_deref(), &self.bucket_env)
    }

    pub fn credentials(&self) -> Option<String> {
        resolve_secret(None, &self.credentials_env)
    }
}

/// External media tooling and frame sampling
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MediaConfig {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    /// Keep one frame out of every `frame_interval`
    pub frame_interval: u32,
    pub frame_max_width: u32,
    /// Zero keeps every sampled frame
    pub max_frames: usize,
    pub download_timeout_ms: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            frame_interval: 60,
            frame_max_width: 768,
            max_frames: 0,
            download_timeout_ms: 120_000,
        }
    }
}

fn missing_file(explicit: Option<String>) -> Option<String> {
    explicit.filter(|path| !Path::new(path).exists())
}

/// Prefer an inline value, then the named environment variable
fn resolve_secret(inline: Option<&str>, env: &str) -> Option<String> {
    inline
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
        .or_else(|| std::env::var(env).ok().filter(|v| !v.trim().is_empty()))
}

impl Settings {
    /// Load settings from the default file (or `AI_RELAY_CONFIG`) and the environment
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Path named by `AI_RELAY_CONFIG` when no such file exists
    ///
    /// `load` falls back to defaults in that case, so callers should report it.
    pub fn missing_config_file() -> Option<String> {
        missing_file(std::env::var(CONFIG_PATH_ENV).ok())
    }

    /// Load settings from a YAML or TOML file, with `AI_RELAY__*` overrides
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let format = if path.extension().map_or(false, |ext| ext == "toml") {
            FileFormat::Toml
        } else {
            FileFormat::Yaml
        };

        let mut builder = Config::builder();

        if path.exists() {
            builder = builder.add_source(File::from(path).format(format));
        }

        builder = builder.add_source(
            Environment::with_prefix("AI_RELAY")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("cors.allowed_origins")
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "Server port cannot be 0".to_string(),
            )));
        }

        if self.media.frame_interval == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "media.frame_interval must be at least 1".to_string(),
            )));
        }

        let models = [
            ("openai.text_model", &self.openai.text_model),
            ("openai.vision_model", &self.openai.vision_model),
            ("openai.narration_model", &self.openai.narration_model),
            ("openai.image_model", &self.openai.image_model),
            ("openai.transcription_model", &self.openai.transcription_model),
            ("openai.speech_model", &self.openai.speech_model),
            ("anthropic.model", &self.anthropic.model),
            ("replicate.flux_model", &self.replicate.flux_model),
        ];
        for (key, model) in models {
            if model.trim().is_empty() {
                return Err(AppError::Config(config::ConfigError::Message(format!(
                    "{} cannot be empty",
                    key
                ))));
            }
        }

        if !self.replicate.flux_model.contains('/') {
            return Err(AppError::Config(config::ConfigError::Message(format!(
                "replicate.flux_model must be <owner>/<name>, got '{}'",
                self.replicate.flux_model
            ))));
        }

        Ok(())
    }
}
