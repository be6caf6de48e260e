//! Configuration module

pub mod settings;

pub use settings::{
    AnthropicConfig, CorsConfig, LoggingConfig, MediaConfig, OpenAiConfig, ReplicateConfig,
    ServerConfig, Settings, StorageConfig, CONFIG_PATH_ENV,
};
