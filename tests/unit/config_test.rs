//! Unit tests for configuration module

use ai_relay_gateway::config::Settings;
use std::io::Write;

fn write_config(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_default_settings() {
    let settings = Settings::default();

    assert_eq!(settings.server.host, "0.0.0.0");
    assert_eq!(settings.server.port, 8080);
    assert!(settings.cors.enabled);
    assert!(settings.cors.allowed_origins.is_empty());
    assert_eq!(settings.openai.text_model, "gpt-4o");
    assert_eq!(settings.openai.vision_model, "gpt-4o-mini");
    assert_eq!(settings.openai.speech_model, "tts-1-1106");
    assert_eq!(settings.openai.voice, "onyx");
    assert_eq!(settings.anthropic.model, "claude-3-sonnet-20240229");
    assert_eq!(settings.replicate.flux_model, "black-forest-labs/flux-schnell");
    assert_eq!(settings.media.frame_interval, 60);
    assert_eq!(settings.media.frame_max_width, 768);
    assert_eq!(settings.storage.object_prefix, "audio/");
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let settings = Settings::load_from_path("/nonexistent/relay.yaml").unwrap();
    assert_eq!(settings.server.port, 8080);
    assert_eq!(settings.logging.format, "json");
}

#[test]
fn test_load_yaml_file() {
    let file = write_config(
        ".yaml",
        r#"
server:
  port: 9090
cors:
  allowed_origins:
    - "https://app.example.com"
openai:
  base_url: "http://localhost:4010/v1"
  text_model: "gpt-4o-mini"
replicate:
  aspect_ratio: "16:9"
media:
  max_frames: 12
"#,
    );

    let settings = Settings::load_from_path(file.path()).unwrap();

    assert_eq!(settings.server.port, 9090);
    assert_eq!(settings.server.host, "0.0.0.0");
    assert_eq!(settings.cors.allowed_origins, vec!["https://app.example.com"]);
    assert_eq!(settings.openai.base_url, "http://localhost:4010/v1");
    assert_eq!(settings.openai.text_model, "gpt-4o-mini");
    // Untouched keys in a partially specified section keep their defaults
    assert_eq!(settings.openai.image_model, "dall-e-3");
    assert_eq!(settings.replicate.aspect_ratio, "16:9");
    assert_eq!(settings.replicate.output_format, "webp");
    assert_eq!(settings.media.max_frames, 12);
}

#[test]
fn test_load_toml_file() {
    let file = write_config(
        ".toml",
        r#"
[logging]
level = "debug"
format = "pretty"

[anthropic]
max_tokens = 256
"#,
    );

    let settings = Settings::load_from_path(file.path()).unwrap();

    assert_eq!(settings.logging.level, "debug");
    assert_eq!(settings.logging.format, "pretty");
    assert_eq!(settings.anthropic.max_tokens, 256);
}

#[test]
fn test_invalid_file_is_rejected() {
    let file = write_config(".yaml", "server:\n  port: 0\n");
    assert!(Settings::load_from_path(file.path()).is_err());
}

#[test]
fn test_settings_validation_valid() {
    assert!(Settings::default().validate().is_ok());
}

#[test]
fn test_settings_validation_invalid_port() {
    let mut settings = Settings::default();
    settings.server.port = 0;

    assert!(settings.validate().is_err());
}

#[test]
fn test_settings_validation_zero_frame_interval() {
    let mut settings = Settings::default();
    settings.media.frame_interval = 0;

    assert!(settings.validate().is_err());
}

#[test]
fn test_settings_validation_empty_model() {
    let mut settings = Settings::default();
    settings.openai.speech_model = " ".to_string();

    let err = settings.validate().unwrap_err();
    assert!(err.to_string().contains("openai.speech_model"));
}

#[test]
fn test_settings_validation_flux_model_needs_owner() {
    let mut settings = Settings::default();
    settings.replicate.flux_model = "flux-schnell".to_string();

    assert!(settings.validate().is_err());
}

#[test]
fn test_inline_api_key_wins() {
    let mut settings = Settings::default();
    settings.openai.api_key = Some("sk-inline".to_string());
    settings.openai.api_key_env = "AI_RELAY_TEST_UNSET_OPENAI".to_string();
    assert_eq!(settings.openai.api_key().as_deref(), Some("sk-inline"));

    settings.openai.api_key = Some("   ".to_string());
    assert!(settings.openai.api_key().is_none());
}
