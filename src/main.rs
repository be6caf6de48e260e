//! Main entry point for the AI Relay Gateway

use ai_relay_gateway::{
    api,
    config::{Settings, CONFIG_PATH_ENV},
    AppState,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Vendor credentials usually live in .env
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = Settings::load()?;

    // Initialize logging; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if settings.logging.format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    info!("Starting AI Relay Gateway");
    if let Some(path) = Settings::missing_config_file() {
        warn!(
            path = %path,
            "{} names a missing file; using defaults and environment overrides",
            CONFIG_PATH_ENV
        );
    }
    info!(
        "Loaded configuration: server={}:{}",
        settings.server.host, settings.server.port
    );

    let addr = format!("{}:{}", settings.server.host, settings.server.port);

    // Create application state
    let app_state = Arc::new(AppState::from_settings(settings)?);

    // Build the router
    let app = api::routes::create_router(app_state);

    info!("Server listening on {}", addr);

    // Start the server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
