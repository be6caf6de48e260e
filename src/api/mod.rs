//! API module - HTTP routes, handlers, and models

pub mod audio_handlers;
pub mod handlers;
pub mod image_handlers;
pub mod models;
pub mod routes;
pub mod text_handlers;
pub mod video_handlers;
