//! Multi-step request flows

pub mod narration;

pub use narration::{NarrationResult, VideoNarrator};
