//! Backend module - vendor API clients

pub mod anthropic;
pub mod http;
pub mod openai;
pub mod replicate;

pub use anthropic::{AnthropicClient, MessagesRequest};
pub use openai::{
    AudioUpload, ChatCompletionRequest, ChatMessage, ContentPart, ImageRequest, OpenAiClient,
    SpeechAudio, SpeechRequest,
};
pub use replicate::ReplicateClient;
