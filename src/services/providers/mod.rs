// src/services/providers/mod.rs
//! Seams to the hosted models. The orchestrator and the render requester only
//! see these traits; `gemini` holds the HTTP implementations.

pub mod gemini;

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::image::ImageData;
use crate::services::renderer::{GeneratedImage, RenderRequest};
use crate::services::session_manager::Role;

pub use gemini::{GeminiChatClient, GeminiImageClient};

/// One message of the conversation as sent to the chat model.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    pub image: Option<ImageData>,
}

/// Everything the chat model sees for one reply.
#[derive(Debug, Clone)]
pub struct ChatPrompt {
    pub system: String,
    pub messages: Vec<ChatMessage>,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the assistant's next utterance.
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, ServiceError>;
}

#[async_trait]
pub trait ImageEditor: Send + Sync {
    fn name(&self) -> &str;

    /// One request-response exchange producing the edited image.
    async fn edit(&self, request: &RenderRequest) -> Result<GeneratedImage, ServiceError>;
}
