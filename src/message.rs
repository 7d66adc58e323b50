// src/message.rs
use serde::{Deserialize, Serialize};

use crate::prompts::Starter;
use crate::services::session_manager::{Phase, Role};

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Base64 photo, optionally as a `data:` URL.
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub phase: Phase,
    pub messages: Vec<OutboundMessage>,
    /// Suggested opening messages, only sent when a session starts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub starters: Vec<Suggestion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub label: String,
    pub message: String,
}

impl From<&Starter> for Suggestion {
    fn from(starter: &Starter) -> Self {
        Self {
            label: starter.label.to_string(),
            message: starter.message.to_string(),
        }
    }
}

/// One bubble in the chat widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub role: Role,
    pub text: String,
    /// Rendering as a `data:` URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Error code when this message reports a failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OutboundMessage {
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            image: None,
            error: None,
        }
    }

    pub fn with_image(mut self, data_url: String) -> Self {
        self.image = Some(data_url);
        self
    }

    pub fn failure(code: &str, text: impl Into<String>) -> Self {
        Self {
            error: Some(code.to_string()),
            ..Self::assistant(text)
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
