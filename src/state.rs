// src/state.rs
use std::sync::Arc;

use crate::config::Config;
use crate::error::ServiceError;
use crate::services::chatbot::ChatOrchestrator;
use crate::services::metrics_manager::MetricsManager;
use crate::services::providers::{ChatModel, GeminiChatClient, GeminiImageClient, ImageEditor};
use crate::services::renderer::RenderRequester;
use crate::services::session_loop::SessionLoop;
use crate::services::session_manager::SessionManager;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub sessions: SessionManager,
    pub metrics: MetricsManager,
    pub design: SessionLoop,
    pub admin_key: Option<String>,
    pub body_limit: usize,
}

impl AppState {
    /// Wires the services around the given hosted-model clients.
    pub fn new(config: &Config, chat: Arc<dyn ChatModel>, images: Arc<dyn ImageEditor>) -> Self {
        let sessions = SessionManager::new(config.session_ttl);
        let metrics = MetricsManager::new();
        let design = SessionLoop::new(
            sessions.clone(),
            ChatOrchestrator::new(chat, config),
            RenderRequester::new(images, config),
            metrics.clone(),
            config,
        );
        Self {
            sessions,
            metrics,
            design,
            admin_key: config.admin_key.clone(),
            // base64 inflates uploads by a third; leave room for the JSON around it
            body_limit: config.max_image_bytes / 3 * 4 + 64 * 1024,
        }
    }

    /// Production wiring against the Gemini API.
    pub fn from_config(config: &Config) -> Result<Self, ServiceError> {
        let chat = Arc::new(GeminiChatClient::new(config)?);
        let images = Arc::new(GeminiImageClient::new(config)?);
        Ok(Self::new(config, chat, images))
    }
}
