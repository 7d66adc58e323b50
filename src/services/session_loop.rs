// src/services/session_loop.rs
use crate::config::Config;
use crate::error::{AppError, ServiceError};
use crate::image::ImageData;
use crate::message::{ChatResponse, OutboundMessage, Suggestion};
use crate::prompts;
use crate::services::chatbot::ChatOrchestrator;
use crate::services::metrics_manager::MetricsManager;
use crate::services::preferences::should_render;
use crate::services::renderer::{RenderRequest, RenderRequester};
use crate::services::session_manager::{Phase, Session, SessionManager, Turn};

/// A photo as it arrives from the chat widget.
#[derive(Debug, Clone)]
pub enum Upload {
    Base64(String),
    Bytes(Vec<u8>),
}

impl Upload {
    fn decode(self, max_bytes: usize) -> Result<ImageData, ServiceError> {
        match self {
            Upload::Base64(payload) => ImageData::from_base64(&payload, max_bytes),
            Upload::Bytes(bytes) => ImageData::from_bytes(bytes, max_bytes),
        }
    }
}

/// One message or upload from the chat widget.
#[derive(Debug, Clone, Default)]
pub struct InboundEvent {
    pub session_id: Option<String>,
    pub text: Option<String>,
    pub image: Option<Upload>,
}

pub struct SessionLoop {
    sessions: SessionManager,
    chat: ChatOrchestrator,
    renderer: RenderRequester,
    metrics: MetricsManager,
    max_image_bytes: usize,
}

impl SessionLoop {
    pub fn new(
        sessions: SessionManager,
        chat: ChatOrchestrator,
        renderer: RenderRequester,
        metrics: MetricsManager,
        config: &Config,
    ) -> Self {
        Self {
            sessions,
            chat,
            renderer,
            metrics,
            max_image_bytes: config.max_image_bytes,
        }
    }

    /// Opens a session and greets the user.
    pub async fn start_session(&self) -> ChatResponse {
        let session_id = self.sessions.create_session().await;
        self.metrics.increment_sessions().await;
        tracing::info!(session_id = %session_id, "session started");
        ChatResponse {
            session_id,
            phase: Phase::AwaitingPhoto,
            messages: vec![OutboundMessage::assistant(prompts::WELCOME)],
            starters: prompts::STARTERS.iter().map(Suggestion::from).collect(),
        }
    }

    pub async fn end_session(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove_session(session_id).await;
        if removed {
            tracing::info!(session_id, "session ended");
        }
        removed
    }

    /// Processes one inbound event. Events of the same session are handled
    /// one at a time, in arrival order.
    pub async fn handle(&self, event: InboundEvent) -> Result<ChatResponse, AppError> {
        let text = event
            .text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        if text.is_none() && event.image.is_none() {
            return Err(AppError::BadRequest(
                "Message cannot be empty".to_string(),
            ));
        }

        let session_id = match event.session_id {
            Some(s) if !s.trim().is_empty() => self.sessions.ensure_session(s.trim()).await,
            _ => {
                self.metrics.increment_sessions().await;
                self.sessions.create_session().await
            }
        };
        let mut session = self
            .sessions
            .acquire(&session_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("session {session_id} has ended")))?;

        let mut messages = Vec::new();

        let image = match event.image.map(|u| u.decode(self.max_image_bytes)) {
            None => None,
            Some(Ok(image)) => Some(image),
            Some(Err(e)) => {
                messages.push(self.report(&session_id, "upload", &e).await);
                return Ok(respond(&session, messages));
            }
        };

        let previous = session.phase;
        if image.is_some() {
            session.phase = Phase::Analyzing;
        }

        match self.chat.respond(&mut session, Turn::user(text, image)).await {
            Ok(reply) => {
                self.metrics.increment_chat_turns().await;
                messages.push(OutboundMessage::assistant(reply.text()));
            }
            Err(e) => {
                session.phase = previous;
                messages.push(self.report(&session_id, "chat", &e).await);
                return Ok(respond(&session, messages));
            }
        }
        session.phase = settled_phase(&session);

        if should_render(&session) {
            if let Some(request) = RenderRequest::for_session(&session) {
                let refining = session.has_rendering();
                let before = session.phase;
                session.phase = Phase::Rendering;
                tracing::info!(
                    session_id = %session_id,
                    refining,
                    source_bytes = request.source_image.len(),
                    "requesting rendering"
                );

                match self.renderer.render(&request).await {
                    Ok(generated) => {
                        let caption = if refining {
                            prompts::REFINEMENT_READY
                        } else {
                            prompts::RENDERING_READY
                        };
                        let data_url = generated.image.to_data_url();
                        session.push_turn(Turn::rendering(caption, generated.image));
                        session.phase = Phase::AwaitingFeedback;
                        self.metrics.increment_renderings(session.style()).await;

                        messages.push(OutboundMessage::assistant(caption).with_image(data_url));
                        messages.push(OutboundMessage::assistant(prompts::AFTER_RENDERING_HINT));
                    }
                    Err(e) => {
                        session.phase = before;
                        messages.push(self.report(&session_id, "render", &e).await);
                    }
                }
            }
        }

        Ok(respond(&session, messages))
    }

    async fn report(&self, session_id: &str, operation: &'static str, err: &ServiceError) -> OutboundMessage {
        tracing::error!(
            session_id,
            operation,
            code = err.code(),
            error = %err,
            "request failed"
        );
        self.metrics.increment_failure(err.code()).await;
        OutboundMessage::failure(err.code(), err.user_message())
    }
}

fn settled_phase(session: &Session) -> Phase {
    if session.latest_image().is_none() {
        Phase::AwaitingPhoto
    } else if session.has_rendering() {
        Phase::AwaitingFeedback
    } else {
        Phase::GatheringPreferences
    }
}

fn respond(session: &Session, messages: Vec<OutboundMessage>) -> ChatResponse {
    ChatResponse {
        session_id: session.id.clone(),
        phase: session.phase,
        messages,
        starters: Vec::new(),
    }
}
