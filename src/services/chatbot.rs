// src/services/chatbot.rs
use std::sync::Arc;

use crate::config::Config;
use crate::error::ServiceError;
use crate::prompts;
use crate::services::providers::{ChatMessage, ChatModel, ChatPrompt};
use crate::services::retry::RetryPolicy;
use crate::services::session_manager::{Role, Session, Turn};

pub struct ChatOrchestrator {
    model: Arc<dyn ChatModel>,
    policy: RetryPolicy,
    history_window: usize,
}

impl ChatOrchestrator {
    pub fn new(model: Arc<dyn ChatModel>, config: &Config) -> Self {
        Self {
            model,
            policy: RetryPolicy::from_config(config),
            history_window: config.history_window.max(1),
        }
    }

    /// Sends the conversation plus `incoming` to the chat model. On success
    /// both turns are appended and the reply is returned; on failure the
    /// session is left exactly as it was.
    pub async fn respond(&self, session: &mut Session, incoming: Turn) -> Result<Turn, ServiceError> {
        let prompt = self.build_prompt(session, &incoming);
        let reply = self
            .policy
            .run("chat", || self.model.complete(&prompt))
            .await?;

        let reply = Turn::assistant(reply.trim());
        session.push_turn(incoming);
        session.push_turn(reply.clone());
        Ok(reply)
    }

    /// Persona, at most the last `history_window - 1` turns and the incoming
    /// one. The window opens on a user turn and only the newest image
    /// travels inline.
    pub fn build_prompt(&self, session: &Session, incoming: &Turn) -> ChatPrompt {
        let history = session.turns();
        let keep = self.history_window - 1;
        let mut start = history.len().saturating_sub(keep);
        while history.get(start).is_some_and(|t| t.role != Role::User) {
            start += 1;
        }
        let window = &history[start..];
        let turns: Vec<&Turn> = window.iter().chain(std::iter::once(incoming)).collect();
        let newest_image = turns.iter().rposition(|t| t.image.is_some());

        let messages = turns
            .iter()
            .enumerate()
            .map(|(i, turn)| {
                let inline = newest_image == Some(i);
                ChatMessage {
                    role: turn.role,
                    text: message_text(turn, inline),
                    image: if inline { turn.image.clone() } else { None },
                }
            })
            .collect();

        ChatPrompt {
            system: prompts::PERSONA.to_string(),
            messages,
        }
    }
}

fn message_text(turn: &Turn, inline: bool) -> String {
    let text = turn.text().trim();
    match (&turn.image, turn.role) {
        (None, _) => text.to_string(),
        (Some(_), Role::User) if text.is_empty() => {
            if inline {
                prompts::ANALYSIS_REQUEST.to_string()
            } else {
                prompts::IMAGE_OMITTED.to_string()
            }
        }
        (Some(_), Role::User) if inline => format!("{text}\n\n{}", prompts::ANALYSIS_REQUEST),
        (Some(_), _) if inline => text.to_string(),
        (Some(_), _) => format!("{} {text}", prompts::IMAGE_OMITTED).trim().to_string(),
    }
}
