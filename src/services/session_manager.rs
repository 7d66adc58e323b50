// src/services/session_manager.rs
use std::{
    collections::HashMap,
    fmt::Debug,
    sync::Arc,
    time::{Duration, Instant, SystemTime},
};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use crate::image::ImageData;
use crate::prompts::Style;
use crate::services::preferences::Preferences;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug)]
pub struct Turn {
    pub role: Role,
    pub text: Option<String>,
    pub image: Option<ImageData>,
    pub timestamp: SystemTime,
}

impl Turn {
    pub fn user(text: Option<String>, image: Option<ImageData>) -> Self {
        Self {
            role: Role::User,
            text: text.filter(|t| !t.trim().is_empty()),
            image,
            timestamp: SystemTime::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: Some(text.into()),
            image: None,
            timestamp: SystemTime::now(),
        }
    }

    pub fn rendering(text: impl Into<String>, image: ImageData) -> Self {
        Self {
            image: Some(image),
            ..Self::assistant(text)
        }
    }

    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// Where a session stands in the design conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AwaitingPhoto,
    Analyzing,
    GatheringPreferences,
    Rendering,
    AwaitingFeedback,
}

#[derive(Clone, Debug)]
pub struct Session {
    pub id: String,
    turns: Vec<Turn>,
    latest_image: Option<ImageData>,
    style: Option<Style>,
    pub phase: Phase,
    pub last_active: Instant,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            turns: Vec::new(),
            latest_image: None,
            style: None,
            phase: Phase::AwaitingPhoto,
            last_active: Instant::now(),
        }
    }

    /// Appends a turn. Any image it carries becomes the session's latest image.
    pub fn push_turn(&mut self, turn: Turn) {
        if let Some(image) = &turn.image {
            self.latest_image = Some(image.clone());
        }
        self.turns.push(turn);
        self.style = Preferences::from_session(self).style;
        self.last_active = Instant::now();
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn latest_image(&self) -> Option<&ImageData> {
        self.latest_image.as_ref()
    }

    pub fn style(&self) -> Option<Style> {
        self.style
    }

    /// Turns since the most recent photo upload, which opens a new project.
    pub fn project_turns(&self) -> &[Turn] {
        let start = self
            .turns
            .iter()
            .rposition(|t| t.role == Role::User && t.image.is_some())
            .unwrap_or(0);
        &self.turns[start..]
    }

    /// Whether the current project already produced a rendering.
    pub fn has_rendering(&self) -> bool {
        self.project_turns()
            .iter()
            .any(|t| t.role == Role::Assistant && t.image.is_some())
    }

    pub fn last_user_turn(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.role == Role::User)
    }
}

#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<RwLock<HashMap<String, Arc<Mutex<Session>>>>>,
    ttl: Duration,
}

impl Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    // Create a fresh session and return its id.
    pub async fn create_session(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let session = Arc::new(Mutex::new(Session::new(id.clone())));

        let mut guard = self.inner.write().await;
        guard.insert(id.clone(), session);
        id
    }

    // Ensure there's a session with this id.
    pub async fn ensure_session(&self, id: &str) -> String {
        {
            let guard = self.inner.read().await;
            if guard.contains_key(id) {
                return id.to_string();
            }
        }
        let mut guard = self.inner.write().await;
        guard
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(id))));
        id.to_string()
    }

    /// Locks one session for the duration of an event. Other sessions stay
    /// available while the guard is held.
    pub async fn acquire(&self, session_id: &str) -> Option<OwnedMutexGuard<Session>> {
        let handle = {
            let guard = self.inner.read().await;
            guard.get(session_id).cloned()
        }?;
        let mut session = handle.lock_owned().await;
        session.last_active = Instant::now();
        Some(session)
    }

    /// Get a copy of the session history
    pub async fn get_history(&self, session_id: &str) -> Option<Vec<Turn>> {
        let session = self.acquire(session_id).await?;
        Some(session.turns().to_vec())
    }

    /// Snapshot of a whole session
    pub async fn snapshot(&self, session_id: &str) -> Option<Session> {
        let session = self.acquire(session_id).await?;
        Some(session.clone())
    }

    /// Remove a session by id
    pub async fn remove_session(&self, session_id: &str) -> bool {
        let mut guard = self.inner.write().await;
        guard.remove(session_id).is_some()
    }

    /// Remove sessions idle longer than ttl. Returns number removed.
    /// Sessions busy with an event are kept.
    pub async fn purge_expired(&self) -> usize {
        let mut guard = self.inner.write().await;
        let now = Instant::now();
        let before = guard.len();
        guard.retain(|_, handle| match handle.try_lock() {
            Ok(session) => now.duration_since(session.last_active) < self.ttl,
            Err(_) => true,
        });
        before - guard.len()
    }

    /// Number of sessions
    pub async fn len(&self) -> usize {
        let guard = self.inner.read().await;
        guard.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// List session ids
    pub async fn list_session_ids(&self) -> Vec<String> {
        let guard = self.inner.read().await;
        guard.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::fixtures::png;

    fn photo(tag: u8) -> ImageData {
        ImageData::from_bytes(png(tag), 1024).unwrap()
    }

    #[tokio::test]
    async fn basic_session_flow() {
        let mgr = SessionManager::new(Duration::from_secs(60));
        let sid = mgr.create_session().await;
        assert!(!sid.is_empty());
        {
            let mut session = mgr.acquire(&sid).await.unwrap();
            session.push_turn(Turn::user(Some("hello".into()), None));
        }
        let history = mgr.get_history(&sid).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(mgr.remove_session(&sid).await);
        assert!(mgr.acquire(&sid).await.is_none());
    }

    #[test]
    fn latest_image_follows_turns() {
        let mut session = Session::new("s");
        assert!(session.latest_image().is_none());

        session.push_turn(Turn::user(None, Some(photo(1))));
        assert_eq!(session.latest_image(), Some(&photo(1)));

        session.push_turn(Turn::assistant("nice garden"));
        assert_eq!(session.latest_image(), Some(&photo(1)));
        assert!(!session.has_rendering());

        session.push_turn(Turn::rendering("done", photo(2)));
        assert_eq!(session.latest_image(), Some(&photo(2)));
        assert!(session.has_rendering());
    }

    #[test]
    fn new_upload_starts_a_new_project() {
        let mut session = Session::new("s");
        session.push_turn(Turn::user(None, Some(photo(1))));
        session.push_turn(Turn::user(Some("zen please".into()), None));
        session.push_turn(Turn::rendering("done", photo(2)));
        assert_eq!(session.style(), Some(Style::Zen));

        session.push_turn(Turn::user(Some("another yard".into()), Some(photo(3))));
        assert_eq!(session.project_turns().len(), 1);
        assert!(!session.has_rendering());
        assert_eq!(session.style(), None);
        assert_eq!(session.turns().len(), 4);
    }

    #[test]
    fn blank_text_is_dropped() {
        let turn = Turn::user(Some("   ".into()), None);
        assert!(turn.text.is_none());
        assert_eq!(turn.text(), "");
    }

    #[tokio::test]
    async fn ensure_session_keeps_existing_history() {
        let mgr = SessionManager::new(Duration::from_secs(60));
        mgr.ensure_session("client-chosen").await;
        mgr.acquire("client-chosen")
            .await
            .unwrap()
            .push_turn(Turn::assistant("hi"));
        mgr.ensure_session("client-chosen").await;
        assert_eq!(mgr.get_history("client-chosen").await.unwrap().len(), 1);
        assert_eq!(mgr.len().await, 1);
    }

    #[tokio::test]
    async fn purge_skips_busy_sessions() {
        let mgr = SessionManager::new(Duration::from_millis(10));
        let busy = mgr.create_session().await;
        let idle = mgr.create_session().await;
        let guard = mgr.acquire(&busy).await.unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(mgr.purge_expired().await, 1);
        drop(guard);

        let ids = mgr.list_session_ids().await;
        assert_eq!(ids, vec![busy]);
        assert!(!ids.contains(&idle));
    }
}
