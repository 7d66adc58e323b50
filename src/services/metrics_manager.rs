use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::prompts::Style;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MetricsData {
    pub sessions_started: u64,
    pub chat_turns: u64,
    pub renderings: u64,
    pub style_usage: HashMap<String, u64>,
    pub failures: HashMap<String, u64>,
}

#[derive(Debug, Clone)]
pub struct MetricsManager {
    inner: Arc<RwLock<MetricsData>>,
}

impl Default for MetricsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsManager {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MetricsData::default())),
        }
    }

    pub async fn increment_sessions(&self) {
        self.inner.write().await.sessions_started += 1;
    }

    pub async fn increment_chat_turns(&self) {
        self.inner.write().await.chat_turns += 1;
    }

    pub async fn increment_renderings(&self, style: Option<Style>) {
        let mut data = self.inner.write().await;
        data.renderings += 1;
        if let Some(style) = style {
            *data.style_usage.entry(style.name().to_string()).or_insert(0) += 1;
        }
    }

    pub async fn increment_failure(&self, code: &str) {
        let mut data = self.inner.write().await;
        *data.failures.entry(code.to_string()).or_insert(0) += 1;
    }

    pub async fn get_metrics(&self) -> MetricsData {
        self.inner.read().await.clone()
    }
}
