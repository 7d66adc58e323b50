// src/config.rs
use std::time::Duration;

use crate::error::ServiceError;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// Process-wide settings, read once at startup and handed to the services.
#[derive(Clone)]
pub struct Config {
    pub chat_api_key: String,
    pub image_api_key: String,
    pub api_base: String,
    pub chat_model: String,
    pub image_model: String,
    pub bind_addr: String,
    pub request_timeout: Duration,
    pub retry_backoff: Duration,
    pub session_ttl: Duration,
    pub history_window: usize,
    pub max_image_bytes: usize,
    pub admin_key: Option<String>,
}

impl std::fmt::Debug for Config {
    // Keys stay out of logs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_base", &self.api_base)
            .field("chat_model", &self.chat_model)
            .field("image_model", &self.image_model)
            .field("bind_addr", &self.bind_addr)
            .field("request_timeout", &self.request_timeout)
            .field("retry_backoff", &self.retry_backoff)
            .field("session_ttl", &self.session_ttl)
            .field("history_window", &self.history_window)
            .field("max_image_bytes", &self.max_image_bytes)
            .field("admin_key", &self.admin_key.as_ref().map(|_| "<set>"))
            .finish()
    }
}

impl Config {
    /// Settings with the given credentials and defaults for everything else.
    pub fn new(chat_api_key: impl Into<String>, image_api_key: impl Into<String>) -> Self {
        Self {
            chat_api_key: chat_api_key.into(),
            image_api_key: image_api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
            request_timeout: Duration::from_secs(90),
            retry_backoff: Duration::from_millis(500),
            session_ttl: Duration::from_secs(3600),
            history_window: 20,
            max_image_bytes: 7 * 1024 * 1024,
            admin_key: None,
        }
    }

    /// Reads the process environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self, ServiceError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Both credentials are mandatory.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServiceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let shared_key = get("GOOGLE_API_KEY");

        let chat_api_key = get("GEMINI_CHAT_API_KEY")
            .or_else(|| shared_key.clone())
            .ok_or_else(|| {
                ServiceError::ConfigurationMissing(
                    "GEMINI_CHAT_API_KEY (or GOOGLE_API_KEY) is not set".into(),
                )
            })?;
        let image_api_key = get("GEMINI_IMAGE_API_KEY")
            .or(shared_key)
            .ok_or_else(|| {
                ServiceError::ConfigurationMissing(
                    "GEMINI_IMAGE_API_KEY (or GOOGLE_API_KEY) is not set".into(),
                )
            })?;

        let mut config = Self::new(chat_api_key, image_api_key);

        if let Some(base) = get("GEMINI_API_BASE") {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(model) = get("GEMINI_CHAT_MODEL") {
            config.chat_model = model;
        }
        if let Some(model) = get("GEMINI_IMAGE_MODEL") {
            config.image_model = model;
        }
        if let Some(addr) = get("BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(secs) = parse_number(&get, "REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = parse_number(&get, "RETRY_BACKOFF_MS")? {
            config.retry_backoff = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_number(&get, "SESSION_TTL_SECS")? {
            config.session_ttl = Duration::from_secs(secs);
        }
        if let Some(window) = parse_number(&get, "HISTORY_WINDOW")? {
            config.history_window = window as usize;
        }
        if let Some(bytes) = parse_number(&get, "MAX_IMAGE_BYTES")? {
            config.max_image_bytes = bytes as usize;
        }
        config.admin_key = get("ADMIN_API_KEY");

        Ok(config)
    }
}

fn parse_number<G>(get: &G, key: &str) -> Result<Option<u64>, ServiceError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<u64>().map(Some).map_err(|_| {
            ServiceError::ConfigurationMissing(format!("{key} must be a whole number, got {raw:?}"))
        }),
    }
}
