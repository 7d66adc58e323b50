// src/error.rs
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Failures raised while talking to the hosted models or validating input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Network error, timeout or unexpected status from a hosted API.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Provider reported a billing or rate-limit problem.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Image is empty, unreadable, of an unsupported format or too large.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Provider safety filter refused the request.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// A required setting is absent at startup.
    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),
}

impl ServiceError {
    /// Only transport-level failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable(_))
    }

    /// Stable identifier used in logs and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::QuotaExceeded(_) => "quota_exceeded",
            Self::InvalidImage(_) => "invalid_image",
            Self::ContentBlocked(_) => "content_blocked",
            Self::ConfigurationMissing(_) => "configuration_missing",
        }
    }

    /// Apologetic text shown in the chat transcript.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::UpstreamUnavailable(_) => {
                "Sorry, I couldn't reach the design service just now. Please send your message again in a moment."
            }
            Self::QuotaExceeded(_) => {
                "Sorry, the design service has reached its usage limit for now. Please try again later."
            }
            Self::InvalidImage(_) => {
                "Sorry, I couldn't read that photo. Please upload a PNG, JPEG or WebP image that isn't too large."
            }
            Self::ContentBlocked(_) => {
                "Sorry, the image service declined this request. Try describing the change differently."
            }
            Self::ConfigurationMissing(_) => {
                "Sorry, the design service is not configured correctly."
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
