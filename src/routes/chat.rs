use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    error::AppError,
    message::{ChatRequest, ChatResponse},
    services::metrics_manager::MetricsData,
    services::session_loop::{InboundEvent, Upload},
    state::SharedState,
};

pub async fn start_session_handler(State(state): State<SharedState>) -> Json<ChatResponse> {
    Json(state.design.start_session().await)
}

pub async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let event = InboundEvent {
        session_id: payload.session_id,
        text: payload.message,
        image: payload
            .image
            .filter(|i| !i.trim().is_empty())
            .map(Upload::Base64),
    };
    let response = state.design.handle(event).await?;
    Ok(Json(response))
}

pub async fn end_session_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.design.end_session(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("no session {id}")))
    }
}

pub async fn get_metrics_handler(State(state): State<SharedState>) -> Json<MetricsData> {
    Json(state.metrics.get_metrics().await)
}
