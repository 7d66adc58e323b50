// src/routes/mod.rs
pub mod chat;

use crate::state::SharedState;
use axum::{
    Router,
    extract::{DefaultBodyLimit, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
};
use chat::{chat_handler, end_session_handler, get_metrics_handler, start_session_handler};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub fn create_router(state: SharedState) -> Router {
    let mut router = Router::new()
        .route("/sessions", post(start_session_handler))
        .route("/sessions/{id}", delete(end_session_handler))
        .route("/chat", post(chat_handler))
        .route("/health", get(|| async { "OK" }));

    if state.admin_key.is_some() {
        let admin_routes = Router::new()
            .route("/metrics", get(get_metrics_handler))
            .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
        router = router.nest("/admin", admin_routes);
    }

    router
        .fallback_service(ServeDir::new("public"))
        .layer(DefaultBodyLimit::max(state.body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn auth_middleware(
    State(state): State<SharedState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // API Key check.
    match (req.headers().get("x-admin-key"), state.admin_key.as_deref()) {
        (Some(val), Some(key)) if val == key => Ok(next.run(req).await),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}
