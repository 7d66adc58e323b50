mod common;

use base64::Engine;
use common::{FakeChat, FakeEditor, app_state, app_state_with, png, test_config};
use garden_design_backend::message::ChatResponse;
use garden_design_backend::routes::create_router;
use garden_design_backend::services::session_manager::Phase;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::util::ServiceExt;

fn router() -> Router {
    create_router(app_state(FakeChat::replying(), FakeEditor::succeeding()))
}

fn post_json(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn read_chat(response: axum::response::Response) -> ChatResponse {
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = router()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_chat_endpoint() {
    let response = router()
        .oneshot(post_json(
            "/chat",
            r#"{"message": "hello", "session_id": null}"#.to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let chat_resp = read_chat(response).await;
    assert!(!chat_resp.session_id.is_empty());
    assert_eq!(chat_resp.phase, Phase::AwaitingPhoto);
    assert_eq!(chat_resp.messages[0].text, "Noted.");
}

#[tokio::test]
async fn test_start_session_offers_starters() {
    let response = router()
        .oneshot(post_json("/sessions", String::new()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
    let starters = json["starters"].as_array().unwrap();
    let labels: Vec<&str> = starters
        .iter()
        .map(|s| s["label"].as_str().unwrap())
        .collect();
    assert_eq!(
        labels,
        vec!["I want a pool", "Green garden", "Tropical style", "Zen garden"]
    );
    assert!(starters.iter().all(|s| s["message"].is_string()));
}

#[tokio::test]
async fn test_chat_responses_omit_starters() {
    let response = router()
        .oneshot(post_json("/chat", r#"{"message": "hello"}"#.to_string()))
        .await
        .unwrap();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
    assert!(json.get("starters").is_none());
}

#[tokio::test]
async fn test_empty_message_is_bad_request() {
    let response = router()
        .oneshot(post_json("/chat", r#"{"message": "  "}"#.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stateful_flow_integration() {
    let app = router();

    let response = app
        .clone()
        .oneshot(post_json("/sessions", String::new()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let chat_resp = read_chat(response).await;
    let session_id = chat_resp.session_id;
    assert!(chat_resp.messages[0].text.contains("Garden Design AI"));
    assert_eq!(chat_resp.starters.len(), 4);

    // Upload the photo as a data URL.
    let encoded = base64::engine::general_purpose::STANDARD.encode(png(1));
    let response = app
        .clone()
        .oneshot(post_json(
            "/chat",
            format!(
                r#"{{"session_id": "{session_id}", "image": "data:image/png;base64,{encoded}"}}"#
            ),
        ))
        .await
        .unwrap();
    let chat_resp = read_chat(response).await;
    assert_eq!(chat_resp.session_id, session_id);
    assert_eq!(chat_resp.phase, Phase::GatheringPreferences);

    // Preferences complete: a rendering comes back inline.
    let response = app
        .clone()
        .oneshot(post_json(
            "/chat",
            format!(
                r#"{{"session_id": "{session_id}", "message": "tropical with a pool and palm trees"}}"#
            ),
        ))
        .await
        .unwrap();
    let chat_resp = read_chat(response).await;
    assert_eq!(chat_resp.phase, Phase::AwaitingFeedback);
    let rendered = chat_resp
        .messages
        .iter()
        .find_map(|m| m.image.as_deref())
        .expect("rendering in response");
    assert!(rendered.starts_with("data:image/jpeg;base64,"));

    // End the session.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/sessions/{session_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/sessions/{session_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bad_base64_is_reported_in_chat() {
    let response = router()
        .oneshot(post_json(
            "/chat",
            r#"{"image": "%%%not-base64%%%"}"#.to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let chat_resp = read_chat(response).await;
    assert_eq!(chat_resp.messages.len(), 1);
    assert_eq!(chat_resp.messages[0].error.as_deref(), Some("invalid_image"));
}

#[tokio::test]
async fn test_admin_metrics_requires_key() {
    let mut config = test_config();
    config.admin_key = Some("letmein".into());
    let app = create_router(app_state_with(
        config,
        FakeChat::replying(),
        FakeEditor::succeeding(),
    ));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/admin/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/admin/metrics")
                .header("x-admin-key", "letmein")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_routes_absent_without_key() {
    let response = router()
        .oneshot(Request::builder().uri("/admin/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
