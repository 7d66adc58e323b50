use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use garden_design_backend::{config::Config, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    // Missing credentials stop the process before it serves anything.
    let config = Config::from_env().context("loading configuration")?;
    tracing::info!(?config, "configuration loaded");

    let state = Arc::new(AppState::from_config(&config).context("building API clients")?);

    let sessions = state.sessions.clone();
    let ttl = config.session_ttl;
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(ttl.min(Duration::from_secs(60)).max(Duration::from_secs(1)));
        loop {
            tick.tick().await;
            let removed = sessions.purge_expired().await;
            if removed > 0 {
                tracing::info!(removed, "purged idle sessions");
            }
        }
    });

    let app = routes::create_router(state)
        .route("/", get(|| async { "YOU ARE CONNECTED " }))
        .layer(CorsLayer::very_permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;

    tracing::info!("garden design backend running at http://{}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
