pub mod handlers;
pub mod page;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::finder::ContentFinder;
use crate::session::SessionStore;

/// Shared server state
pub struct AppState {
    pub finder: ContentFinder,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            finder: ContentFinder::new(config),
            sessions: SessionStore::new(Duration::from_secs(config.session_ttl_secs)),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/search", post(handlers::search))
        .route("/plan", post(handlers::plan))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: &Config, bind: &str) -> Result<()> {
    let state = Arc::new(AppState::new(config));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .context(format!("Failed to bind {}", bind))?;

    tracing::info!("Content finder listening on http://{}", bind);
    tracing::info!("Search model: {}", config.search_model);
    tracing::info!("Plan model: {}", config.plan_model);
    tracing::info!("Strategy style: {}", config.strategy_style);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
