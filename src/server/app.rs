//! Axum application setup
//!
//! Creates and configures the Axum application with routes and middleware.

use crate::{config::Settings, session::SessionManager, session::UpstreamClient};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Session manager owning the token lifecycle
    pub session_manager: Arc<SessionManager>,
    /// Upstream client for the upload/convert calls
    pub upstream: UpstreamClient,
    /// Application settings
    pub settings: Arc<Settings>,
    /// Server start time for uptime calculation
    pub start_time: std::time::Instant,
}

/// Create the main Axum application with routes and middleware
pub fn create_app(settings: Settings) -> Router {
    let session_manager = Arc::new(SessionManager::new(settings.clone()));
    let upstream = session_manager.upstream_client();

    let state = AppState {
        session_manager,
        upstream,
        settings: Arc::new(settings.clone()),
        start_time: std::time::Instant::now(),
    };

    let router = Router::new()
        .route("/", get(super::handlers::index))
        .route(
            "/api/convert-statement",
            post(super::handlers::convert_statement),
        )
        .route("/ping", get(super::handlers::ping))
        .route("/session", get(super::handlers::session_status))
        .route(
            "/invalidate_session",
            post(super::handlers::invalidate_session),
        )
        .layer(DefaultBodyLimit::max(settings.server.max_body_size))
        .layer(TraceLayer::new_for_http());

    let router = if settings.server.enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.with_state(state)
}
