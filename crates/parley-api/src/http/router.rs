//! Axum router configuration with middleware.
//!
//! Chat routes live under `/api/`. Middleware: CORS and request tracing.
//!
//! A known path hit with the wrong method answers 405 with a JSON error body.
//! If `static_dir` exists it is served for every other path; otherwise only
//! the API and `/health` are available.

use std::path::Path;

use axum::Router;
use axum::extract::State;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::http::error::method_not_allowed;
use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState, static_dir: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route(
            "/chat/start",
            post(handlers::chat::start_chat).fallback(method_not_allowed),
        )
        .route(
            "/chat/stream",
            post(handlers::chat::stream_chat).fallback(method_not_allowed),
        )
        .route(
            "/chat/delete",
            post(handlers::chat::delete_chat).fallback(method_not_allowed),
        )
        .route(
            "/chat/history",
            get(handlers::conversation::get_history).fallback(method_not_allowed),
        )
        .route(
            "/user/conversations",
            get(handlers::conversation::list_conversations).fallback(method_not_allowed),
        );

    let mut router = Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if let Some(dir) = static_dir.filter(|dir| dir.is_dir()) {
        router = router.fallback_service(ServeDir::new(dir));
        tracing::info!(path = %dir.display(), "static file serving enabled");
    }

    router
}

/// GET /health - liveness plus the wired provider.
async fn health_check(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "provider": state.chat_service.provider_name(),
    }))
}
