//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The shell's HTTP surface: a home view, the aggregated route table and
//! navigation, and rendering of routed remote components. Any path not bound
//! here is looked up in the aggregated route table by the fallback handler.

pub mod shell;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::ShellState;

/// Paths bound by this router. A trailing `/*` reserves the whole prefix.
pub const RESERVED_PATHS: [&str; 3] = ["/", "/healthz", "/api/*"];

/// Build the shell router.
pub fn app(state: ShellState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(shell::home))
        .route("/api/routes", get(shell::list_routes))
        .route("/api/nav", get(shell::nav))
        .route("/api/render", get(shell::render))
        .route("/api/render/retry", post(shell::retry))
        .route("/healthz", get(healthz))
        .fallback(shell::render_fallback)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
