//! API routes module

pub mod mcp;
pub mod status;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::api::state::AppState;

type SharedState = Arc<AppState>;

/// Create the combined router. MCP clients differ in whether they post
/// to `/` or `/mcp` so both are served.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/",
            get(status::router::status_handler).post(mcp::router::mcp_handler),
        )
        .route("/health", get(status::router::health_handler))
        .route("/mcp", post(mcp::router::mcp_handler))
        .route("/mcp/info", get(status::router::info_handler))
}
