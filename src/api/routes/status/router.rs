//! Router for the status routes

use std::sync::Arc;

use axum::{extract::State, response::Json};
use chrono::Utc;

use super::public::{Capabilities, InfoResponse, StatusResponse};
use crate::api::public::mcp::{PROTOCOL_VERSION, SERVER_NAME, SERVER_VERSION};
use crate::api::state::AppState;

type SharedState = Arc<AppState>;

pub async fn status_handler(State(state): State<SharedState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: String::from("ok"),
        server: SERVER_NAME.to_string(),
        version: SERVER_VERSION.to_string(),
        timestamp: Utc::now().to_rfc3339(),
        started_at: state.started_at.to_rfc3339(),
    })
}

pub async fn health_handler() -> &'static str {
    "ok"
}

pub async fn info_handler(State(state): State<SharedState>) -> Json<InfoResponse> {
    let hours = &state.config.business_hours;
    Json(InfoResponse {
        protocol: String::from("mcp"),
        protocol_version: PROTOCOL_VERSION.to_string(),
        version: SERVER_VERSION.to_string(),
        server: SERVER_NAME.to_string(),
        capabilities: Capabilities { tools: true },
        tools: state.tools.names(),
        calendar_id: state.config.calendar_id.clone(),
        timezone: state.config.timezone.name().to_string(),
        business_hours: hours.label(),
        slot_minutes: hours.slot_minutes,
    })
}
