//! Public types for the status routes
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub server: String,
    pub version: String,
    pub timestamp: String,
    pub started_at: String,
}

#[derive(Serialize, Deserialize)]
pub struct Capabilities {
    pub tools: bool,
}

#[derive(Serialize, Deserialize)]
pub struct InfoResponse {
    pub protocol: String,
    pub protocol_version: String,
    pub version: String,
    pub server: String,
    pub capabilities: Capabilities,
    pub tools: Vec<String>,
    pub calendar_id: String,
    pub timezone: String,
    pub business_hours: String,
    pub slot_minutes: u32,
}
