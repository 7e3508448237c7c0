use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::appointments::Clinic;
use crate::core::AppConfig;
use crate::google::CalendarApi;
use crate::tools::ToolRegistry;

pub struct AppState {
    pub config: AppConfig,
    pub tools: ToolRegistry,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: AppConfig, calendar: Arc<dyn CalendarApi>) -> Self {
        let clinic = Arc::new(Clinic::from_config(calendar, &config));
        Self {
            tools: ToolRegistry::new(clinic),
            config,
            started_at: Utc::now(),
        }
    }
}
