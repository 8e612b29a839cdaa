use crate::agent::SqlAgent;
use crate::config::AppConfig;

/// Shared application state for the web server
pub struct AppState {
    pub config: AppConfig,
    pub agent: SqlAgent,
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: AppConfig, agent: SqlAgent) -> Self {
        Self {
            config,
            agent,
            startup_time: chrono::Utc::now(),
        }
    }
}
