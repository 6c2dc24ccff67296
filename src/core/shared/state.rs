use crate::core::config::AppConfig;
use crate::core::shared::utils::DbPool;

/// Shared application state handed to every handler.
pub struct AppState {
    pub conn: DbPool,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(conn: DbPool, config: AppConfig) -> Self {
        Self { conn, config }
    }
}
