//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::repository::FullRepository;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FullRepository>,
    /// Reported by the health endpoint
    pub service_name: String,
    pub version: String,
}

impl AppState {
    /// Create a new application state with the given repository.
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self {
            repository,
            service_name: crate::config::DEFAULT_SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Take service name and version from the server configuration.
    pub fn with_config(mut self, config: &ServerConfig) -> Self {
        self.service_name = config.service_name.clone();
        self.version = config.version.clone();
        self
    }
}
