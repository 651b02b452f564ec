use std::sync::Arc;

use formgate_core::FormService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is immutable after start-up.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Submission pipeline for the configured database.
    pub forms: Arc<FormService>,
}

impl AppState {
    pub fn new(config: ServerConfig, forms: FormService) -> Self {
        Self {
            config: Arc::new(config),
            forms: Arc::new(forms),
        }
    }
}
