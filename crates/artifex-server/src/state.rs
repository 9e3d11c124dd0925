use std::sync::Arc;

use artifex_service::ImageService;

use crate::config::ServerConfig;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ImageService>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(service: Arc<ImageService>, config: ServerConfig) -> Self {
        Self {
            service,
            config: Arc::new(config),
        }
    }
}
