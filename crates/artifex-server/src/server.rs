use std::sync::Arc;

use artifex_index::InMemoryDedupIndex;
use artifex_overlay::Compositor;
use artifex_service::ImageService;
use artifex_store::FsImageStore;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// Artifex image server.
pub struct ArtifexServer {
    state: AppState,
}

impl ArtifexServer {
    /// Open the storage directories and build the service stack.
    pub async fn open(config: ServerConfig) -> ServerResult<Self> {
        config.validate()?;
        let store = FsImageStore::open(&config.storage_root).await?;
        tokio::fs::create_dir_all(&config.staging_dir).await?;
        let compositor = Compositor::new(config.overlay.clone())?;
        let index = InMemoryDedupIndex::new();

        let service = ImageService::new(Arc::new(store), Arc::new(index), Arc::new(compositor));
        Ok(Self::new(Arc::new(service), config))
    }

    /// Wrap an already-built service.
    pub fn new(service: Arc<ImageService>, config: ServerConfig) -> Self {
        Self {
            state: AppState::new(service, config),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    pub fn service(&self) -> &Arc<ImageService> {
        &self.state.service
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Serve until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let config = Arc::clone(&self.state.config);
        let app = self.router();
        let listener = TcpListener::bind(config.bind_addr).await?;

        if !self.state.service.index().is_persistent() {
            tracing::warn!(
                "dedup index is in memory only; uploads after a restart are not matched against earlier ones"
            );
        }
        tracing::info!(
            addr = %config.bind_addr,
            root = %config.storage_root.display(),
            prefix = %config.api_prefix,
            "artifex server listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        tracing::info!("artifex server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for Ctrl-C; shutting down");
    }
}
