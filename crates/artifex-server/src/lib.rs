//! HTTP server for the artifex image store.
//!
//! Exposes [`ImageService`](artifex_service::ImageService) over a small JSON
//! API (upload, fetch, annotate, draw, list) plus health and info endpoints.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;
pub mod upload;

pub use config::ServerConfig;
pub use error::{ApiError, ServerError, ServerResult};
pub use server::ArtifexServer;
pub use state::AppState;
