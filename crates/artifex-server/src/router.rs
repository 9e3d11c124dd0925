use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all artifex endpoints.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/upload", post(handler::upload_handler))
        .route("/images", get(handler::list_images_handler))
        .route("/images/:id", get(handler::get_image_handler))
        .route("/annotate", post(handler::annotate_handler))
        .route("/draw", post(handler::draw_handler));

    let base = Router::new()
        .route("/health", get(handler::health_handler))
        .route("/info", get(handler::info_handler));
    let app = if state.config.api_prefix.is_empty() {
        base.merge(api)
    } else {
        base.nest(&state.config.api_prefix, api)
    };

    let mut app = app
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(TraceLayer::new_for_http());
    if state.config.allow_any_origin {
        app = app.layer(CorsLayer::permissive());
    }
    app.with_state(state)
}
