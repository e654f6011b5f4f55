use axum::{Router, routing::post};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};

use crate::config::WidgetConfig;
use crate::es_client::EsClient;

pub mod handlers;
pub mod models;

/// Shared by every request; each search still gets its own widget and targets.
pub struct AppState {
    pub client: EsClient,
    pub widget_config: WidgetConfig,
}

pub fn create_router(state: Arc<AppState>, static_dir: &str) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // API routes
        .route("/api/search", post(handlers::search_handler))
        .with_state(state)
        // Host page with the two target elements
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors)
}
