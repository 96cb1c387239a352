pub mod charts;
pub mod health;
pub mod images;
pub mod strategy_types;
pub mod upload;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

/// Chart screenshots are posted whole; allow more than axum's 2 MB default.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/charts",
            get(charts::list_charts).delete(charts::delete_chart),
        )
        .route("/api/charts/{id}", get(charts::get_chart))
        .route("/api/upload", post(upload::upload_chart))
        .route("/api/images/{id}", get(images::get_image))
        .route(
            "/api/strategy-types",
            get(strategy_types::list_strategy_types)
                .post(strategy_types::create_strategy_type)
                .delete(strategy_types::delete_strategy_type),
        )
        .route("/api/health", get(health::health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
