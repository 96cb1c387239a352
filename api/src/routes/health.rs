use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/health
///
/// Pings the database and lists its tables.
pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let tables = state.journal.health().await?;
    Ok(Json(json!({ "status": "ok", "tables": tables })))
}
