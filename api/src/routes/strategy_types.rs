use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::Json;
use chart_journal::StrategyType;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateStrategyBody {
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct DeleteStrategyParams {
    pub id: Option<String>,
}

/// GET /api/strategy-types
pub async fn list_strategy_types(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StrategyType>>, AppError> {
    let types = state.journal.run(|j| j.strategy_types().list()).await?;
    Ok(Json(types))
}

/// POST /api/strategy-types with body `{"name": "..."}`
pub async fn create_strategy_type(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateStrategyBody>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = body?;
    let name = body
        .name
        .ok_or_else(|| AppError::bad_request("Strategy name is required"))?;

    let created = state
        .journal
        .run(move |j| j.strategy_types().create(&name))
        .await?;

    Ok(Json(json!({
        "success": true,
        "id": created.id,
        "name": created.name
    })))
}

/// DELETE /api/strategy-types?id=...
///
/// Refused while any chart still references the strategy type.
pub async fn delete_strategy_type(
    State(state): State<Arc<AppState>>,
    params: Result<Query<DeleteStrategyParams>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(params) = params?;
    let id = params
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("Strategy type ID is required"))?;

    state
        .journal
        .run(move |j| j.strategy_types().delete(&id))
        .await?;

    Ok(Json(json!({ "success": true })))
}
