use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::Json;
use chart_journal::{ChartFilter, ChartListParams};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DeleteChartBody {
    pub id: Option<String>,
}

/// GET /api/charts?start=2024-03-01&end=2024-03-31&executed=true&strategyType=...
///
/// List charts matching the filter, newest first.
pub async fn list_charts(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ChartListParams>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(params) = params?;
    let filter = ChartFilter::from_params(&params)?;

    let charts = state
        .journal
        .run(move |j| j.charts().list(&filter))
        .await?;

    let count = charts.len();
    Ok(Json(json!({ "charts": charts, "count": count })))
}

/// GET /api/charts/{id}
pub async fn get_chart(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let lookup = id.clone();
    let chart = state
        .journal
        .run(move |j| j.charts().get(&lookup))
        .await?
        .ok_or_else(|| AppError::not_found(format!("Chart not found: {id}")))?;

    Ok(Json(json!({ "chart": chart })))
}

/// DELETE /api/charts with body `{"id": "..."}`
///
/// Removes the chart after attempting to delete each hosted image.
pub async fn delete_chart(
    State(state): State<Arc<AppState>>,
    body: Result<Json<DeleteChartBody>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = body?;
    let id = body
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("Chart ID is required"))?;

    let report = state
        .journal
        .run(move |j| j.charts().delete(&id))
        .await?;

    Ok(Json(json!({ "success": true, "images": report })))
}
