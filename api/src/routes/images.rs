use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Redirect, Response};
use chart_journal::queries::ImageSource;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ImageParams {
    pub index: Option<usize>,
}

/// GET /api/images/{id}?index=0
///
/// Redirects to the hosted file. Legacy inline `data:` images are decoded
/// and served directly with their content type.
pub async fn get_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    params: Result<Query<ImageParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(params) = params?;
    let index = params.index.unwrap_or(0);

    let source = state
        .journal
        .run(move |j| j.charts().image_source(&id, index))
        .await?;

    Ok(match source {
        ImageSource::Remote(url) => Redirect::temporary(&url).into_response(),
        ImageSource::Inline {
            content_type,
            bytes,
        } => ([(CONTENT_TYPE, content_type)], bytes).into_response(),
    })
}
