use std::sync::Arc;

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::Json;
use chart_journal::queries::ImageUpload;
use chart_journal::NewChart;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

/// POST /api/upload
///
/// Accepts either a JSON body with already-hosted image URLs, or
/// `multipart/form-data` with one or more `file` parts plus the same fields
/// as text parts. Files are uploaded to the file host before the chart is
/// stored.
pub async fn upload_chart(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Value>, AppError> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let (new, uploads) = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;
        read_form(multipart).await?
    } else {
        let Json(new) = Json::<NewChart>::from_request(request, &state).await?;
        (new, Vec::new())
    };
    debug!(files = uploads.len(), "upload request");

    let id = state
        .journal
        .run(move |j| j.charts().create_with_uploads(&new, uploads))
        .await?;

    Ok(Json(json!({ "success": true, "id": id })))
}

/// Collect form fields into a [`NewChart`] and file parts into uploads.
async fn read_form(mut multipart: Multipart) -> Result<(NewChart, Vec<ImageUpload>), AppError> {
    let mut new = NewChart::default();
    let mut uploads = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "file" || name == "files" {
            let file_name = field.file_name().unwrap_or("chart").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field.bytes().await?;
            if !bytes.is_empty() {
                uploads.push(ImageUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let text = field.text().await?;
        match name.as_str() {
            "images" => new.images.push(text),
            "image" | "imageUrl" => new.image = Some(text),
            "strategyType" => new.strategy_type = Some(text),
            "stockName" => new.stock_name = Some(text),
            "marketCap" => new.market_cap = Some(text),
            "description" => new.description = Some(text),
            "date" => new.date = Some(text),
            "executed" => new.executed = parse_flag(&text)?,
            other => debug!(field = other, "ignoring unknown form field"),
        }
    }

    Ok((new, uploads))
}

fn parse_flag(text: &str) -> Result<Option<bool>, AppError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "true" | "on" | "1" => Ok(Some(true)),
        "false" | "off" | "0" => Ok(Some(false)),
        other => Err(AppError::bad_request(format!(
            "executed must be true or false, got '{other}'"
        ))),
    }
}
