//! Chart record queries: create, list, get and cascading delete.

use base64::Engine;
use chrono::{DateTime, Utc};
use duckdb::ToSql;
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::CHARTS_TABLE;
use crate::connection::Connection;
use crate::error::{JournalError, Result};
use crate::file_host::FileHost;
use crate::filter::ChartFilter;
use crate::models::{
    format_instant, now, parse_instant, Chart, DayBound, DeleteReport, MarketCap, NewChart,
};
use crate::queries::strategy_types::StrategyTypeQuery;
use crate::sql_builder::SqlBuilder;

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// A `charts` row as returned by DuckDB; `images` is a JSON array in text.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartRow {
    id: String,
    date: DateTime<Utc>,
    images: String,
    strategy_type: String,
    stock_name: Option<String>,
    market_cap: Option<MarketCap>,
    executed: Option<bool>,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ChartRow> for Chart {
    type Error = JournalError;

    fn try_from(row: ChartRow) -> Result<Self> {
        Ok(Chart {
            images: serde_json::from_str(&row.images)?,
            id: row.id,
            date: row.date,
            strategy_type: row.strategy_type,
            stock_name: row.stock_name,
            market_cap: row.market_cap,
            executed: row.executed,
            description: row.description,
            created_at: row.created_at,
        })
    }
}

/// An image file received by the server, not yet hosted.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Where the bytes of a chart image can be obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Hosted externally; fetch from the URL.
    Remote(String),
    /// Legacy inline `data:` URL, already decoded.
    Inline { content_type: String, bytes: Vec<u8> },
}

/// Validated scalar fields of a [`NewChart`].
struct ChartFields {
    date: DateTime<Utc>,
    strategy_type: String,
    stock_name: Option<String>,
    market_cap: Option<MarketCap>,
    executed: Option<bool>,
    description: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn validate_fields(new: &NewChart) -> Result<ChartFields> {
    let strategy_type = non_blank(&new.strategy_type)
        .ok_or_else(|| JournalError::InvalidArgument("strategyType is required".into()))?;
    let date = non_blank(&new.date)
        .ok_or_else(|| JournalError::InvalidArgument("date is required".into()))?;
    let date = parse_instant(&date, DayBound::Start)?;
    let market_cap = non_blank(&new.market_cap)
        .map(|m| m.parse::<MarketCap>())
        .transpose()?;

    Ok(ChartFields {
        date,
        strategy_type,
        stock_name: non_blank(&new.stock_name),
        market_cap,
        executed: new.executed,
        description: non_blank(&new.description),
    })
}

/// Split a `data:<type>;base64,<payload>` URL.
fn decode_data_url(url: &str) -> Result<ImageSource> {
    let malformed = || JournalError::InvalidArgument("invalid inline image data".into());
    let rest = url.strip_prefix("data:").ok_or_else(malformed)?;
    let (content_type, payload) = rest.split_once(";base64,").ok_or_else(malformed)?;
    if content_type.is_empty() {
        return Err(malformed());
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|_| malformed())?;
    Ok(ImageSource::Inline {
        content_type: content_type.to_string(),
        bytes,
    })
}

/// Distinct `strategyType` values stored on charts, sorted.
pub(crate) fn distinct_strategy_values(conn: &Connection) -> Result<Vec<String>> {
    let (sql, params) = SqlBuilder::new(CHARTS_TABLE)
        .select(&["strategyType"])
        .distinct()
        .order_by(&["strategyType"])
        .build();
    Ok(conn
        .execute(&sql, &params)?
        .into_iter()
        .filter_map(|mut r| match r.remove("strategyType") {
            Some(serde_json::Value::String(s)) => Some(s),
            _ => None,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// ChartQuery
// ---------------------------------------------------------------------------

/// Query interface for the `charts` table.
///
/// Holds the file host so deletes can remove the hosted images.
pub struct ChartQuery<'a> {
    conn: &'a Connection,
    files: &'a dyn FileHost,
}

impl<'a> ChartQuery<'a> {
    /// Create a new `ChartQuery` bound to the given connection and file host.
    pub fn new(conn: &'a Connection, files: &'a dyn FileHost) -> Self {
        Self { conn, files }
    }

    // -- Create ------------------------------------------------------------

    /// Validate and store a chart whose images are already hosted.
    ///
    /// Returns the new chart id.
    pub fn create(&self, new: &NewChart) -> Result<String> {
        let fields = validate_fields(new)?;
        let images = new.image_refs();
        if images.is_empty() {
            return Err(JournalError::InvalidArgument(
                "at least one image is required".into(),
            ));
        }
        self.insert(&fields, &images)
    }

    /// Upload image files to the host, then store the chart.
    ///
    /// Field validation happens before any upload. If an upload or the insert
    /// fails, files uploaded so far are deleted again (best-effort).
    pub fn create_with_uploads(&self, new: &NewChart, uploads: Vec<ImageUpload>) -> Result<String> {
        let fields = validate_fields(new)?;
        let mut images = new.image_refs();
        if images.is_empty() && uploads.is_empty() {
            return Err(JournalError::InvalidArgument(
                "at least one image is required".into(),
            ));
        }

        let mut hosted: Vec<String> = Vec::with_capacity(uploads.len());
        for upload in uploads {
            match self
                .files
                .upload(&upload.file_name, &upload.content_type, upload.bytes)
            {
                Ok(file) => hosted.push(file.url),
                Err(e) => {
                    self.discard_hosted(&hosted);
                    return Err(e);
                }
            }
        }

        images.extend(hosted.iter().cloned());
        self.insert(&fields, &images).inspect_err(|_| self.discard_hosted(&hosted))
    }

    fn discard_hosted(&self, urls: &[String]) {
        for url in urls {
            if let Err(e) = self.files.delete(url) {
                warn!("Could not remove orphaned upload {}: {}", url, e);
            }
        }
    }

    fn insert(&self, fields: &ChartFields, images: &[String]) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let date = format_instant(&fields.date);
        let images_json = serde_json::to_string(images)?;
        let market_cap = fields.market_cap.map(|m| m.as_str());
        let created_at = format_instant(&now());

        self.conn.execute_update(
            &format!(
                "INSERT INTO {} (id, date, images, strategyType, stockName, marketCap, \
                 executed, description, createdAt) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                CHARTS_TABLE
            ),
            &[
                &id,
                &date,
                &images_json,
                &fields.strategy_type,
                &fields.stock_name,
                &market_cap,
                &fields.executed,
                &fields.description,
                &created_at,
            ],
        )?;
        info!(
            "Stored chart {} ({} image(s), date {}, strategy {})",
            id,
            images.len(),
            date,
            fields.strategy_type
        );
        Ok(id)
    }

    // -- Read --------------------------------------------------------------

    fn filtered(&self, filter: &ChartFilter) -> Result<SqlBuilder> {
        let resolved = match &filter.strategy_type {
            Some(input) => StrategyTypeQuery::new(self.conn).resolve(input)?,
            None => None,
        };
        debug!(?filter, resolved = ?resolved.as_ref().map(|s| &s.id), "chart filter");
        let mut qb = SqlBuilder::new(CHARTS_TABLE);
        filter.apply(&mut qb, resolved.as_ref());
        Ok(qb)
    }

    /// All charts matching `filter`, newest `date` first.
    ///
    /// Charts sharing a date keep insertion order.
    pub fn list(&self, filter: &ChartFilter) -> Result<Vec<Chart>> {
        let (sql, params) = self
            .filtered(filter)?
            .order_by(&["date DESC", "seq ASC"])
            .build();
        self.conn
            .execute_into::<ChartRow>(&sql, &params)?
            .into_iter()
            .map(Chart::try_from)
            .collect()
    }

    /// Number of charts matching `filter`.
    pub fn count(&self, filter: &ChartFilter) -> Result<usize> {
        let (sql, params) = self.filtered(filter)?.build_count();
        let n = self
            .conn
            .execute_scalar(&sql, &params)?
            .and_then(|v| v.as_i64())
            .unwrap_or(0);
        Ok(n as usize)
    }

    pub fn get(&self, id: &str) -> Result<Option<Chart>> {
        let (sql, params) = SqlBuilder::new(CHARTS_TABLE)
            .where_eq("id", id)
            .limit(1)
            .build();
        self.conn
            .execute_into::<ChartRow>(&sql, &params)?
            .into_iter()
            .next()
            .map(Chart::try_from)
            .transpose()
    }

    /// Every distinct stored `strategyType`, ids and legacy names alike.
    pub fn distinct_strategy_values(&self) -> Result<Vec<String>> {
        distinct_strategy_values(self.conn)
    }

    /// Locate image `index` of chart `id`.
    pub fn image_source(&self, id: &str, index: usize) -> Result<ImageSource> {
        let chart = self
            .get(id)?
            .ok_or_else(|| JournalError::NotFound(format!("chart {id}")))?;
        let image = chart
            .images
            .get(index)
            .ok_or_else(|| JournalError::NotFound(format!("image {index} of chart {id}")))?;
        if image.starts_with("data:") {
            decode_data_url(image)
        } else {
            Ok(ImageSource::Remote(image.clone()))
        }
    }

    // -- Delete ------------------------------------------------------------

    /// Delete a chart and, best-effort, each of its hosted images.
    ///
    /// Every image is attempted exactly once; failures are logged and
    /// counted but never stop the record from being removed.
    pub fn delete(&self, id: &str) -> Result<DeleteReport> {
        let chart = self
            .get(id)?
            .ok_or_else(|| JournalError::NotFound(format!("chart {id}")))?;

        let mut report = DeleteReport::default();
        for url in &chart.images {
            report.images_attempted += 1;
            if let Err(e) = self.files.delete(url) {
                report.images_failed += 1;
                warn!("Chart {}: failed to delete image {}: {}", id, url, e);
            }
        }

        let (sql, params) = SqlBuilder::new(CHARTS_TABLE)
            .where_eq("id", id)
            .build_delete()
            .ok_or_else(|| JournalError::InvalidArgument("unconditioned delete".into()))?;
        let bound: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();
        let removed = self.conn.execute_update(&sql, &bound)?;
        if removed == 0 {
            return Err(JournalError::NotFound(format!("chart {id}")));
        }

        info!(
            "Deleted chart {} ({} image(s) attempted, {} failed)",
            id, report.images_attempted, report.images_failed
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_urls_decode() {
        let src = decode_data_url("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(
            src,
            ImageSource::Inline {
                content_type: "image/png".into(),
                bytes: b"hello".to_vec()
            }
        );
    }

    #[test]
    fn malformed_data_urls_are_rejected() {
        for bad in ["data:image/png,abc", "data:;base64,aGVsbG8=", "data:image/png;base64,!!!"] {
            assert!(decode_data_url(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn validation_requires_strategy_and_date() {
        let mut new = NewChart {
            images: vec!["https://host/f/a".into()],
            ..Default::default()
        };
        assert!(validate_fields(&new).is_err());
        new.strategy_type = Some("st".into());
        assert!(validate_fields(&new).is_err());
        new.date = Some("2024-03-01".into());
        assert!(validate_fields(&new).is_ok());
        new.market_cap = Some("micro".into());
        assert!(validate_fields(&new).is_err());
    }
}
