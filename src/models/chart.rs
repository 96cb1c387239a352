use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::JournalError;

// ---------------------------------------------------------------------------
// MarketCap
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketCap {
    Small,
    Large,
}

impl MarketCap {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketCap::Small => "small",
            MarketCap::Large => "large",
        }
    }
}

impl FromStr for MarketCap {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(MarketCap::Small),
            "large" => Ok(MarketCap::Large),
            other => Err(JournalError::InvalidArgument(format!(
                "marketCap must be 'small' or 'large', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for MarketCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Chart
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    pub id: String,
    /// The trading day the chart documents, not the upload time.
    pub date: DateTime<Utc>,
    pub images: Vec<String>,
    /// StrategyType id, or a free-text name on records that predate ids.
    pub strategy_type: String,
    pub stock_name: Option<String>,
    pub market_cap: Option<MarketCap>,
    /// `None` on records that never recorded whether the trade was taken.
    pub executed: Option<bool>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// NewChart
// ---------------------------------------------------------------------------

/// Create input as received from a client.
///
/// Accepts both the current `images` list and the legacy single
/// `image`/`imageUrl` field; the two are merged on create.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChart {
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, alias = "imageUrl")]
    pub image: Option<String>,
    pub strategy_type: Option<String>,
    pub stock_name: Option<String>,
    pub market_cap: Option<String>,
    pub executed: Option<bool>,
    pub description: Option<String>,
    pub date: Option<String>,
}

impl NewChart {
    /// All non-blank image references, legacy field last.
    pub fn image_refs(&self) -> Vec<String> {
        self.images
            .iter()
            .chain(self.image.iter())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// DeleteReport
// ---------------------------------------------------------------------------

/// Outcome of a chart delete. Image failures are counted, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReport {
    pub images_attempted: usize,
    pub images_failed: usize,
}
