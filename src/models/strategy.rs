use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyType {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// How the `strategyType` values stored on charts relate to known strategy types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyAudit {
    /// Values that are a strategy type id.
    pub by_id: Vec<String>,
    /// Legacy values that match a strategy type name (case-insensitive).
    pub by_name: Vec<String>,
    /// Values matching neither.
    pub unknown: Vec<String>,
}

impl StrategyAudit {
    pub fn is_clean(&self) -> bool {
        self.by_name.is_empty() && self.unknown.is_empty()
    }
}
