use std::path::PathBuf;
use std::time::Duration;

pub const CHARTS_TABLE: &str = "charts";
pub const STRATEGY_TYPES_TABLE: &str = "strategy_types";

pub const UPLOADTHING_API_URL: &str = "https://api.uploadthing.com";
pub const UPLOADTHING_API_KEY_HEADER: &str = "x-uploadthing-api-key";

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Strategy names inserted by [`StrategyTypeQuery::seed_defaults`](crate::queries::StrategyTypeQuery::seed_defaults).
pub const DEFAULT_STRATEGIES: [&str; 10] = [
    "Trend Following",
    "Mean Reversion",
    "Breakout Trading",
    "Momentum Trading",
    "Counter-Trend",
    "Support/Resistance",
    "Gap Trading",
    "Price Action",
    "Volume-Based",
    "Moving Average Strategy",
];

pub fn default_database_path() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        data.join("chart-journal").join("charts.duckdb")
    } else {
        PathBuf::from(".chart-journal/charts.duckdb")
    }
}
