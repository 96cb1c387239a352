use chart_journal::AsyncChartJournal;

/// Shared application state available to all route handlers via Axum's
/// `State` extractor.
pub struct AppState {
    /// Dispatches blocking journal operations (DuckDB, file host) to the
    /// blocking thread pool.
    pub journal: AsyncChartJournal,
}
