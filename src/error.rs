#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("In use: {0}")]
    InUse(String),

    #[error("File host error: {0}")]
    FileHost(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl JournalError {
    /// True for errors caused by bad caller input rather than a failing
    /// dependency.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            JournalError::NotFound(_)
                | JournalError::InvalidArgument(_)
                | JournalError::AlreadyExists(_)
                | JournalError::InUse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, JournalError>;
