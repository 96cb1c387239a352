//! Async wrapper around [`ChartJournal`] for use inside a Tokio runtime.
//!
//! Every operation runs on the blocking pool via
//! [`tokio::task::spawn_blocking`]: DuckDB calls and the blocking HTTP client
//! used by the file host must stay off the async executor.
//!
//! # Example
//!
//! ```no_run
//! use chart_journal::{AsyncChartJournal, ChartFilter};
//!
//! #[tokio::main]
//! async fn main() {
//!     let journal = AsyncChartJournal::builder()
//!         .database_path("data/charts.duckdb")
//!         .build()
//!         .await
//!         .unwrap();
//!
//!     let charts = journal
//!         .run(|j| j.charts().list(&ChartFilter::all()))
//!         .await
//!         .unwrap();
//!     println!("{} charts", charts.len());
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{JournalError, Result};
use crate::file_host::FileHost;
use crate::ChartJournal;

// ---------------------------------------------------------------------------
// AsyncChartJournalBuilder
// ---------------------------------------------------------------------------

/// Builder for an [`AsyncChartJournal`]; mirrors [`ChartJournalBuilder`](crate::ChartJournalBuilder).
#[derive(Default)]
pub struct AsyncChartJournalBuilder {
    database: Option<PathBuf>,
    in_memory: bool,
    file_host: Option<Arc<dyn FileHost>>,
    uploadthing_key: Option<String>,
    uploadthing_url: Option<String>,
    timeout: Option<Duration>,
}

impl AsyncChartJournalBuilder {
    pub fn database_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.database = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn in_memory(mut self) -> Self {
        self.in_memory = true;
        self
    }

    pub fn file_host(mut self, host: Arc<dyn FileHost>) -> Self {
        self.file_host = Some(host);
        self
    }

    pub fn uploadthing(mut self, api_key: impl Into<String>) -> Self {
        self.uploadthing_key = Some(api_key.into());
        self
    }

    pub fn uploadthing_url(mut self, url: impl Into<String>) -> Self {
        self.uploadthing_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build on the blocking pool so opening the database and constructing
    /// the HTTP client never block the executor.
    pub async fn build(self) -> Result<AsyncChartJournal> {
        tokio::task::spawn_blocking(move || {
            let mut builder = ChartJournal::builder();
            if let Some(path) = self.database {
                builder = builder.database_path(path);
            }
            if self.in_memory {
                builder = builder.in_memory();
            }
            if let Some(host) = self.file_host {
                builder = builder.file_host(host);
            }
            if let Some(key) = self.uploadthing_key {
                builder = builder.uploadthing(key);
            }
            if let Some(url) = self.uploadthing_url {
                builder = builder.uploadthing_url(url);
            }
            if let Some(timeout) = self.timeout {
                builder = builder.timeout(timeout);
            }
            Ok(AsyncChartJournal {
                inner: Arc::new(Mutex::new(builder.build()?)),
            })
        })
        .await
        .map_err(|e| JournalError::Runtime(format!("Task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// AsyncChartJournal
// ---------------------------------------------------------------------------

/// Async handle to a shared [`ChartJournal`].
///
/// Cloning is cheap; all clones share one connection, so concurrent calls are
/// serialized on it.
#[derive(Clone)]
pub struct AsyncChartJournal {
    inner: Arc<Mutex<ChartJournal>>,
}

impl AsyncChartJournal {
    pub fn builder() -> AsyncChartJournalBuilder {
        AsyncChartJournalBuilder::default()
    }

    /// Wrap an already-built journal.
    pub fn from_journal(journal: ChartJournal) -> Self {
        Self {
            inner: Arc::new(Mutex::new(journal)),
        }
    }

    /// Run a sync journal operation on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&ChartJournal) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let journal = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = journal
                .lock()
                .map_err(|_| JournalError::Runtime("journal lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(|e| JournalError::Runtime(format!("Task join error: {e}")))?
    }

    /// Ping the database and list its tables.
    pub async fn health(&self) -> Result<Vec<String>> {
        self.run(|j| j.health()).await
    }

    /// Drop this handle on the blocking pool.
    ///
    /// When it is the last clone, the connection and file host are released
    /// there rather than on the executor.
    pub async fn close(self) -> Result<()> {
        let inner = self.inner;
        tokio::task::spawn_blocking(move || drop(inner))
            .await
            .map_err(|e| JournalError::Runtime(format!("Task join error: {e}")))
    }
}
