//! Trading chart journal.
//!
//! Stores uploaded stock-chart screenshots with their trading date, strategy
//! tag, ticker, market-cap bucket and whether the trade was taken. Records live
//! in DuckDB; image files live on an external host and are referenced by URL.
//!
//! # Quick start
//!
//! ```no_run
//! use chart_journal::{ChartFilter, ChartJournal, NewChart};
//!
//! let journal = ChartJournal::builder()
//!     .database_path("data/charts.duckdb")
//!     .build()
//!     .unwrap();
//!
//! let breakout = journal.strategy_types().create("Breakout Trading").unwrap();
//! let id = journal
//!     .charts()
//!     .create(&NewChart {
//!         images: vec!["https://utfs.io/f/abc".into()],
//!         strategy_type: Some(breakout.id.clone()),
//!         date: Some("2024-03-01".into()),
//!         executed: Some(true),
//!         ..Default::default()
//!     })
//!     .unwrap();
//!
//! let charts = journal
//!     .charts()
//!     .list(&ChartFilter::all().executed(true).strategy("breakout trading"))
//!     .unwrap();
//! assert!(charts.iter().any(|c| c.id == id));
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod config;
pub mod connection;
pub mod error;
pub mod file_host;
pub mod filter;
pub mod models;
pub mod queries;
pub mod sql_builder;

#[cfg(feature = "async")]
pub use async_client::AsyncChartJournal;
pub use connection::Connection;
pub use error::{JournalError, Result};
pub use file_host::{DisabledFileHost, FileHost, HostedFile, UploadThingHost};
pub use filter::{ChartFilter, ChartListParams, DateRange, ExecutedFilter};
pub use models::{Chart, DeleteReport, MarketCap, NewChart, StrategyAudit, StrategyType};
pub use sql_builder::SqlBuilder;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

// ---------------------------------------------------------------------------
// ChartJournalBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`ChartJournal`].
pub struct ChartJournalBuilder {
    database: Option<PathBuf>,
    in_memory: bool,
    file_host: Option<Arc<dyn FileHost>>,
    uploadthing_key: Option<String>,
    uploadthing_url: Option<String>,
    timeout: Duration,
}

impl Default for ChartJournalBuilder {
    fn default() -> Self {
        Self {
            database: None,
            in_memory: false,
            file_host: None,
            uploadthing_key: None,
            uploadthing_url: None,
            timeout: config::DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl ChartJournalBuilder {
    /// Database file location. Defaults to the platform data directory
    /// (e.g. `~/.local/share/chart-journal/charts.duckdb` on Linux).
    pub fn database_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.database = Some(path.as_ref().to_path_buf());
        self
    }

    /// Use a throwaway in-memory database.
    pub fn in_memory(mut self) -> Self {
        self.in_memory = true;
        self
    }

    /// Use a specific file host. Takes precedence over [`uploadthing`](Self::uploadthing).
    pub fn file_host(mut self, host: Arc<dyn FileHost>) -> Self {
        self.file_host = Some(host);
        self
    }

    /// Host images on UploadThing with the given API key.
    pub fn uploadthing(mut self, api_key: impl Into<String>) -> Self {
        self.uploadthing_key = Some(api_key.into());
        self
    }

    /// Override the UploadThing API base URL.
    pub fn uploadthing_url(mut self, url: impl Into<String>) -> Self {
        self.uploadthing_url = Some(url.into());
        self
    }

    /// HTTP timeout for file-host calls. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Open the database (applying the schema) and set up the file host.
    ///
    /// Without a file host or UploadThing key, uploads fail and image
    /// deletions are skipped.
    pub fn build(self) -> Result<ChartJournal> {
        let conn = if self.in_memory {
            Connection::open_in_memory()?
        } else {
            Connection::open(self.database.unwrap_or_else(config::default_database_path))?
        };

        let files: Arc<dyn FileHost> = match (self.file_host, self.uploadthing_key) {
            (Some(host), _) => host,
            (None, Some(key)) => Arc::new(UploadThingHost::new(
                key,
                self.uploadthing_url.as_deref(),
                self.timeout,
            )?),
            (None, None) => {
                warn!("No file host configured; uploads are disabled");
                Arc::new(DisabledFileHost)
            }
        };

        Ok(ChartJournal { conn, files })
    }
}

// ---------------------------------------------------------------------------
// ChartJournal
// ---------------------------------------------------------------------------

/// Owns the database connection and file host and hands out query interfaces.
///
/// Created via [`ChartJournal::builder()`].
pub struct ChartJournal {
    conn: Connection,
    files: Arc<dyn FileHost>,
}

impl ChartJournal {
    pub fn builder() -> ChartJournalBuilder {
        ChartJournalBuilder::default()
    }

    /// Chart records: create, list, get, delete.
    pub fn charts(&self) -> queries::ChartQuery<'_> {
        queries::ChartQuery::new(&self.conn, self.files.as_ref())
    }

    /// Strategy type reference data.
    pub fn strategy_types(&self) -> queries::StrategyTypeQuery<'_> {
        queries::StrategyTypeQuery::new(&self.conn)
    }

    /// Ping the database and list its tables.
    pub fn health(&self) -> Result<Vec<String>> {
        self.conn.ping()?;
        self.conn.tables()
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Release the connection and file host.
    pub fn close(self) {
        drop(self);
    }
}

impl fmt::Display for ChartJournal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChartJournal(database={})", self.conn.location())
    }
}
