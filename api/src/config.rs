use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Server configuration: `config/default.toml`, then `config/local.toml`,
/// then `CHART_JOURNAL__*` environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub file_host: FileHostConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// File path, or `:memory:`.
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileHostConfig {
    /// UploadThing secret key. Without it uploads are disabled.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}
fn default_db_path() -> String {
    "data/charts.duckdb".to_string()
}
fn default_api_url() -> String {
    chart_journal::config::UPLOADTHING_API_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    chart_journal::config::DEFAULT_HTTP_TIMEOUT.as_secs()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for FileHostConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl FileHostConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The API key, if set to something non-blank.
    pub fn key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("CHART_JOURNAL").separator("__"))
            .build()
            .context("reading configuration")?;

        cfg.try_deserialize().context("invalid configuration")
    }
}
