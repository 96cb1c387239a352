mod config;
mod error;
mod routes;
mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use chart_journal::{AsyncChartJournal, DisabledFileHost};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::AppConfig;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "chart-journal-api", about = "Trading chart journal server", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Listen address, overriding server.bind
        #[arg(long, env = "CHART_JOURNAL_BIND")]
        bind: Option<String>,
    },

    /// Insert the default strategy types that are missing
    SeedStrategies {
        /// Remove unreferenced strategy types first
        #[arg(long)]
        replace: bool,
    },

    /// Report chart strategy references that are legacy names or unknown
    CheckStrategies,

    /// Rewrite legacy strategy-name references on charts to ids
    MigrateStrategies,

    /// Create the database and schema, then exit
    InitDb,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "chart_journal=info,chart_journal_api=info,warn",
        1 => "chart_journal=debug,chart_journal_api=debug,info",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(filter)
        .init();

    let config = AppConfig::load()?;

    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => serve(config, bind).await?,

        Command::SeedStrategies { replace } => {
            let journal = open_maintenance(&config).await?;
            let inserted = journal
                .run(move |j| j.strategy_types().seed_defaults(replace))
                .await?;
            println!("Inserted {inserted} strategy type(s).");
            journal.close().await?;
        }

        Command::CheckStrategies => {
            let journal = open_maintenance(&config).await?;
            let audit = journal.run(|j| j.strategy_types().audit()).await?;
            println!("Strategy ids in use       : {}", audit.by_id.len());
            println!("Legacy strategy names     : {}", audit.by_name.len());
            for name in &audit.by_name {
                println!("  {name}");
            }
            println!("Unknown strategy values   : {}", audit.unknown.len());
            for value in &audit.unknown {
                println!("  {value}");
            }
            if audit.is_clean() {
                println!("All chart strategy references are ids.");
            } else if !audit.by_name.is_empty() {
                println!("Run `chart-journal-api migrate-strategies` to rewrite names to ids.");
            }
            journal.close().await?;
        }

        Command::MigrateStrategies => {
            let journal = open_maintenance(&config).await?;
            let rewritten = journal
                .run(|j| j.strategy_types().migrate_legacy_names())
                .await?;
            println!("Rewrote {rewritten} chart(s).");
            journal.close().await?;
        }

        Command::InitDb => {
            let journal = open_maintenance(&config).await?;
            let tables = journal.health().await?;
            println!("Database ready at {}: {}", config.database.path, tables.join(", "));
            journal.close().await?;
        }
    }

    Ok(())
}

/// Journal for maintenance commands, which never touch the file host.
async fn open_maintenance(config: &AppConfig) -> Result<AsyncChartJournal> {
    AsyncChartJournal::builder()
        .database_path(&config.database.path)
        .file_host(Arc::new(DisabledFileHost))
        .build()
        .await
        .with_context(|| format!("opening database {}", config.database.path))
}

async fn serve(config: AppConfig, bind: Option<String>) -> Result<()> {
    let mut builder = AsyncChartJournal::builder()
        .database_path(&config.database.path)
        .uploadthing_url(config.file_host.api_url.clone())
        .timeout(config.file_host.timeout());
    if let Some(key) = config.file_host.key() {
        builder = builder.uploadthing(key);
    }
    let journal = builder
        .build()
        .await
        .with_context(|| format!("opening database {}", config.database.path))?;
    info!("Journal ready ({})", config.database.path);

    let state = Arc::new(AppState {
        journal: journal.clone(),
    });
    let app = routes::build_router(state);

    let addr = bind.unwrap_or(config.server.bind);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down");
        })
        .await?;

    journal.close().await?;
    Ok(())
}
