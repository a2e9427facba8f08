//! Initialization helpers for the application startup.

use crate::api::{ApiDataSource, InMemoryStatsSource, PersistentStatsSource};
use crate::config::Config;
use crate::db::DbClient;
use crate::logger::{AnalysisLogSink, MemoryLogSink};
use crate::stats::StatsCollector;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Sets up the tracing subscriber with the configured filters.
pub fn setup_logging(config: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut filter = config.logging.level.clone();

        // Suppress HTTP-stack internals unless explicitly enabled
        if !filter.contains("hyper") {
            filter.push_str(",hyper=off,hyper_util=off");
        }
        if !filter.contains("reqwest") {
            filter.push_str(",reqwest=off");
        }

        tracing_subscriber::EnvFilter::new(filter)
    });

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

/// Opens the SQLite database and creates the schema.
pub fn init_db(config: &Config) -> Result<Arc<DbClient>> {
    let client = DbClient::new(config.store.sqlite_path.clone())
        .context("Failed to open SQLite database")?;
    client
        .initialize()
        .context("Failed to initialize SQLite schema")?;
    Ok(Arc::new(client))
}

/// Chooses the API data source.
///
/// Returns a tuple containing:
/// 1. An optional `MemoryLogSink` (if no SQLite sink is used).
/// 2. The `ApiDataSource` (either SQLite-backed or memory-backed).
pub fn init_data_source(
    config: &Config,
    stats: Arc<StatsCollector>,
    db: Arc<DbClient>,
) -> (Option<Box<dyn AnalysisLogSink>>, Arc<dyn ApiDataSource>) {
    let use_sqlite_sink = config.logging.sinks.contains(&"sqlite".to_string());

    if use_sqlite_sink {
        info!("Using PersistentStatsSource (SQLite) for API.");
        (
            None, // Memory sink disabled to save RAM since we have SQLite
            Arc::new(PersistentStatsSource::new(db)),
        )
    } else {
        info!("SQLite sink disabled. Using InMemoryStatsSource for API.");
        let sink = MemoryLogSink::new(100);
        let buffer = sink.clone_buffer();
        (
            Some(Box::new(sink)),
            Arc::new(InMemoryStatsSource::new(stats, buffer)),
        )
    }
}
