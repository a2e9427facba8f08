//! Database-backed implementation of the API data source.
//!
//! Delegates to the SQLite `DbClient`, so the API serves historical data
//! across restarts.

use super::source::ApiDataSource;
use crate::db::DbClient;
use crate::logger::types::AnalysisLogEntry;
use crate::stats::StatsSnapshot;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::error;

pub struct PersistentStatsSource {
    db: Arc<DbClient>,
}

impl PersistentStatsSource {
    pub fn new(db: Arc<DbClient>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ApiDataSource for PersistentStatsSource {
    async fn get_stats(&self) -> StatsSnapshot {
        match self.db.get_stats() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Failed to read stats from SQLite: {}", e);
                StatsSnapshot {
                    total_analyses: 0,
                    allowlist_hits: 0,
                    cache_hits: 0,
                    blocklist_hits: 0,
                    llm_calls: 0,
                    blocked: 0,
                    warnings: 0,
                    failures: 0,
                    top_flagged_domains: Vec::new(),
                    started_at: 0,
                    updated_at: 0,
                }
            }
        }
    }

    async fn get_logs(&self, limit: usize) -> Vec<AnalysisLogEntry> {
        match self.db.get_logs(limit) {
            Ok(logs) => logs,
            Err(e) => {
                error!("Failed to read logs from SQLite: {}", e);
                Vec::new()
            }
        }
    }
}
