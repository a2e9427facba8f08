//! In-memory implementation of the API data source.
//!
//! Used when no persistent log sink is configured. Serves live counters
//! from the `StatsCollector` and recent entries from the log ring buffer.

use super::source::ApiDataSource;
use crate::logger::types::AnalysisLogEntry;
use crate::stats::{StatsCollector, StatsSnapshot, TopItem};
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

pub struct InMemoryStatsSource {
    /// Reference to the live statistics collector.
    stats: Arc<StatsCollector>,
    /// Shared buffer containing the most recent analysis logs.
    logs_buffer: Arc<RwLock<VecDeque<AnalysisLogEntry>>>,
}

impl InMemoryStatsSource {
    pub fn new(
        stats: Arc<StatsCollector>,
        logs_buffer: Arc<RwLock<VecDeque<AnalysisLogEntry>>>,
    ) -> Self {
        Self { stats, logs_buffer }
    }
}

#[async_trait]
impl ApiDataSource for InMemoryStatsSource {
    async fn get_stats(&self) -> StatsSnapshot {
        let mut snapshot = self.stats.get_snapshot();

        // Top flagged domains from whatever is still in the ring buffer
        let buffer = self.logs_buffer.read().unwrap();
        let mut counts: HashMap<&str, u64> = HashMap::new();
        for entry in buffer.iter().filter(|e| e.blocked) {
            *counts.entry(entry.domain.as_str()).or_insert(0) += 1;
        }
        let mut top: Vec<TopItem> = counts
            .into_iter()
            .map(|(name, count)| TopItem {
                name: name.to_string(),
                count,
            })
            .collect();
        top.sort_by(|a, b| b.count.cmp(&a.count).then(a.name.cmp(&b.name)));
        top.truncate(5);
        snapshot.top_flagged_domains = top;

        snapshot
    }

    async fn get_logs(&self, limit: usize) -> Vec<AnalysisLogEntry> {
        let buffer = self.logs_buffer.read().unwrap();
        buffer.iter().rev().take(limit).cloned().collect()
    }
}
