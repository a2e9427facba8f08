use crate::logger::types::AnalysisLogEntry;
use crate::stats::StatsSnapshot;
use async_trait::async_trait;

#[async_trait]
pub trait ApiDataSource: Send + Sync {
    async fn get_stats(&self) -> StatsSnapshot;
    async fn get_logs(&self, limit: usize) -> Vec<AnalysisLogEntry>;
}
