use crate::verdict::RiskLevel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisLogEntry {
    pub url: String,
    pub domain: String,
    pub action: AnalysisAction,
    pub risk_level: Option<RiskLevel>,
    pub category: Option<String>,
    pub blocked: bool,
    pub latency_ms: u64,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum AnalysisAction {
    Allowlisted,
    CacheHit,
    BlocklistHit,
    Classified,
    Failed,
}

pub trait AnalysisLogSink: Send + Sync {
    fn log(&self, entry: &AnalysisLogEntry);
}
