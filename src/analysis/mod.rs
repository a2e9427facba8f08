mod gateway;

pub use gateway::GatewayClassifier;

use crate::logger::types::{AnalysisAction, AnalysisLogEntry};
use crate::logger::AnalysisLogger;
use crate::stats::StatsCollector;
use crate::store::{normalize_domain, BlocklistStore, NewBlockedDomain};
use crate::verdict::Verdict;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("payment required")]
    QuotaExhausted,
    #[error("API key environment variable {0} is not set")]
    MissingApiKey(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Client of the LLM-backed classification backend.
#[async_trait::async_trait]
pub trait LlmClassifier: Send + Sync {
    async fn classify(&self, url: &str) -> Result<Verdict, ClassifyError>;
}

/// Server-side analysis pipeline: blocklist store first, the LLM gateway
/// only on a miss, and a store upsert for unsafe results.
pub struct UrlAnalyzer {
    store: Arc<dyn BlocklistStore>,
    gateway: Arc<dyn LlmClassifier>,
    stats: Arc<StatsCollector>,
    logger: Arc<AnalysisLogger>,
}

impl UrlAnalyzer {
    pub fn new(
        store: Arc<dyn BlocklistStore>,
        gateway: Arc<dyn LlmClassifier>,
        stats: Arc<StatsCollector>,
        logger: Arc<AnalysisLogger>,
    ) -> Self {
        Self {
            store,
            gateway,
            stats,
            logger,
        }
    }

    pub async fn analyze(&self, url: &str) -> Result<Verdict, ClassifyError> {
        let start = Instant::now();
        self.stats.inc_analysis();
        let domain = normalize_domain(url);

        // Known-bad domains skip the LLM entirely.
        if let Some(record) = self.store.lookup(&domain).await? {
            self.stats.inc_blocklist_hit();
            let verdict = record.to_verdict();
            info!("Blocklist hit for {} ({})", domain, record.category);
            self.log(url, &domain, AnalysisAction::BlocklistHit, Some(&verdict), start)
                .await;
            return Ok(verdict);
        }

        self.stats.inc_llm_call();
        let verdict = match self.gateway.classify(url).await {
            Ok(verdict) => verdict,
            Err(e) => {
                self.stats.inc_failure();
                warn!("Classification failed for {}: {}", url, e);
                self.log(url, &domain, AnalysisAction::Failed, None, start)
                    .await;
                return Err(e);
            }
        };

        if verdict.needs_blocklist_record() {
            let record = NewBlockedDomain::from_verdict(domain.clone(), &verdict);
            self.store.upsert(record).await?;
            info!("Recorded unsafe domain {} ({})", domain, verdict.category);
        }

        self.log(url, &domain, AnalysisAction::Classified, Some(&verdict), start)
            .await;
        Ok(verdict)
    }

    async fn log(
        &self,
        url: &str,
        domain: &str,
        action: AnalysisAction,
        verdict: Option<&Verdict>,
        start: Instant,
    ) {
        self.logger
            .log(AnalysisLogEntry {
                url: url.to_string(),
                domain: domain.to_string(),
                action,
                risk_level: verdict.map(|v| v.risk_level),
                category: verdict.map(|v| v.category.clone()),
                blocked: verdict.map(|v| v.blocks()).unwrap_or(false),
                latency_ms: start.elapsed().as_millis() as u64,
            })
            .await;
    }
}
