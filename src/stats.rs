use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::{self, Duration};
use tracing::info;

#[derive(Debug)]
pub struct StatsCollector {
    total_analyses: AtomicU64,
    allowlist_hits: AtomicU64,
    cache_hits: AtomicU64,
    blocklist_hits: AtomicU64,
    llm_calls: AtomicU64,
    blocked: AtomicU64,
    warnings: AtomicU64,
    failures: AtomicU64,

    started_at: u64,
    log_interval: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub total_analyses: u64,
    pub allowlist_hits: u64,
    pub cache_hits: u64,
    pub blocklist_hits: u64,
    pub llm_calls: u64,
    pub blocked: u64,
    pub warnings: u64,
    pub failures: u64,
    pub top_flagged_domains: Vec<TopItem>,
    pub started_at: u64,
    pub updated_at: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopItem {
    pub name: String,
    pub count: u64,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl StatsCollector {
    pub fn new(log_interval_sec: u64) -> Arc<Self> {
        let stats = Arc::new(Self {
            total_analyses: AtomicU64::new(0),
            allowlist_hits: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            blocklist_hits: AtomicU64::new(0),
            llm_calls: AtomicU64::new(0),
            blocked: AtomicU64::new(0),
            warnings: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            started_at: unix_now(),
            log_interval: Duration::from_secs(log_interval_sec),
        });

        // Spawn background dumper; interval 0 disables it
        if log_interval_sec > 0 {
            let stats_clone = stats.clone();
            tokio::spawn(async move {
                stats_clone.run_logger().await;
            });
        }

        stats
    }

    pub fn inc_analysis(&self) {
        self.total_analyses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_allowlist_hit(&self) {
        self.allowlist_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_blocklist_hit(&self) {
        self.blocklist_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_llm_call(&self) {
        self.llm_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_blocked(&self) {
        self.blocked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_warning(&self) {
        self.warnings.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_analyses: self.total_analyses.load(Ordering::Relaxed),
            allowlist_hits: self.allowlist_hits.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            blocklist_hits: self.blocklist_hits.load(Ordering::Relaxed),
            llm_calls: self.llm_calls.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            top_flagged_domains: Vec::new(),
            started_at: self.started_at,
            updated_at: unix_now(),
        }
    }

    async fn run_logger(&self) {
        let mut interval = time::interval(self.log_interval);
        loop {
            interval.tick().await;
            self.dump_stats();
        }
    }

    fn dump_stats(&self) {
        let total = self.total_analyses.load(Ordering::Relaxed);
        let blocked = self.blocked.load(Ordering::Relaxed);
        let cache_hits = self.cache_hits.load(Ordering::Relaxed);
        let allowlist_hits = self.allowlist_hits.load(Ordering::Relaxed);
        let blocklist_hits = self.blocklist_hits.load(Ordering::Relaxed);
        let llm_calls = self.llm_calls.load(Ordering::Relaxed);
        let failures = self.failures.load(Ordering::Relaxed);

        let pct = |part: u64| {
            if total > 0 {
                (part as f64 / total as f64) * 100.0
            } else {
                0.0
            }
        };

        info!(
            "STATS DUMP: Analyses: {}, Blocked: {} ({:.1}%), CacheHits: {} ({:.1}%), AllowlistHits: {}, BlocklistHits: {}, LlmCalls: {}, Failures: {}",
            total,
            blocked,
            pct(blocked),
            cache_hits,
            pct(cache_hits),
            allowlist_hits,
            blocklist_hits,
            llm_calls,
            failures
        );
    }
}
