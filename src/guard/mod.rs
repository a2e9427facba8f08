pub mod client;
pub mod state;
pub mod types;

pub use client::RemoteClassifier;
pub use state::{
    today, BlockedSnapshot, MemoryProtectionStore, ProtectionStore, SqliteProtectionStore,
};
pub use types::{BadgeStatus, BrowserControl, GuardStatus, NavOutcome, TabId, UrlClassifier};

use crate::allowlist::Allowlist;
use crate::cache::VerdictCache;
use crate::config::Config;
use crate::stats::StatsCollector;
use crate::verdict::{RiskLevel, Verdict};
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::form_urlencoded;

/// Per-navigation decision pipeline: protection toggle, scheme filter,
/// allowlist, verdict cache, remote classification, then badge/redirect
/// side effects.
///
/// Each tab carries a generation counter; when a newer navigation for the
/// same tab supersedes an in-flight analysis, the stale task's side
/// effects are dropped (its verdict is still cached).
pub struct NavigationGuard {
    allowlist: Allowlist,
    cache: VerdictCache,
    classifier: Arc<dyn UrlClassifier>,
    state: Arc<dyn ProtectionStore>,
    browser: Arc<dyn BrowserControl>,
    stats: Arc<StatsCollector>,
    blocked_page: String,
    generations: Mutex<FxHashMap<TabId, u64>>,
}

impl NavigationGuard {
    pub fn new(
        config: &Config,
        classifier: Arc<dyn UrlClassifier>,
        state: Arc<dyn ProtectionStore>,
        browser: Arc<dyn BrowserControl>,
        stats: Arc<StatsCollector>,
    ) -> Self {
        Self {
            allowlist: Allowlist::new(config.allowlist.clone()),
            cache: VerdictCache::new(
                Duration::from_secs(config.cache.ttl_secs),
                config.cache.capacity,
            ),
            classifier,
            state,
            browser,
            stats,
            blocked_page: config.guard.blocked_page.clone(),
            generations: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn cache(&self) -> &VerdictCache {
        &self.cache
    }

    /// Handles a pre-navigation event. This is where blocking happens.
    pub async fn on_before_navigate(&self, tab: TabId, frame_id: u32, url: &str) -> NavOutcome {
        // Only top-level frames are guarded
        if frame_id != 0 {
            return NavOutcome::Ignored;
        }

        let generation = self.bump_generation(tab);

        if !self.state.protection_enabled().await {
            self.set_badge(tab, BadgeStatus::Disabled).await;
            return NavOutcome::Disabled;
        }

        // Internal schemes and our own blocked page are never analyzed
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return NavOutcome::Ignored;
        }
        if url.starts_with(&self.blocked_page) {
            return NavOutcome::Ignored;
        }

        if self.allowlist.matches(url) {
            self.stats.inc_allowlist_hit();
            self.set_badge(tab, BadgeStatus::Safe).await;
            return NavOutcome::Safe;
        }

        self.set_badge(tab, BadgeStatus::Analyzing).await;

        let verdict = match self.cache.get(url) {
            Some(verdict) => {
                self.stats.inc_cache_hit();
                verdict
            }
            None => {
                let verdict = self.classifier.classify(url).await;
                // Cache even when the tab has moved on meanwhile
                self.cache.put(url, verdict.clone());
                verdict
            }
        };

        if self.is_superseded(tab, generation) {
            debug!("Dropping stale result for tab {} ({})", tab, url);
            return NavOutcome::Superseded;
        }

        if verdict.blocks() {
            info!("BLOCKING: {} ({})", url, verdict.category);
            self.stats.inc_blocked();
            self.set_badge(tab, BadgeStatus::Danger).await;
            self.state
                .record_block(BlockedSnapshot {
                    url: url.to_string(),
                    reasons: verdict.reasons.clone(),
                    category: verdict.category.clone(),
                    recommendation: verdict.recommendation.clone(),
                    timestamp_ms: chrono::Utc::now().timestamp_millis(),
                })
                .await;
            self.redirect_to_blocked_page(tab, url).await;
            NavOutcome::Blocked
        } else if !verdict.safe && verdict.risk_level == RiskLevel::Medium {
            info!("WARNING: {} ({})", url, verdict.category);
            self.stats.inc_warning();
            self.set_badge(tab, BadgeStatus::Warning).await;
            NavOutcome::Warning
        } else {
            self.set_badge(tab, BadgeStatus::Safe).await;
            NavOutcome::Safe
        }
    }

    /// Refreshes the badge once a navigation commits. Resolves purely from
    /// the allowlist and cache; never triggers a remote call.
    pub async fn on_navigation_completed(&self, tab: TabId, frame_id: u32, url: &str) -> NavOutcome {
        if frame_id != 0 {
            return NavOutcome::Ignored;
        }

        if !self.state.protection_enabled().await {
            self.set_badge(tab, BadgeStatus::Disabled).await;
            return NavOutcome::Disabled;
        }

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return NavOutcome::Ignored;
        }

        if self.allowlist.matches(url) {
            self.set_badge(tab, BadgeStatus::Safe).await;
            return NavOutcome::Safe;
        }

        let Some(verdict) = self.cache.get(url) else {
            // Nothing cached: leave the badge alone
            return NavOutcome::Ignored;
        };

        if verdict.blocks() {
            self.set_badge(tab, BadgeStatus::Danger).await;
            NavOutcome::Blocked
        } else if !verdict.safe && verdict.risk_level == RiskLevel::Medium {
            self.set_badge(tab, BadgeStatus::Warning).await;
            NavOutcome::Warning
        } else {
            self.set_badge(tab, BadgeStatus::Safe).await;
            NavOutcome::Safe
        }
    }

    /// Manually submitted check from the popup. Counts one daily scan.
    pub async fn check_url(&self, raw: &str) -> Verdict {
        let url = if raw.starts_with("http://") || raw.starts_with("https://") {
            raw.to_string()
        } else {
            format!("https://{raw}")
        };

        let verdict = match self.cache.get(&url) {
            Some(verdict) => {
                self.stats.inc_cache_hit();
                verdict
            }
            None => {
                let verdict = self.classifier.classify(&url).await;
                self.cache.put(&url, verdict.clone());
                verdict
            }
        };

        self.state.record_scan(&today()).await;
        verdict
    }

    pub async fn set_protection_enabled(&self, enabled: bool) {
        info!(
            "Protection {}",
            if enabled { "enabled" } else { "disabled" }
        );
        self.state.set_protection_enabled(enabled).await;
    }

    pub async fn status(&self) -> GuardStatus {
        GuardStatus {
            enabled: self.state.protection_enabled().await,
            blocked_count: self.state.blocked_count().await,
            last_blocked: self.state.last_blocked().await,
        }
    }

    fn bump_generation(&self, tab: TabId) -> u64 {
        let mut generations = self.generations.lock().unwrap();
        let counter = generations.entry(tab).or_insert(0);
        *counter += 1;
        *counter
    }

    fn is_superseded(&self, tab: TabId, generation: u64) -> bool {
        let generations = self.generations.lock().unwrap();
        generations.get(&tab).map(|g| *g != generation).unwrap_or(true)
    }

    // Badge updates are best-effort and must never fail navigation handling
    async fn set_badge(&self, tab: TabId, status: BadgeStatus) {
        if let Err(e) = self.browser.set_badge(tab, status).await {
            warn!("Failed to update badge for tab {}: {}", tab, e);
        }
    }

    async fn redirect_to_blocked_page(&self, tab: TabId, url: &str) {
        let encoded: String = form_urlencoded::byte_serialize(url.as_bytes()).collect();
        let target = format!("{}?url={}", self.blocked_page, encoded);
        if let Err(e) = self.browser.redirect(tab, &target).await {
            warn!("Failed to redirect tab {}: {}", tab, e);
        }
    }
}
