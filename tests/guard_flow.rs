use scam_guard::config::Config;
use scam_guard::guard::{
    BadgeStatus, BrowserControl, MemoryProtectionStore, NavOutcome, NavigationGuard,
    ProtectionStore, TabId, UrlClassifier,
};
use scam_guard::stats::StatsCollector;
use scam_guard::verdict::{RiskLevel, Verdict};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// --- Mocks ---

struct MockClassifier {
    verdict: Verdict,
    delay: Duration,
    call_count: AtomicUsize,
}

impl MockClassifier {
    fn returning(verdict: Verdict) -> Arc<Self> {
        Arc::new(Self {
            verdict,
            delay: Duration::ZERO,
            call_count: AtomicUsize::new(0),
        })
    }

    fn returning_after(verdict: Verdict, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            verdict,
            delay,
            call_count: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl UrlClassifier for MockClassifier {
    async fn classify(&self, _url: &str) -> Verdict {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.verdict.clone()
    }
}

#[derive(Default)]
struct FakeBrowser {
    badges: Mutex<Vec<(TabId, BadgeStatus)>>,
    redirects: Mutex<Vec<(TabId, String)>>,
}

impl FakeBrowser {
    fn last_badge(&self, tab: TabId) -> Option<BadgeStatus> {
        self.badges
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(t, _)| *t == tab)
            .map(|(_, status)| *status)
    }

    fn redirects_for(&self, tab: TabId) -> Vec<String> {
        self.redirects
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| *t == tab)
            .map(|(_, url)| url.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl BrowserControl for FakeBrowser {
    async fn set_badge(&self, tab: TabId, status: BadgeStatus) -> anyhow::Result<()> {
        self.badges.lock().unwrap().push((tab, status));
        Ok(())
    }

    async fn redirect(&self, tab: TabId, url: &str) -> anyhow::Result<()> {
        self.redirects.lock().unwrap().push((tab, url.to_string()));
        Ok(())
    }
}

fn phishing_verdict() -> Verdict {
    Verdict {
        safe: false,
        risk_level: RiskLevel::High,
        category: "Phishing".to_string(),
        reasons: vec!["domain imitates known brand".to_string()],
        recommendation: "avoid this site".to_string(),
        should_block: true,
        cached: false,
    }
}

fn safe_verdict() -> Verdict {
    Verdict {
        safe: true,
        risk_level: RiskLevel::Low,
        category: "Legitimate".to_string(),
        reasons: vec![],
        recommendation: "no concerns".to_string(),
        should_block: false,
        cached: false,
    }
}

struct Setup {
    guard: NavigationGuard,
    classifier: Arc<MockClassifier>,
    browser: Arc<FakeBrowser>,
    state: Arc<MemoryProtectionStore>,
}

fn setup(classifier: Arc<MockClassifier>) -> Setup {
    let config = Config::default();
    let browser = Arc::new(FakeBrowser::default());
    let state = Arc::new(MemoryProtectionStore::new());
    let stats = StatsCollector::new(0);
    let guard = NavigationGuard::new(
        &config,
        classifier.clone(),
        state.clone(),
        browser.clone(),
        stats,
    );
    Setup {
        guard,
        classifier,
        browser,
        state,
    }
}

#[tokio::test]
async fn allowlisted_domain_skips_analysis_entirely() {
    let s = setup(MockClassifier::returning(safe_verdict()));

    let outcome = s.guard.on_before_navigate(1, 0, "https://google.com").await;

    assert_eq!(outcome, NavOutcome::Safe);
    assert_eq!(s.browser.last_badge(1), Some(BadgeStatus::Safe));
    assert_eq!(s.classifier.calls(), 0, "no remote call for allowlisted domain");
    assert!(s.guard.cache().is_empty(), "no cache entry for allowlisted domain");
}

#[tokio::test]
async fn high_risk_navigation_is_blocked_and_recorded() {
    let s = setup(MockClassifier::returning(phishing_verdict()));
    let url = "https://paypal-secure-login.scam.example";

    let outcome = s.guard.on_before_navigate(7, 0, url).await;

    assert_eq!(outcome, NavOutcome::Blocked);
    assert_eq!(s.browser.last_badge(7), Some(BadgeStatus::Danger));
    assert_eq!(s.state.blocked_count().await, 1);

    let last = s.state.last_blocked().await.unwrap();
    assert_eq!(last.url, url);
    assert_eq!(last.category, "Phishing");
    assert_eq!(last.reasons, vec!["domain imitates known brand"]);

    let redirects = s.browser.redirects_for(7);
    assert_eq!(redirects.len(), 1);
    assert!(redirects[0].starts_with("scam-guard://blocked?url="));
    assert!(
        redirects[0].contains("paypal-secure-login.scam.example"),
        "redirect carries the original URL: {}",
        redirects[0]
    );
}

#[tokio::test]
async fn second_navigation_within_ttl_is_served_from_cache() {
    let s = setup(MockClassifier::returning(phishing_verdict()));
    let url = "https://paypal-secure-login.scam.example";

    let first = s.guard.on_before_navigate(1, 0, url).await;
    let second = s.guard.on_before_navigate(1, 0, url).await;

    assert_eq!(s.classifier.calls(), 1, "classifier invoked exactly once");
    assert_eq!(first, NavOutcome::Blocked);
    assert_eq!(second, NavOutcome::Blocked, "cached verdict, identical outcome");
    assert_eq!(s.state.blocked_count().await, 2);
}

#[tokio::test]
async fn disabled_protection_short_circuits() {
    let s = setup(MockClassifier::returning(phishing_verdict()));
    s.state.set_protection_enabled(false).await;

    let outcome = s
        .guard
        .on_before_navigate(1, 0, "https://paypal-secure-login.scam.example")
        .await;

    assert_eq!(outcome, NavOutcome::Disabled);
    assert_eq!(s.browser.last_badge(1), Some(BadgeStatus::Disabled));
    assert_eq!(s.classifier.calls(), 0);
}

#[tokio::test]
async fn internal_schemes_and_subframes_are_ignored() {
    let s = setup(MockClassifier::returning(phishing_verdict()));

    assert_eq!(
        s.guard.on_before_navigate(1, 0, "about:blank").await,
        NavOutcome::Ignored
    );
    assert_eq!(
        s.guard
            .on_before_navigate(1, 0, "scam-guard://blocked?url=x")
            .await,
        NavOutcome::Ignored
    );
    assert_eq!(
        s.guard
            .on_before_navigate(1, 2, "https://evil.example")
            .await,
        NavOutcome::Ignored,
        "sub-frame navigations are not guarded"
    );

    assert_eq!(s.classifier.calls(), 0);
    assert!(s.browser.badges.lock().unwrap().is_empty(), "no badge updates");
}

#[tokio::test]
async fn medium_risk_warns_without_redirect() {
    let verdict = Verdict {
        safe: false,
        risk_level: RiskLevel::Medium,
        category: "Suspicious".to_string(),
        reasons: vec!["newly registered domain".to_string()],
        recommendation: "be careful".to_string(),
        should_block: false,
        cached: false,
    };
    let s = setup(MockClassifier::returning(verdict));

    let outcome = s
        .guard
        .on_before_navigate(3, 0, "https://sketchy.example")
        .await;

    assert_eq!(outcome, NavOutcome::Warning);
    assert_eq!(s.browser.last_badge(3), Some(BadgeStatus::Warning));
    assert!(s.browser.redirects_for(3).is_empty());
    assert_eq!(s.state.blocked_count().await, 0);
}

#[tokio::test]
async fn completed_navigation_refreshes_badge_from_cache_only() {
    let s = setup(MockClassifier::returning(phishing_verdict()));
    let url = "https://paypal-secure-login.scam.example";

    // Nothing cached yet: completion is a no-op
    let outcome = s.guard.on_navigation_completed(1, 0, url).await;
    assert_eq!(outcome, NavOutcome::Ignored);
    assert_eq!(s.classifier.calls(), 0, "completion never classifies");
    assert!(s.browser.badges.lock().unwrap().is_empty());

    // After a pre-navigation analysis the verdict is cached
    s.guard.on_before_navigate(1, 0, url).await;
    let calls_after_navigate = s.classifier.calls();

    let outcome = s.guard.on_navigation_completed(1, 0, url).await;
    assert_eq!(outcome, NavOutcome::Blocked);
    assert_eq!(s.browser.last_badge(1), Some(BadgeStatus::Danger));
    assert_eq!(s.classifier.calls(), calls_after_navigate);
    // Completion only refreshes the badge; it does not count a new block
    assert_eq!(s.state.blocked_count().await, 1);
}

#[tokio::test]
async fn superseded_navigation_drops_side_effects_but_caches() {
    let s = setup(MockClassifier::returning_after(
        phishing_verdict(),
        Duration::from_millis(150),
    ));
    let stale_url = "https://slow-scam.example";

    let guard = Arc::new(s.guard);
    let first = {
        let guard = guard.clone();
        tokio::spawn(async move { guard.on_before_navigate(5, 0, stale_url).await })
    };

    // Let the first navigation reach the classifier, then supersede it
    // with a navigation to an allowlisted page on the same tab.
    tokio::time::sleep(Duration::from_millis(30)).await;
    let second = guard.on_before_navigate(5, 0, "https://google.com").await;
    assert_eq!(second, NavOutcome::Safe);

    let first = first.await.unwrap();
    assert_eq!(first, NavOutcome::Superseded);

    // The stale task must not have blocked anything or moved the badge
    assert_eq!(s.state.blocked_count().await, 0);
    assert!(s.browser.redirects_for(5).is_empty());
    assert_eq!(s.browser.last_badge(5), Some(BadgeStatus::Safe));

    // Its verdict still landed in the cache for the next visitor
    assert!(guard.cache().get(stale_url).is_some());
}

#[tokio::test]
async fn manual_check_counts_daily_scans() {
    let s = setup(MockClassifier::returning(safe_verdict()));

    let verdict = s.guard.check_url("example.org").await;
    assert!(verdict.safe);
    // Scheme is prepended before classification and caching
    assert!(s.guard.cache().get("https://example.org").is_some());

    s.guard.check_url("https://example.org").await;
    assert_eq!(s.classifier.calls(), 1, "second check hits the cache");
    assert_eq!(s.state.scans_today(&scam_guard::guard::today()).await, 2);
}

#[tokio::test]
async fn status_reflects_toggle_and_counters() {
    let s = setup(MockClassifier::returning(phishing_verdict()));

    s.guard
        .on_before_navigate(1, 0, "https://paypal-secure-login.scam.example")
        .await;

    let status = s.guard.status().await;
    assert!(status.enabled);
    assert_eq!(status.blocked_count, 1);
    assert!(status.last_blocked.is_some());

    s.guard.set_protection_enabled(false).await;
    assert!(!s.guard.status().await.enabled);
}
