use scam_guard::analysis::{ClassifyError, LlmClassifier, UrlAnalyzer};
use scam_guard::config::LoggingConfig;
use scam_guard::logger::AnalysisLogger;
use scam_guard::stats::StatsCollector;
use scam_guard::store::{BlocklistStore, MemoryStore, NewBlockedDomain};
use scam_guard::verdict::{RiskLevel, Verdict};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// --- Mocks ---

struct MockLlm {
    result: Result<Verdict, ()>,
    call_count: AtomicUsize,
}

impl MockLlm {
    fn returning(verdict: Verdict) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(verdict),
            call_count: AtomicUsize::new(0),
        })
    }

    fn rate_limited() -> Arc<Self> {
        Arc::new(Self {
            result: Err(()),
            call_count: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl LlmClassifier for MockLlm {
    async fn classify(&self, _url: &str) -> Result<Verdict, ClassifyError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match &self.result {
            Ok(verdict) => Ok(verdict.clone()),
            Err(()) => Err(ClassifyError::RateLimited),
        }
    }
}

fn phishing_verdict() -> Verdict {
    Verdict {
        safe: false,
        risk_level: RiskLevel::High,
        category: "Phishing".to_string(),
        reasons: vec![
            "domain imitates known brand".to_string(),
            "urgent language".to_string(),
        ],
        recommendation: "avoid this site".to_string(),
        should_block: true,
        cached: false,
    }
}

fn analyzer(store: Arc<dyn BlocklistStore>, llm: Arc<MockLlm>) -> UrlAnalyzer {
    let logger = AnalysisLogger::new(
        LoggingConfig {
            sinks: vec![],
            ..LoggingConfig::default()
        },
        vec![],
        None,
    );
    UrlAnalyzer::new(store, llm, StatsCollector::new(0), logger)
}

#[tokio::test]
async fn blocklist_hit_skips_the_llm() {
    let store = Arc::new(MemoryStore::new());
    store
        .upsert(NewBlockedDomain {
            domain: "evil.example".to_string(),
            reason: "previously flagged".to_string(),
            category: "Fraud".to_string(),
            risk_level: RiskLevel::High,
        })
        .await
        .unwrap();

    let llm = MockLlm::returning(phishing_verdict());
    let analyzer = analyzer(store, llm.clone());

    let verdict = analyzer
        .analyze("https://www.evil.example/checkout")
        .await
        .unwrap();

    assert_eq!(llm.calls(), 0, "LLM must not be invoked on a blocklist hit");
    assert!(verdict.should_block);
    assert!(verdict.cached);
    assert!(!verdict.safe);
    assert_eq!(verdict.reasons, vec!["previously flagged"]);
    assert_eq!(verdict.category, "Fraud");
}

#[tokio::test]
async fn unsafe_verdict_is_persisted_by_domain() {
    let store = Arc::new(MemoryStore::new());
    let llm = MockLlm::returning(phishing_verdict());
    let analyzer = analyzer(store.clone(), llm.clone());

    let verdict = analyzer
        .analyze("https://paypal-secure-login.scam.example/verify")
        .await
        .unwrap();

    assert!(verdict.blocks());
    assert_eq!(llm.calls(), 1);

    let record = store
        .lookup("paypal-secure-login.scam.example")
        .await
        .unwrap()
        .expect("unsafe verdict must create a record");
    assert_eq!(record.category, "Phishing");
    assert_eq!(record.risk_level, RiskLevel::High);
    assert_eq!(
        record.reason, "domain imitates known brand; urgent language",
        "reasons are joined into the record"
    );
}

#[tokio::test]
async fn second_analysis_of_same_domain_uses_the_store() {
    let store = Arc::new(MemoryStore::new());
    let llm = MockLlm::returning(phishing_verdict());
    let analyzer = analyzer(store.clone(), llm.clone());

    analyzer
        .analyze("https://evil.example/first")
        .await
        .unwrap();
    let second = analyzer
        .analyze("https://evil.example/second-path")
        .await
        .unwrap();

    assert_eq!(llm.calls(), 1, "second URL on the domain resolves from the store");
    assert!(second.cached);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn safe_verdict_creates_no_record() {
    let store = Arc::new(MemoryStore::new());
    let llm = MockLlm::returning(Verdict {
        safe: true,
        risk_level: RiskLevel::Low,
        category: "Legitimate".to_string(),
        reasons: vec![],
        recommendation: "no concerns".to_string(),
        should_block: false,
        cached: false,
    });
    let analyzer = analyzer(store.clone(), llm);

    let verdict = analyzer.analyze("https://fine.example").await.unwrap();

    assert!(!verdict.blocks());
    assert!(store.is_empty());
}

#[tokio::test]
async fn gateway_errors_propagate() {
    let store = Arc::new(MemoryStore::new());
    let analyzer = analyzer(store.clone(), MockLlm::rate_limited());

    let err = analyzer.analyze("https://whatever.example").await.unwrap_err();
    assert!(matches!(err, ClassifyError::RateLimited));
    assert!(store.is_empty());
}
