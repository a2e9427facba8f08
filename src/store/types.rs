use crate::verdict::{RiskLevel, Verdict};
use serde::{Deserialize, Serialize};
use url::Url;

/// Persistent entry for one domain judged unsafe. At most one record per
/// normalized domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedDomainRecord {
    pub domain: String,
    pub reason: String,
    pub category: String,
    pub risk_level: RiskLevel,
    pub created_at: u64,
    pub updated_at: u64,
}

/// Fields of a record about to be written; timestamps are assigned by the
/// store.
#[derive(Debug, Clone)]
pub struct NewBlockedDomain {
    pub domain: String,
    pub reason: String,
    pub category: String,
    pub risk_level: RiskLevel,
}

impl BlockedDomainRecord {
    /// Synthesizes the verdict served when a domain is already on the
    /// blocklist, skipping the classifier entirely.
    pub fn to_verdict(&self) -> Verdict {
        Verdict {
            safe: false,
            risk_level: self.risk_level,
            category: self.category.clone(),
            reasons: vec![self.reason.clone()],
            recommendation: "This domain was previously flagged as unsafe".to_string(),
            should_block: true,
            cached: true,
        }
    }
}

impl NewBlockedDomain {
    /// Record fields derived from an unsafe verdict.
    pub fn from_verdict(domain: String, verdict: &Verdict) -> Self {
        Self {
            domain,
            reason: verdict.reasons.join("; "),
            category: verdict.category.clone(),
            risk_level: verdict.risk_level,
        }
    }
}

/// Reduces a URL or bare hostname to the blocklist key: lowercase host,
/// no scheme, no port or path, no leading `www.`.
pub fn normalize_domain(input: &str) -> String {
    let trimmed = input.trim();
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let host = Url::parse(&with_scheme)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        .unwrap_or_else(|| {
            // Unparsable input: strip scheme and path by hand
            let rest = trimmed
                .trim_start_matches("https://")
                .trim_start_matches("http://");
            rest.split('/').next().unwrap_or(rest).to_lowercase()
        });

    host.strip_prefix("www.").unwrap_or(&host).to_string()
}
