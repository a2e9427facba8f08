use crate::guard::state::BlockedSnapshot;
use crate::verdict::Verdict;
use anyhow::Result;
use serde::Serialize;

pub type TabId = u32;

/// Toolbar badge states, with the color/text pairs the browser surface
/// renders them as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeStatus {
    Safe,
    Warning,
    Danger,
    Analyzing,
    Disabled,
}

impl BadgeStatus {
    pub fn color(&self) -> &'static str {
        match self {
            BadgeStatus::Safe => "#22c55e",
            BadgeStatus::Warning => "#eab308",
            BadgeStatus::Danger => "#ef4444",
            BadgeStatus::Analyzing => "#3b82f6",
            BadgeStatus::Disabled => "#6b7280",
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            BadgeStatus::Safe => "\u{2713}",
            BadgeStatus::Warning => "!",
            BadgeStatus::Danger => "\u{2715}",
            BadgeStatus::Analyzing => "...",
            BadgeStatus::Disabled => "OFF",
        }
    }
}

/// How one navigation event was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    /// Protection toggle is off.
    Disabled,
    /// Sub-frame, non-http(s) scheme, own blocked page, or nothing cached.
    Ignored,
    Safe,
    Warning,
    Blocked,
    /// A newer navigation for the same tab superseded this one; side
    /// effects were dropped.
    Superseded,
}

/// Browser surface the guard drives. Implementations bridge to the actual
/// extension APIs; tests substitute a recording fake.
#[async_trait::async_trait]
pub trait BrowserControl: Send + Sync {
    async fn set_badge(&self, tab: TabId, status: BadgeStatus) -> Result<()>;
    async fn redirect(&self, tab: TabId, url: &str) -> Result<()>;
}

/// Guard-side classifier handle. Infallible: transport problems degrade to
/// the fail-open verdict inside the implementation.
#[async_trait::async_trait]
pub trait UrlClassifier: Send + Sync {
    async fn classify(&self, url: &str) -> Verdict;
}

/// Summary served to the popup.
#[derive(Debug, Clone, Serialize)]
pub struct GuardStatus {
    pub enabled: bool,
    pub blocked_count: u64,
    pub last_blocked: Option<BlockedSnapshot>,
}
