//! Persisted protection state: the on/off toggle, blocked counter, last
//! blocked snapshot, and the daily scan counter.
//!
//! Reads are fail-safe: a store that cannot be read behaves as
//! protection-enabled with empty counters.

use crate::db::DbClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::RwLock;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedSnapshot {
    pub url: String,
    pub reasons: Vec<String>,
    pub category: String,
    pub recommendation: String,
    pub timestamp_ms: i64,
}

/// Current calendar day as the string the daily scan counter is keyed by.
pub fn today() -> String {
    chrono::Utc::now().date_naive().to_string()
}

#[async_trait::async_trait]
pub trait ProtectionStore: Send + Sync {
    /// Defaults to true when nothing has been persisted.
    async fn protection_enabled(&self) -> bool;
    async fn set_protection_enabled(&self, enabled: bool);

    async fn blocked_count(&self) -> u64;
    /// Stores the snapshot and increments the blocked counter.
    async fn record_block(&self, snapshot: BlockedSnapshot);
    async fn last_blocked(&self) -> Option<BlockedSnapshot>;

    /// Counts one scan for `date`, resetting the counter when the stored
    /// day differs. Returns the new count.
    async fn record_scan(&self, date: &str) -> u64;
    async fn scans_today(&self, date: &str) -> u64;
}

// --- In-memory implementation (tests, ephemeral sessions) ---

#[derive(Debug)]
struct StateInner {
    enabled: bool,
    blocked_count: u64,
    last_blocked: Option<BlockedSnapshot>,
    scans_today: u64,
    last_scan_date: String,
}

#[derive(Debug)]
pub struct MemoryProtectionStore {
    inner: RwLock<StateInner>,
}

impl MemoryProtectionStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StateInner {
                enabled: true,
                blocked_count: 0,
                last_blocked: None,
                scans_today: 0,
                last_scan_date: String::new(),
            }),
        }
    }
}

impl Default for MemoryProtectionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ProtectionStore for MemoryProtectionStore {
    async fn protection_enabled(&self) -> bool {
        self.inner.read().unwrap().enabled
    }

    async fn set_protection_enabled(&self, enabled: bool) {
        self.inner.write().unwrap().enabled = enabled;
    }

    async fn blocked_count(&self) -> u64 {
        self.inner.read().unwrap().blocked_count
    }

    async fn record_block(&self, snapshot: BlockedSnapshot) {
        let mut inner = self.inner.write().unwrap();
        inner.blocked_count += 1;
        inner.last_blocked = Some(snapshot);
    }

    async fn last_blocked(&self) -> Option<BlockedSnapshot> {
        self.inner.read().unwrap().last_blocked.clone()
    }

    async fn record_scan(&self, date: &str) -> u64 {
        let mut inner = self.inner.write().unwrap();
        if inner.last_scan_date != date {
            inner.last_scan_date = date.to_string();
            inner.scans_today = 0;
        }
        inner.scans_today += 1;
        inner.scans_today
    }

    async fn scans_today(&self, date: &str) -> u64 {
        let inner = self.inner.read().unwrap();
        if inner.last_scan_date == date {
            inner.scans_today
        } else {
            0
        }
    }
}

// --- SQLite implementation (server context) ---

const KEY_ENABLED: &str = "protection_enabled";
const KEY_BLOCKED_COUNT: &str = "blocked_count";
const KEY_LAST_BLOCKED: &str = "last_blocked";
const KEY_SCANS_TODAY: &str = "scans_today";
const KEY_LAST_SCAN_DATE: &str = "last_scan_date";

pub struct SqliteProtectionStore {
    db: Arc<DbClient>,
}

impl SqliteProtectionStore {
    pub fn new(db: Arc<DbClient>) -> Self {
        Self { db }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.db.get_state(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to read guard state {}: {}", key, e);
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.db.set_state(key, value) {
            warn!("Failed to persist guard state {}: {}", key, e);
        }
    }

    fn read_u64(&self, key: &str) -> u64 {
        self.read(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ProtectionStore for SqliteProtectionStore {
    async fn protection_enabled(&self) -> bool {
        // Anything but an explicit "false" counts as enabled
        self.read(KEY_ENABLED).as_deref() != Some("false")
    }

    async fn set_protection_enabled(&self, enabled: bool) {
        self.write(KEY_ENABLED, if enabled { "true" } else { "false" });
    }

    async fn blocked_count(&self) -> u64 {
        self.read_u64(KEY_BLOCKED_COUNT)
    }

    async fn record_block(&self, snapshot: BlockedSnapshot) {
        let count = self.read_u64(KEY_BLOCKED_COUNT) + 1;
        self.write(KEY_BLOCKED_COUNT, &count.to_string());
        match serde_json::to_string(&snapshot) {
            Ok(json) => self.write(KEY_LAST_BLOCKED, &json),
            Err(e) => warn!("Failed to encode last-blocked snapshot: {}", e),
        }
    }

    async fn last_blocked(&self) -> Option<BlockedSnapshot> {
        let json = self.read(KEY_LAST_BLOCKED)?;
        serde_json::from_str(&json).ok()
    }

    async fn record_scan(&self, date: &str) -> u64 {
        let stored_date = self.read(KEY_LAST_SCAN_DATE).unwrap_or_default();
        let count = if stored_date == date {
            self.read_u64(KEY_SCANS_TODAY) + 1
        } else {
            1
        };
        self.write(KEY_LAST_SCAN_DATE, date);
        self.write(KEY_SCANS_TODAY, &count.to_string());
        count
    }

    async fn scans_today(&self, date: &str) -> u64 {
        let stored_date = self.read(KEY_LAST_SCAN_DATE).unwrap_or_default();
        if stored_date == date {
            self.read_u64(KEY_SCANS_TODAY)
        } else {
            0
        }
    }
}
