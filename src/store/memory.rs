use super::{BlockedDomainRecord, BlocklistStore, NewBlockedDomain};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// In-memory blocklist store for tests and ephemeral setups. Insertion
/// order stands in for creation order; `list_all` returns newest first.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<BlockedDomainRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[async_trait]
impl BlocklistStore for MemoryStore {
    async fn lookup(&self, domain: &str) -> Result<Option<BlockedDomainRecord>> {
        let records = self.records.read().unwrap();
        Ok(records.iter().find(|r| r.domain == domain).cloned())
    }

    async fn upsert(&self, entry: NewBlockedDomain) -> Result<BlockedDomainRecord> {
        let now = unix_now();
        let mut records = self.records.write().unwrap();

        if let Some(existing) = records.iter_mut().find(|r| r.domain == entry.domain) {
            existing.reason = entry.reason;
            existing.category = entry.category;
            existing.risk_level = entry.risk_level;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let record = BlockedDomainRecord {
            domain: entry.domain,
            reason: entry.reason,
            category: entry.category,
            risk_level: entry.risk_level,
            created_at: now,
            updated_at: now,
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn list_all(&self) -> Result<Vec<BlockedDomainRecord>> {
        let records = self.records.read().unwrap();
        Ok(records.iter().rev().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::RiskLevel;

    fn entry(domain: &str, reason: &str) -> NewBlockedDomain {
        NewBlockedDomain {
            domain: domain.to_string(),
            reason: reason.to_string(),
            category: "Phishing".to_string(),
            risk_level: RiskLevel::High,
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent_per_domain() {
        let store = MemoryStore::new();
        store.upsert(entry("evil.example", "first")).await.unwrap();
        store.upsert(entry("evil.example", "second")).await.unwrap();

        assert_eq!(store.len(), 1);
        let record = store.lookup("evil.example").await.unwrap().unwrap();
        assert_eq!(record.reason, "second");
    }

    #[tokio::test]
    async fn list_all_is_newest_first() {
        let store = MemoryStore::new();
        store.upsert(entry("a.example", "r")).await.unwrap();
        store.upsert(entry("b.example", "r")).await.unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all[0].domain, "b.example");
        assert_eq!(all[1].domain, "a.example");
    }
}
