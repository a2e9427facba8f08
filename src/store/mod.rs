mod memory;
mod sqlite;
mod types;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use types::{normalize_domain, BlockedDomainRecord, NewBlockedDomain};

use anyhow::Result;

/// Durable domain-level memory of prior unsafe verdicts, shared across
/// clients and sessions.
#[async_trait::async_trait]
pub trait BlocklistStore: Send + Sync {
    /// Exact match on a normalized domain.
    async fn lookup(&self, domain: &str) -> Result<Option<BlockedDomainRecord>>;

    /// Insert-or-replace keyed by normalized domain; concurrent upserts
    /// for the same domain are last-write-wins.
    async fn upsert(&self, entry: NewBlockedDomain) -> Result<BlockedDomainRecord>;

    /// All records, most recently created first.
    async fn list_all(&self) -> Result<Vec<BlockedDomainRecord>>;
}
