use super::{BlockedDomainRecord, BlocklistStore, NewBlockedDomain};
use crate::db::DbClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// SQLite-backed blocklist store. Queries are short exclusive-lock work on
/// the shared connection, so they run inline on the async task.
pub struct SqliteStore {
    db: Arc<DbClient>,
}

impl SqliteStore {
    pub fn new(db: Arc<DbClient>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BlocklistStore for SqliteStore {
    async fn lookup(&self, domain: &str) -> Result<Option<BlockedDomainRecord>> {
        self.db
            .lookup_domain(domain)
            .context("blocklist lookup failed")
    }

    async fn upsert(&self, entry: NewBlockedDomain) -> Result<BlockedDomainRecord> {
        self.db
            .upsert_domain(&entry)
            .context("blocklist upsert failed")
    }

    async fn list_all(&self) -> Result<Vec<BlockedDomainRecord>> {
        self.db.list_domains().context("blocklist listing failed")
    }
}
