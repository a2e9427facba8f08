use crate::logger::types::{AnalysisAction, AnalysisLogEntry};
use crate::stats::{StatsSnapshot, TopItem};
use crate::store::{BlockedDomainRecord, NewBlockedDomain};
use crate::verdict::RiskLevel;
use rusqlite::{params, Connection, OptionalExtension, Result};
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

pub struct DbClient {
    db_path: String,
    conn: Mutex<Connection>,
}

pub struct LogWriter {
    conn: Connection,
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

impl DbClient {
    pub fn new(db_path: String) -> Result<Self> {
        let conn = Connection::open(&db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Ok(Self {
            db_path,
            conn: Mutex::new(conn),
        })
    }

    pub fn create_log_writer(&self) -> Result<LogWriter> {
        LogWriter::new(&self.db_path)
    }

    pub fn initialize(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS blocked_domains (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                domain TEXT NOT NULL UNIQUE,
                reason TEXT NOT NULL,
                category TEXT NOT NULL,
                risk_level TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS analysis_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp INTEGER NOT NULL,
                url TEXT NOT NULL,
                domain TEXT NOT NULL,
                action TEXT NOT NULL,
                risk_level TEXT,
                category TEXT,
                blocked INTEGER NOT NULL DEFAULT 0,
                latency_ms INTEGER
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS guard_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;

        // Indices
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_blocked_domains_created ON blocked_domains(created_at)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_logs_timestamp ON analysis_logs(timestamp)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_logs_domain ON analysis_logs(domain)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_logs_action ON analysis_logs(action)",
            [],
        )?;

        info!("SQLite database initialized at {}", self.db_path);
        Ok(())
    }

    // --- blocked_domains ---

    pub fn lookup_domain(&self, domain: &str) -> Result<Option<BlockedDomainRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT domain, reason, category, risk_level, created_at, updated_at
             FROM blocked_domains WHERE domain = ?1",
        )?;
        stmt.query_row(params![domain], row_to_record).optional()
    }

    /// Insert-or-replace keyed by domain. The latest verdict wins;
    /// `created_at` is preserved on update.
    pub fn upsert_domain(&self, entry: &NewBlockedDomain) -> Result<BlockedDomainRecord> {
        let now = unix_now();
        {
            let conn = self.conn.lock().unwrap();
            let mut stmt = conn.prepare_cached(
                "INSERT INTO blocked_domains (domain, reason, category, risk_level, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT(domain) DO UPDATE SET
                     reason = excluded.reason,
                     category = excluded.category,
                     risk_level = excluded.risk_level,
                     updated_at = excluded.updated_at",
            )?;
            stmt.execute(params![
                entry.domain,
                entry.reason,
                entry.category,
                entry.risk_level.to_string(),
                now
            ])?;
        }
        self.lookup_domain(&entry.domain)
            .map(|record| record.expect("upserted domain must be present"))
    }

    pub fn list_domains(&self) -> Result<Vec<BlockedDomainRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT domain, reason, category, risk_level, created_at, updated_at
             FROM blocked_domains ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], row_to_record)?;
        rows.collect()
    }

    // --- guard_state ---

    pub fn get_state(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached("SELECT value FROM guard_state WHERE key = ?1")?;
        stmt.query_row(params![key], |row| row.get(0)).optional()
    }

    pub fn set_state(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "INSERT INTO guard_state (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )?;
        stmt.execute(params![key, value])?;
        Ok(())
    }

    // --- analysis_logs ---

    pub fn get_stats(&self) -> Result<StatsSnapshot> {
        let conn = self.conn.lock().unwrap();

        let count = |sql: &str| -> Result<u64> {
            conn.prepare_cached(sql)?
                .query_row([], |r| r.get::<_, i64>(0))
                .map(|n| n as u64)
        };

        let total_analyses = count("SELECT COUNT(*) FROM analysis_logs")?;
        let allowlist_hits =
            count("SELECT COUNT(*) FROM analysis_logs WHERE action = 'Allowlisted'")?;
        let cache_hits = count("SELECT COUNT(*) FROM analysis_logs WHERE action = 'CacheHit'")?;
        let blocklist_hits =
            count("SELECT COUNT(*) FROM analysis_logs WHERE action = 'BlocklistHit'")?;
        let llm_calls =
            count("SELECT COUNT(*) FROM analysis_logs WHERE action IN ('Classified', 'Failed')")?;
        let blocked = count("SELECT COUNT(*) FROM analysis_logs WHERE blocked = 1")?;
        let warnings =
            count("SELECT COUNT(*) FROM analysis_logs WHERE risk_level = 'medium' AND blocked = 0")?;
        let failures = count("SELECT COUNT(*) FROM analysis_logs WHERE action = 'Failed'")?;

        let mut stmt = conn.prepare_cached(
            "SELECT domain, COUNT(*) as c FROM analysis_logs WHERE blocked = 1
             GROUP BY domain ORDER BY c DESC LIMIT 5",
        )?;
        let top_flagged_domains = stmt
            .query_map([], |row| {
                Ok(TopItem {
                    name: row.get(0)?,
                    count: row.get::<_, i64>(1)? as u64,
                })
            })?
            .collect::<Result<Vec<_>>>()?;

        let started_at: i64 = conn
            .prepare_cached("SELECT COALESCE(MIN(timestamp), 0) FROM analysis_logs")?
            .query_row([], |r| r.get(0))?;

        Ok(StatsSnapshot {
            total_analyses,
            allowlist_hits,
            cache_hits,
            blocklist_hits,
            llm_calls,
            blocked,
            warnings,
            failures,
            top_flagged_domains,
            started_at: started_at as u64,
            updated_at: unix_now() as u64,
        })
    }

    pub fn get_logs(&self, limit: usize) -> Result<Vec<AnalysisLogEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT url, domain, action, risk_level, category, blocked, latency_ms
             FROM analysis_logs ORDER BY timestamp DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit as i64], |row| {
            let action: String = row.get(2)?;
            let risk_level: Option<String> = row.get(3)?;
            let latency_ms: Option<i64> = row.get(6)?;
            Ok(AnalysisLogEntry {
                url: row.get(0)?,
                domain: row.get(1)?,
                action: parse_action(&action),
                risk_level: risk_level.and_then(|s| RiskLevel::from_str(&s).ok()),
                category: row.get(4)?,
                blocked: row.get::<_, i64>(5)? != 0,
                latency_ms: latency_ms.unwrap_or(0) as u64,
            })
        })?;
        rows.collect()
    }
}

impl LogWriter {
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Ok(Self { conn })
    }

    pub fn insert_log(&mut self, entry: &AnalysisLogEntry) -> Result<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO analysis_logs (
                timestamp, url, domain, action, risk_level, category, blocked, latency_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;

        stmt.execute(params![
            unix_now(),
            entry.url,
            entry.domain,
            format!("{:?}", entry.action),
            entry.risk_level.map(|r| r.to_string()),
            entry.category,
            entry.blocked as i64,
            entry.latency_ms as i64
        ])?;

        Ok(())
    }

    pub fn prune_logs(&mut self, retention_hours: u64) -> Result<()> {
        let cutoff = unix_now() - (retention_hours * 3600) as i64;
        let mut stmt = self
            .conn
            .prepare_cached("DELETE FROM analysis_logs WHERE timestamp < ?1")?;
        stmt.execute(params![cutoff])?;
        Ok(())
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> Result<BlockedDomainRecord> {
    let risk: String = row.get(3)?;
    Ok(BlockedDomainRecord {
        domain: row.get(0)?,
        reason: row.get(1)?,
        category: row.get(2)?,
        risk_level: RiskLevel::from_str(&risk).unwrap_or_default(),
        created_at: row.get::<_, i64>(4)? as u64,
        updated_at: row.get::<_, i64>(5)? as u64,
    })
}

fn parse_action(s: &str) -> AnalysisAction {
    match s {
        "Allowlisted" => AnalysisAction::Allowlisted,
        "CacheHit" => AnalysisAction::CacheHit,
        "BlocklistHit" => AnalysisAction::BlocklistHit,
        "Classified" => AnalysisAction::Classified,
        "Failed" => AnalysisAction::Failed,
        _ => AnalysisAction::Classified, // Fallback
    }
}
