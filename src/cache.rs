//! Short-lived verdict cache keyed by the exact navigated URL.
//!
//! Entries expire lazily: a read past the TTL evicts the entry and reports
//! a miss. There is no background sweep. Two different paths on the same
//! domain cache independently; domain-level memory lives in the blocklist
//! store, not here.

use crate::verdict::Verdict;
use rustc_hash::FxHashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

struct CacheEntry {
    verdict: Verdict,
    inserted_at: Instant,
}

pub struct VerdictCache {
    ttl: Duration,
    capacity: usize,
    entries: RwLock<FxHashMap<String, CacheEntry>>,
}

impl VerdictCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity,
            entries: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn get(&self, url: &str) -> Option<Verdict> {
        self.get_at(url, Instant::now())
    }

    pub fn put(&self, url: &str, verdict: Verdict) {
        self.put_at(url, verdict, Instant::now());
    }

    /// Clock-injected variant of [`get`](Self::get); an entry older than
    /// the TTL at `now` is evicted and treated as absent.
    pub fn get_at(&self, url: &str, now: Instant) -> Option<Verdict> {
        {
            let entries = self.entries.read().unwrap();
            match entries.get(url) {
                Some(entry) if now.duration_since(entry.inserted_at) < self.ttl => {
                    return Some(entry.verdict.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        // Expired: evict under the write lock.
        self.entries.write().unwrap().remove(url);
        None
    }

    /// Clock-injected variant of [`put`](Self::put). Unconditionally
    /// overwrites any existing entry with a fresh timestamp. Concurrent
    /// writers race last-write-wins; no de-duplication of misses.
    pub fn put_at(&self, url: &str, verdict: Verdict, now: Instant) {
        let mut entries = self.entries.write().unwrap();
        if entries.len() >= self.capacity && !entries.contains_key(url) {
            entries.retain(|_, e| now.duration_since(e.inserted_at) < self.ttl);
        }
        entries.insert(
            url.to_string(),
            CacheEntry {
                verdict,
                inserted_at: now,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::RiskLevel;

    fn cache() -> VerdictCache {
        VerdictCache::new(Duration::from_secs(300), 100)
    }

    #[test]
    fn get_after_put_returns_same_verdict() {
        let cache = cache();
        let verdict = Verdict::parse_failure();
        cache.put("https://a.example/x", verdict.clone());
        assert_eq!(cache.get("https://a.example/x"), Some(verdict));
        // Exact-URL keying: other paths miss
        assert_eq!(cache.get("https://a.example/y"), None);
    }

    #[test]
    fn expired_entry_is_evicted_on_read() {
        let cache = cache();
        let t0 = Instant::now();
        cache.put_at("https://a.example", Verdict::fail_open(), t0);

        // Just inside the TTL
        assert!(cache
            .get_at("https://a.example", t0 + Duration::from_secs(299))
            .is_some());

        // Past the TTL: absent, and the entry is gone
        assert!(cache
            .get_at("https://a.example", t0 + Duration::from_secs(300))
            .is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn put_overwrites_with_fresh_timestamp() {
        let cache = cache();
        let t0 = Instant::now();
        cache.put_at("https://a.example", Verdict::fail_open(), t0);

        let mut newer = Verdict::fail_open();
        newer.risk_level = RiskLevel::Low;
        cache.put_at("https://a.example", newer.clone(), t0 + Duration::from_secs(299));

        // Old timestamp would have expired; the overwrite is still live
        let got = cache.get_at("https://a.example", t0 + Duration::from_secs(400));
        assert_eq!(got, Some(newer));
    }

    #[test]
    fn full_cache_drops_expired_entries_before_insert() {
        let cache = VerdictCache::new(Duration::from_secs(300), 2);
        let t0 = Instant::now();
        cache.put_at("https://a.example", Verdict::fail_open(), t0);
        cache.put_at("https://b.example", Verdict::fail_open(), t0);

        let later = t0 + Duration::from_secs(301);
        cache.put_at("https://c.example", Verdict::fail_open(), later);
        assert_eq!(cache.len(), 1);
        assert!(cache.get_at("https://c.example", later).is_some());
    }
}
