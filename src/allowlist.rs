use rustc_hash::FxHashSet;
use url::Url;

/// Statically configured trusted domains checked before any remote call.
///
/// A URL matches when its hostname equals an entry or is a subdomain of
/// one. Matching walks the hostname suffix label by label, so lookup cost
/// is bounded by label count rather than allowlist size.
#[derive(Debug)]
pub struct Allowlist {
    domains: FxHashSet<Box<str>>,
}

impl Allowlist {
    pub fn new(entries: Vec<String>) -> Self {
        let mut domains = FxHashSet::default();
        for entry in entries {
            domains.insert(entry.to_lowercase().into_boxed_str());
        }
        Self { domains }
    }

    /// Returns true iff the URL parses and its hostname is covered by an
    /// allowlist entry. Malformed URLs fall into the slow path (false).
    pub fn matches(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host = host.to_lowercase();

        // Iterative suffix match
        let mut part = host.as_str();
        loop {
            if self.domains.contains(part) {
                return true;
            }
            match part.find('.') {
                Some(idx) => {
                    part = &part[idx + 1..];
                    if part.is_empty() {
                        break;
                    }
                }
                None => break,
            }
        }

        false
    }
}
