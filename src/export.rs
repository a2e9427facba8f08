//! Read-only export formats derived from the blocklist, consumed by
//! external DNS and content-blocking tooling.

use crate::store::BlockedDomainRecord;
use serde_json::{json, Value};

/// Hosts-file lines, one `0.0.0.0 <domain>` per record.
pub fn hosts_file(records: &[BlockedDomainRecord]) -> String {
    records
        .iter()
        .map(|r| format!("0.0.0.0 {}", r.domain))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Safari content-blocker rule list: one block rule per domain with a
/// regex-escaped substring URL filter.
pub fn safari_rules(records: &[BlockedDomainRecord]) -> Value {
    let rules: Vec<Value> = records
        .iter()
        .map(|r| {
            json!({
                "trigger": {
                    "url-filter": format!(".*{}.*", regex::escape(&r.domain)),
                    "load-type": ["third-party", "first-party"]
                },
                "action": {
                    "type": "block"
                }
            })
        })
        .collect();
    Value::Array(rules)
}

/// Flat domain list with count and timestamp.
pub fn domain_list(records: &[BlockedDomainRecord], updated_at: &str) -> Value {
    let domains: Vec<&str> = records.iter().map(|r| r.domain.as_str()).collect();
    json!({
        "count": domains.len(),
        "domains": domains,
        "updated_at": updated_at,
    })
}

/// Full record dump.
pub fn full_dump(records: &[BlockedDomainRecord], updated_at: &str) -> Value {
    json!({
        "count": records.len(),
        "domains": records,
        "updated_at": updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::RiskLevel;

    fn record(domain: &str) -> BlockedDomainRecord {
        BlockedDomainRecord {
            domain: domain.to_string(),
            reason: "test".to_string(),
            category: "Phishing".to_string(),
            risk_level: RiskLevel::High,
            created_at: 1,
            updated_at: 1,
        }
    }

    #[test]
    fn hosts_format_is_one_line_per_domain() {
        let records = vec![record("evil.example"), record("bad.example")];
        assert_eq!(hosts_file(&records), "0.0.0.0 evil.example\n0.0.0.0 bad.example");
        assert_eq!(hosts_file(&[record("evil.example")]), "0.0.0.0 evil.example");
        assert_eq!(hosts_file(&[]), "");
    }

    #[test]
    fn safari_rules_escape_regex_metacharacters() {
        let rules = safari_rules(&[record("evil.example")]);
        let filter = rules[0]["trigger"]["url-filter"].as_str().unwrap();
        assert_eq!(filter, r".*evil\.example.*");
        assert_eq!(rules[0]["action"]["type"], "block");
    }

    #[test]
    fn domain_list_has_count_and_timestamp() {
        let value = domain_list(&[record("evil.example")], "2026-08-06T00:00:00Z");
        assert_eq!(value["count"], 1);
        assert_eq!(value["domains"][0], "evil.example");
        assert_eq!(value["updated_at"], "2026-08-06T00:00:00Z");
    }

    #[test]
    fn full_dump_includes_records() {
        let value = full_dump(&[record("evil.example")], "2026-08-06T00:00:00Z");
        assert_eq!(value["count"], 1);
        assert_eq!(value["domains"][0]["domain"], "evil.example");
        assert_eq!(value["domains"][0]["risk_level"], "high");
    }
}
