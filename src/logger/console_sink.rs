use crate::config::LoggingConfig;
use crate::logger::types::{AnalysisAction, AnalysisLogEntry, AnalysisLogSink};
use tracing::info;

pub struct ConsoleLogSink {
    config: LoggingConfig,
}

impl ConsoleLogSink {
    pub fn new(config: LoggingConfig) -> Self {
        Self { config }
    }
}

impl AnalysisLogSink for ConsoleLogSink {
    fn log(&self, entry: &AnalysisLogEntry) {
        if !self.config.enable {
            return;
        }

        let should_log = if entry.blocked {
            self.config.log_blocked
        } else {
            self.config.log_safe
        };

        if !should_log {
            return;
        }

        if self.config.format == "json" {
            // Structured logging via tracing fields
            info!(
                target: "url_analysis",
                url = %entry.url,
                domain = %entry.domain,
                action = ?entry.action,
                risk = ?entry.risk_level,
                category = ?entry.category,
                blocked = %entry.blocked,
                lat = %entry.latency_ms
            );
        } else {
            let outcome = match entry.action {
                AnalysisAction::Allowlisted => "trusted (allowlist)".to_string(),
                AnalysisAction::CacheHit => "served from cache".to_string(),
                AnalysisAction::BlocklistHit => {
                    format!(
                        "blocked, domain already on blocklist ({})",
                        entry.category.as_deref().unwrap_or("Unknown")
                    )
                }
                AnalysisAction::Classified => {
                    let risk = entry
                        .risk_level
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| "unknown".to_string());
                    if entry.blocked {
                        format!("classified {risk} risk, blocked")
                    } else {
                        format!("classified {risk} risk")
                    }
                }
                AnalysisAction::Failed => "classification failed".to_string(),
            };

            info!(
                "{} ({}) -> {} [{}ms]",
                entry.url, entry.domain, outcome, entry.latency_ms
            );
        }
    }
}
