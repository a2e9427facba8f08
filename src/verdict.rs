//! Safety judgment for a single URL.
//!
//! The wire format uses camelCase field names to match what the browser
//! extension and web UI expect from the analyze endpoint.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    /// Degraded-mode value used when classification failed.
    #[default]
    Unknown,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

impl FromStr for RiskLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            _ => Ok(RiskLevel::Unknown),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub safe: bool,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default)]
    pub recommendation: String,
    #[serde(default)]
    pub should_block: bool,
    /// Set when the verdict was synthesized from the blocklist store
    /// instead of a fresh classification.
    #[serde(default, skip_serializing_if = "is_false")]
    pub cached: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Verdict {
    /// Default substituted when classification is unavailable. Failures
    /// never block navigation.
    pub fn fail_open() -> Self {
        Self {
            safe: true,
            risk_level: RiskLevel::Unknown,
            category: String::new(),
            reasons: Vec::new(),
            recommendation: String::new(),
            should_block: false,
            cached: false,
        }
    }

    /// Conservative default substituted when the classifier responded but
    /// its output could not be parsed.
    pub fn parse_failure() -> Self {
        Self {
            safe: false,
            risk_level: RiskLevel::Medium,
            category: "Unknown".to_string(),
            reasons: vec!["Could not fully analyze the URL".to_string()],
            recommendation: "Be cautious with this site".to_string(),
            should_block: false,
            cached: false,
        }
    }

    /// `should_block` is authoritative; a high risk level only blocks when
    /// the verdict is also marked unsafe.
    pub fn blocks(&self) -> bool {
        self.should_block || (!self.safe && self.risk_level == RiskLevel::High)
    }

    /// Whether this verdict warrants a persistent blocklist record for its
    /// domain.
    pub fn needs_blocklist_record(&self) -> bool {
        !self.safe && (self.risk_level == RiskLevel::High || self.should_block)
    }
}
