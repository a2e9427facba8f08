use super::{ClassifyError, LlmClassifier};
use crate::config::ClassifierConfig;
use crate::verdict::Verdict;
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Models reply with either raw JSON or JSON fenced in a markdown code
/// block; first matching pattern wins.
static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").unwrap());
static BARE_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

const SYSTEM_PROMPT: &str = "You are a security analyst assessing a single URL for phishing and \
scam risk. Respond with only a JSON object of the form \
{\"safe\": boolean, \"riskLevel\": \"low\"|\"medium\"|\"high\", \
\"category\": string, \"reasons\": [string], \"recommendation\": string, \
\"shouldBlock\": boolean}.";

/// Chat-completions client of the external AI gateway.
pub struct GatewayClassifier {
    client: Client,
    config: ClassifierConfig,
}

impl GatewayClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        let client = Client::builder()
            .user_agent("ScamGuard/0.3")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("reqwest client construction cannot fail with static options");
        Self { client, config }
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Pulls the verdict out of the assistant message. Unparsable content
/// degrades to the conservative default rather than an error.
pub(crate) fn extract_verdict(content: &str) -> Verdict {
    let candidate = FENCED_JSON
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .or_else(|| BARE_OBJECT.find(content).map(|m| m.as_str()))
        .unwrap_or(content);

    match serde_json::from_str(candidate) {
        Ok(verdict) => verdict,
        Err(e) => {
            debug!("Could not parse classifier output: {}", e);
            Verdict::parse_failure()
        }
    }
}

#[async_trait::async_trait]
impl LlmClassifier for GatewayClassifier {
    async fn classify(&self, url: &str) -> Result<Verdict, ClassifyError> {
        let api_key = std::env::var(&self.config.api_key_env)
            .map_err(|_| ClassifyError::MissingApiKey(self.config.api_key_env.clone()))?;

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": format!("Analyze this URL: {url}") }
            ],
        });

        let response = self
            .client
            .post(&self.config.gateway_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow::Error::new(e).context("AI gateway request failed"))?;

        match response.status().as_u16() {
            429 => return Err(ClassifyError::RateLimited),
            402 => return Err(ClassifyError::QuotaExhausted),
            status if !(200..300).contains(&status) => {
                return Err(anyhow::anyhow!("AI gateway returned status {status}").into());
            }
            _ => {}
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .context("failed to decode gateway response")?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow::anyhow!("gateway response contained no completion"))?;

        Ok(extract_verdict(&content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::RiskLevel;

    #[test]
    fn parses_fenced_json() {
        let content = "Here is my assessment:\n```json\n{\"safe\": false, \"riskLevel\": \"high\", \"shouldBlock\": true}\n```\nStay safe!";
        let verdict = extract_verdict(content);
        assert!(!verdict.safe);
        assert_eq!(verdict.risk_level, RiskLevel::High);
        assert!(verdict.should_block);
    }

    #[test]
    fn parses_bare_json_with_surrounding_prose() {
        let content = "Assessment: {\"safe\": true, \"riskLevel\": \"low\"} -- done";
        let verdict = extract_verdict(content);
        assert!(verdict.safe);
        assert_eq!(verdict.risk_level, RiskLevel::Low);
    }

    #[test]
    fn garbage_degrades_to_conservative_default() {
        let verdict = extract_verdict("I cannot answer that.");
        assert_eq!(verdict, Verdict::parse_failure());
        assert!(!verdict.blocks());
    }

    #[test]
    fn fenced_block_wins_over_outer_braces() {
        let content = "{not json} ```json {\"safe\": true, \"riskLevel\": \"low\"} ``` trailing";
        let verdict = extract_verdict(content);
        assert!(verdict.safe);
    }
}
