use crate::config::ClassifierConfig;
use crate::guard::types::UrlClassifier;
use crate::verdict::Verdict;
use reqwest::Client;
use std::time::Duration;
use tracing::warn;

/// HTTP client for the analyze endpoint, used on the navigation path.
///
/// Classification failures never block navigation: non-2xx statuses,
/// transport errors, timeouts and undecodable bodies all degrade to the
/// fail-open default verdict.
pub struct RemoteClassifier {
    client: Client,
    endpoint: String,
}

impl RemoteClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        let client = Client::builder()
            .user_agent("ScamGuard/0.3")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("reqwest client construction cannot fail with static options");
        Self {
            client,
            endpoint: config.endpoint_url.clone(),
        }
    }
}

#[async_trait::async_trait]
impl UrlClassifier for RemoteClassifier {
    async fn classify(&self, url: &str) -> Verdict {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => match resp.json::<Verdict>().await {
                Ok(verdict) => verdict,
                Err(e) => {
                    warn!("Analyze endpoint returned undecodable body: {}", e);
                    Verdict::fail_open()
                }
            },
            Ok(resp) => {
                warn!("Analyze endpoint returned status {}", resp.status());
                Verdict::fail_open()
            }
            Err(e) => {
                warn!("Failed to reach analyze endpoint: {}", e);
                Verdict::fail_open()
            }
        }
    }
}
