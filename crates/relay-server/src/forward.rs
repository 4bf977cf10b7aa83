//! Forwarding of processed messages to the Make automation webhook.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

/// Posts processed message records to the configured Make scenario.
#[derive(Debug, Clone)]
pub struct Forwarder {
    http: Client,
    url: String,
}

impl Forwarder {
    pub fn new(url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// Send one record downstream. Returns whether Make acked with a 2xx.
    ///
    /// Delivery failures are logged and swallowed; the message is stored
    /// either way with `forwarded` reflecting the outcome.
    pub async fn forward(&self, payload: &serde_json::Value) -> bool {
        match self.http.post(&self.url).json(payload).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Forwarded message to Make");
                true
            }
            Ok(response) => {
                warn!("Make webhook returned {}", response.status());
                false
            }
            Err(e) => {
                warn!("Make webhook request failed: {}", e);
                false
            }
        }
    }
}
