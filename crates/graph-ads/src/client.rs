//! Graph API HTTP client.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AdsError, Result};

/// Fields requested for an ad object.
const AD_FIELDS: &str = "name,adset_id,adset.fields(name),campaign_id,campaign.fields(name)";

/// Ad attribution details for a source ID.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdDetails {
    /// Ad name.
    pub ad_name: Option<String>,
    /// Adset ID.
    pub adset_id: Option<String>,
    /// Adset name.
    pub adset_name: Option<String>,
    /// Campaign ID.
    pub campaign_id: Option<String>,
    /// Campaign name.
    pub campaign_name: Option<String>,
}

/// Wire shape of the ad object response.
#[derive(Debug, Deserialize)]
struct AdResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    adset_id: Option<String>,
    #[serde(default)]
    adset: Option<NamedObject>,
    #[serde(default)]
    campaign_id: Option<String>,
    #[serde(default)]
    campaign: Option<NamedObject>,
}

#[derive(Debug, Deserialize)]
struct NamedObject {
    #[serde(default)]
    name: Option<String>,
}

/// Client for ad attribution lookups against the Graph API.
#[derive(Debug, Clone)]
pub struct AdsClient {
    http: Client,
    access_token: String,
    base_url: String,
}

impl AdsClient {
    /// Default Graph API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://graph.facebook.com/v18.0";

    /// Create a client with the given access token.
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http,
            access_token: access_token.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch ad, adset, and campaign attribution for an ad ID.
    pub async fn ad_details(&self, ad_id: &str) -> Result<AdDetails> {
        let url = format!("{}/{}", self.base_url, ad_id);
        debug!("Fetching ad details for {}", ad_id);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("fields", AD_FIELDS),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdsError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let ad: AdResponse = response.json().await?;
        Ok(AdDetails {
            ad_name: ad.name,
            adset_id: ad.adset_id,
            adset_name: ad.adset.and_then(|a| a.name),
            campaign_id: ad.campaign_id,
            campaign_name: ad.campaign.and_then(|c| c.name),
        })
    }
}
