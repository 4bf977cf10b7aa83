//! Kommo API HTTP client.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{api_base_url, KommoConfig};
use crate::error::{KommoError, Result};
use crate::phone::phone_permutations;
use crate::types::{
    Contact, Lead, LeadSearch, LeadsResponse, PipelineMap, PipelinesResponse, TokenResponse,
};

/// Request body for the OAuth token endpoint.
#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
    redirect_uri: &'a str,
}

/// Client for the Kommo CRM API.
///
/// Carries the integration credentials; the account domain is passed per
/// call because one relay can serve several accounts.
#[derive(Debug, Clone)]
pub struct KommoClient {
    http: Client,
    config: KommoConfig,
}

impl KommoClient {
    /// Create a client with the given credentials.
    pub fn new(config: KommoConfig) -> Result<Self> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { http, config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &KommoConfig {
        &self.config
    }

    /// Exchange an authorization code for a token pair.
    pub async fn exchange_code(&self, domain: &str, code: &str) -> Result<TokenResponse> {
        self.token_request(
            domain,
            TokenRequest {
                client_id: &self.config.client_id,
                client_secret: &self.config.client_secret,
                grant_type: "authorization_code",
                code: Some(code),
                refresh_token: None,
                redirect_uri: &self.config.redirect_uri,
            },
        )
        .await
    }

    /// Trade a refresh token for a fresh token pair.
    pub async fn refresh(&self, domain: &str, refresh_token: &str) -> Result<TokenResponse> {
        self.token_request(
            domain,
            TokenRequest {
                client_id: &self.config.client_id,
                client_secret: &self.config.client_secret,
                grant_type: "refresh_token",
                code: None,
                refresh_token: Some(refresh_token),
                redirect_uri: &self.config.redirect_uri,
            },
        )
        .await
    }

    async fn token_request(
        &self,
        domain: &str,
        request: TokenRequest<'_>,
    ) -> Result<TokenResponse> {
        let url = format!("{}/oauth2/access_token", api_base_url(domain));
        debug!("Token request ({}) to {}", request.grant_type, url);

        let response = self.http.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KommoError::Token {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    /// Search leads by phone number, trying format permutations until one
    /// produces a hit.
    ///
    /// A 204 or an empty result moves on to the next permutation. A hard
    /// failure on the first permutation is an error; on later ones it is
    /// logged and skipped. Exhausting all permutations yields an empty
    /// result, not an error.
    pub async fn search_lead_by_phone(
        &self,
        domain: &str,
        access_token: &str,
        phone: &str,
    ) -> Result<LeadSearch> {
        let queries = phone_permutations(phone);
        let url = format!("{}/api/v4/leads", api_base_url(domain));

        for (attempt, query) in queries.iter().enumerate() {
            debug!("Searching leads with query {:?}", query);
            let result = self
                .http
                .get(&url)
                .bearer_auth(access_token)
                .query(&[
                    ("with", "contacts,custom_fields_values"),
                    ("query", query.as_str()),
                ])
                .send()
                .await;

            let response = match result {
                Ok(response) => response,
                Err(e) if attempt == 0 => return Err(e.into()),
                Err(e) => {
                    warn!("Lead search with query {:?} failed: {}", query, e);
                    continue;
                }
            };

            let status = response.status();
            if status == StatusCode::NO_CONTENT {
                continue;
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                if attempt == 0 {
                    return Err(KommoError::Api {
                        status: status.as_u16(),
                        body,
                    });
                }
                warn!("Lead search with query {:?} returned {}", query, status);
                continue;
            }

            let leads = response.json::<LeadsResponse>().await?.into_leads();
            if !leads.is_empty() {
                info!("Found {} lead(s) with query {:?}", leads.len(), query);
                return Ok(LeadSearch {
                    leads,
                    matched_query: Some(query.clone()),
                    queries: queries.clone(),
                });
            }
        }

        Ok(LeadSearch {
            leads: Vec::new(),
            matched_query: None,
            queries,
        })
    }

    /// Fetch a lead with its linked contacts and custom fields.
    pub async fn get_lead(&self, domain: &str, access_token: &str, lead_id: &str) -> Result<Lead> {
        let url = format!("{}/api/v4/leads/{}", api_base_url(domain), lead_id);
        self.get_json(
            &url,
            access_token,
            &[("with", "contacts,catalog_elements,custom_fields_values")],
        )
        .await
    }

    /// Fetch a contact.
    pub async fn get_contact(
        &self,
        domain: &str,
        access_token: &str,
        contact_id: i64,
    ) -> Result<Contact> {
        let url = format!("{}/api/v4/contacts/{}", api_base_url(domain), contact_id);
        self.get_json(&url, access_token, &[]).await
    }

    /// Fetch all pipelines with their stages, keyed by string ids.
    pub async fn get_pipelines(&self, domain: &str, access_token: &str) -> Result<PipelineMap> {
        let url = format!("{}/api/v4/leads/pipelines", api_base_url(domain));
        let response: PipelinesResponse = self.get_json(&url, access_token, &[]).await?;
        Ok(PipelineMap::from(response))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        access_token: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let mut request = self.http.get(url).bearer_auth(access_token);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KommoError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}
