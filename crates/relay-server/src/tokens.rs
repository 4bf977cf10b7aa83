//! Stored Kommo credentials with lazy refresh.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use database::{Database, KommoToken};
use kommo::{derive_account_id, KommoClient, TokenResponse};
use tracing::{info, warn};

/// A usable access token for one connected account.
#[derive(Debug, Clone)]
pub struct ActiveToken {
    pub account_id: String,
    pub domain: String,
    pub access_token: String,
}

/// Why a usable token could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// No account has completed the OAuth flow yet.
    #[error("No Kommo account is connected")]
    NoAccount,

    /// The referenced account has no stored token.
    #[error("No token stored for account {0}")]
    UnknownAccount(String),

    /// The stored token expired and the refresh grant was rejected.
    #[error("Token refresh failed: {0}")]
    Refresh(#[source] kommo::KommoError),

    /// Token storage failed.
    #[error(transparent)]
    Database(#[from] database::DatabaseError),
}

/// Hands out stored access tokens, refreshing expired ones on read.
///
/// Refresh is not single-flight: two requests hitting the same expired
/// account refresh twice and the second upsert wins. Kommo keeps the
/// superseded grant usable, so nothing breaks in that window.
#[derive(Clone)]
pub struct TokenManager {
    db: Database,
    kommo: KommoClient,
}

impl TokenManager {
    pub fn new(db: Database, kommo: KommoClient) -> Self {
        Self { db, kommo }
    }

    /// Persist an OAuth token response, returning the derived account id.
    ///
    /// The stored domain prefers the `base_domain` echoed by Kommo over
    /// the domain the exchange was sent to, so later refreshes hit the
    /// account's real host.
    pub async fn store(&self, response: &TokenResponse, domain: &str) -> Result<String, TokenError> {
        let account_id = derive_account_id(response, domain);
        let stored_domain = response.base_domain.as_deref().unwrap_or(domain);
        let expires_at = expires_at_from_now(response.expires_in_or_default());

        database::token::upsert_token(
            self.db.pool(),
            &account_id,
            &response.access_token,
            &response.refresh_token,
            &expires_at,
            stored_domain,
        )
        .await?;

        info!("Stored Kommo token for account {}", account_id);
        Ok(account_id)
    }

    /// Usable token for an account, refreshing it first if expired.
    pub async fn active_token(&self, account_id: &str) -> Result<ActiveToken, TokenError> {
        let stored = match database::token::get_token(self.db.pool(), account_id).await {
            Ok(token) => token,
            Err(database::DatabaseError::NotFound { .. }) => {
                return Err(TokenError::UnknownAccount(account_id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        self.ensure_fresh(stored).await
    }

    /// Usable token for the oldest connected account.
    pub async fn first_active_token(&self) -> Result<ActiveToken, TokenError> {
        let stored = database::token::first_token(self.db.pool())
            .await?
            .ok_or(TokenError::NoAccount)?;

        self.ensure_fresh(stored).await
    }

    async fn ensure_fresh(&self, stored: KommoToken) -> Result<ActiveToken, TokenError> {
        if !is_expired(&stored.expires_at) {
            return Ok(ActiveToken {
                account_id: stored.account_id,
                domain: stored.domain,
                access_token: stored.access_token,
            });
        }

        info!("Token for account {} expired, refreshing", stored.account_id);
        let refreshed = self
            .kommo
            .refresh(&stored.domain, &stored.refresh_token)
            .await
            .map_err(|e| {
                warn!("Refresh for account {} failed: {}", stored.account_id, e);
                TokenError::Refresh(e)
            })?;

        let expires_at = expires_at_from_now(refreshed.expires_in_or_default());
        database::token::upsert_token(
            self.db.pool(),
            &stored.account_id,
            &refreshed.access_token,
            &refreshed.refresh_token,
            &expires_at,
            &stored.domain,
        )
        .await?;

        Ok(ActiveToken {
            account_id: stored.account_id,
            domain: stored.domain,
            access_token: refreshed.access_token,
        })
    }
}

/// Whether a stored expiry timestamp is in the past.
///
/// Timestamps that fail to parse count as expired, which forces a
/// refresh rather than trusting a corrupt row.
pub fn is_expired(expires_at: &str) -> bool {
    match DateTime::parse_from_rfc3339(expires_at) {
        Ok(at) => at <= Utc::now(),
        Err(_) => true,
    }
}

fn expires_at_from_now(expires_in: i64) -> String {
    (Utc::now() + Duration::seconds(expires_in)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn future_timestamp_is_not_expired() {
        let at = (Utc::now() + Duration::hours(1)).to_rfc3339();
        assert!(!is_expired(&at));
    }

    #[test]
    fn past_and_malformed_timestamps_are_expired() {
        let at = (Utc::now() - Duration::hours(1)).to_rfc3339();
        assert!(is_expired(&at));
        assert!(is_expired("soon"));
        assert!(is_expired(""));
    }

    #[test]
    fn expiry_is_computed_from_now() {
        let at = expires_at_from_now(86_400);
        let parsed = DateTime::parse_from_rfc3339(&at).unwrap();
        let lifetime = parsed.with_timezone(&Utc) - Utc::now();
        assert!(lifetime > Duration::hours(23));
        assert!(lifetime <= Duration::hours(24));
    }
}
