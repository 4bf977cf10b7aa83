//! Account identity derivation for OAuth responses.
//!
//! Kommo does not echo the account ID in the token response, so it has
//! to be recovered from the access token itself or from domain hints.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

use crate::types::TokenResponse;

/// The claims we read out of a Kommo access token.
#[derive(Debug, Deserialize)]
struct AccessTokenClaims {
    #[serde(default)]
    account_id: Option<serde_json::Value>,
}

/// Derive a stable account identifier for a token response.
///
/// Tried in order: the `account_id` claim of the access token JWT, the
/// first label of the response's `base_domain`, the first label of the
/// supplied domain (unless it is the vendor apex), and finally a random
/// `unknown_` identifier. Decode failures fall through silently.
pub fn derive_account_id(response: &TokenResponse, domain: &str) -> String {
    if let Some(id) = account_id_from_jwt(&response.access_token) {
        return id;
    }

    if let Some(label) = response.base_domain.as_deref().and_then(first_label) {
        return label.to_string();
    }

    let host = domain
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    if host != "kommo.com" && host != "www.kommo.com" {
        if let Some(label) = first_label(host) {
            return label.to_string();
        }
    }

    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("unknown_{}", &id[..8])
}

/// Pull the `account_id` claim out of a JWT without verifying it.
fn account_id_from_jwt(token: &str) -> Option<String> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: AccessTokenClaims = serde_json::from_slice(&bytes).ok()?;

    match claims.account_id? {
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}

fn first_label(domain: &str) -> Option<&str> {
    domain.split('.').next().filter(|label| !label.is_empty())
}
