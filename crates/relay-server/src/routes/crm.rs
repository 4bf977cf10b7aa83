//! Kommo OAuth flow and CRM queries.

use askama::Template;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::error::{RelayError, Result};
use crate::state::AppState;
use crate::tokens::{self, TokenError};

/// Domain used when an OAuth redirect carries no account hint.
const VENDOR_APEX: &str = "www.kommo.com";

/// Account connection page template.
#[derive(Template)]
#[template(path = "auth.html")]
pub struct AuthTemplate {
    pub consent_url: String,
}

/// Post-authorization confirmation page template.
#[derive(Template)]
#[template(path = "callback.html")]
pub struct CallbackTemplate {
    pub account_id: String,
    pub domain: String,
}

/// Connection page with the OAuth consent link.
pub async fn auth_page(State(state): State<AppState>) -> AuthTemplate {
    AuthTemplate {
        consent_url: state.kommo.config().consent_url(),
    }
}

/// Consent URL as JSON, for clients that render their own page.
pub async fn auth_url(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "success",
        "url": state.kommo.config().consent_url(),
        "message": "Open this URL to authorize the integration",
    }))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub referer: Option<String>,
}

/// OAuth redirect target: exchange the code and store the tokens.
///
/// The account domain comes from the `referer` query parameter when
/// Kommo appends one, then the `Referer` header, then the vendor apex.
pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
) -> Result<CallbackTemplate> {
    let code = query
        .code
        .as_deref()
        .filter(|code| !code.is_empty())
        .ok_or_else(|| RelayError::BadRequest("Missing authorization code".to_string()))?;

    let domain = query
        .referer
        .clone()
        .filter(|referer| !referer.is_empty())
        .or_else(|| referer_host(&headers))
        .unwrap_or_else(|| VENDOR_APEX.to_string());

    let response = state.kommo.exchange_code(&domain, code).await?;
    let account_id = state.tokens.store(&response, &domain).await?;

    info!("Kommo account {} connected via callback", account_id);
    Ok(CallbackTemplate {
        account_id,
        domain,
    })
}

#[derive(Debug, Deserialize)]
pub struct ManualAuthQuery {
    pub code: Option<String>,
    pub domain: Option<String>,
}

/// Paste-a-code fallback for installs whose redirect URI cannot reach
/// this server. Always lands back on the dashboard with a flash.
pub async fn manual_auth(
    State(state): State<AppState>,
    Query(query): Query<ManualAuthQuery>,
) -> Redirect {
    let Some(code) = query.code.as_deref().filter(|code| !code.is_empty()) else {
        return flash_redirect("Authorization code is required");
    };
    let domain = query
        .domain
        .clone()
        .filter(|domain| !domain.is_empty())
        .unwrap_or_else(|| VENDOR_APEX.to_string());

    let response = match state.kommo.exchange_code(&domain, code).await {
        Ok(response) => response,
        Err(e) => {
            warn!("Manual code exchange failed: {}", e);
            return flash_redirect("Code exchange failed, check the code and domain");
        }
    };

    match state.tokens.store(&response, &domain).await {
        Ok(account_id) => {
            info!("Kommo account {} connected manually", account_id);
            flash_redirect(&format!("Kommo account {account_id} connected"))
        }
        Err(e) => {
            error!("Failed to store tokens: {}", e);
            flash_redirect("Authorization succeeded but storing the tokens failed")
        }
    }
}

/// Stored token summary. Token material itself is never echoed.
pub async fn token_info(State(state): State<AppState>) -> Result<Json<Value>> {
    let stored = database::token::list_tokens(state.db.pool()).await?;

    let summaries: Vec<Value> = stored
        .iter()
        .map(|token| {
            json!({
                "account_id": token.account_id,
                "domain": token.domain,
                "expires_at": token.expires_at,
                "is_expired": tokens::is_expired(&token.expires_at),
                "created_at": token.created_at,
                "updated_at": token.updated_at,
            })
        })
        .collect();

    Ok(Json(json!({
        "status": "success",
        "token_count": summaries.len(),
        "tokens": summaries,
    })))
}

#[derive(Debug, Deserialize)]
pub struct RevokeQuery {
    pub account_id: Option<String>,
}

/// Drop a stored account. Lands back on the dashboard with a flash.
pub async fn revoke_token(
    State(state): State<AppState>,
    Query(query): Query<RevokeQuery>,
) -> Redirect {
    let Some(account_id) = query.account_id.as_deref().filter(|id| !id.is_empty()) else {
        return flash_redirect("account_id is required");
    };

    match database::token::delete_token(state.db.pool(), account_id).await {
        Ok(()) => {
            info!("Removed Kommo token for account {}", account_id);
            flash_redirect(&format!("Token for account {account_id} removed"))
        }
        Err(database::DatabaseError::NotFound { .. }) => {
            flash_redirect(&format!("No token stored for account {account_id}"))
        }
        Err(e) => {
            error!("Failed to delete token for {}: {}", account_id, e);
            flash_redirect("Failed to remove the token")
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub phone: Option<String>,
}

/// Search CRM leads by phone across format permutations.
pub async fn search_lead(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let Some(phone) = query.phone.as_deref().filter(|phone| !phone.is_empty()) else {
        return soft_error(StatusCode::BAD_REQUEST, "phone parameter is required");
    };

    let token = match state.tokens.first_active_token().await {
        Ok(token) => token,
        Err(e) => return token_failure(e),
    };

    match state
        .kommo
        .search_lead_by_phone(&token.domain, &token.access_token, phone)
        .await
    {
        Ok(search) => {
            let message = if search.leads.is_empty() {
                "No leads found for this number".to_string()
            } else {
                format!("Found {} lead(s)", search.leads.len())
            };
            Json(json!({
                "status": "success",
                "message": message,
                "query": search.matched_query,
                "leads": search.leads,
            }))
            .into_response()
        }
        Err(e) => {
            warn!("Lead search for {} failed: {}", phone, e);
            soft_error(StatusCode::BAD_GATEWAY, &format!("Lead search failed: {e}"))
        }
    }
}

/// Pipeline and stage names keyed by their ids.
pub async fn pipelines(State(state): State<AppState>) -> Response {
    let token = match state.tokens.first_active_token().await {
        Ok(token) => token,
        Err(e) => return token_failure(e),
    };

    match state
        .kommo
        .get_pipelines(&token.domain, &token.access_token)
        .await
    {
        Ok(map) => Json(json!({ "status": "success", "pipelines": map })).into_response(),
        Err(e) => {
            warn!("Pipeline fetch failed: {}", e);
            soft_error(
                StatusCode::BAD_GATEWAY,
                &format!("Pipeline fetch failed: {e}"),
            )
        }
    }
}

/// Host of the Referer header, when one is present and parseable.
fn referer_host(headers: &HeaderMap) -> Option<String> {
    let referer = headers.get(header::REFERER)?.to_str().ok()?;
    let url = url::Url::parse(referer).ok()?;
    url.host_str().map(str::to_string)
}

fn flash_redirect(message: &str) -> Redirect {
    Redirect::to(&format!("/dashboard?flash={}", urlencoding::encode(message)))
}

fn soft_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({ "status": "error", "message": message })),
    )
        .into_response()
}

/// Missing or unrefreshable tokens answer 401; storage failures stay 500.
fn token_failure(err: TokenError) -> Response {
    match err {
        TokenError::Database(e) => RelayError::Database(e).into_response(),
        other => {
            warn!("No usable Kommo token: {}", other);
            soft_error(StatusCode::UNAUTHORIZED, &other.to_string())
        }
    }
}
