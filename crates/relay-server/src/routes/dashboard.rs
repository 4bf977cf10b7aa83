//! Dashboard page.

use askama::Template;
use axum::extract::{Query, State};
use database::Message;
use serde::Deserialize;

use crate::error::Result;
use crate::state::AppState;
use crate::tokens;

const RECENT_MESSAGES: i64 = 20;

/// Dashboard page template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub flash: Option<String>,
    pub consent_url: String,
    pub accounts: Vec<AccountSummary>,
    pub messages: Vec<Message>,
}

/// One connected account in the dashboard table.
pub struct AccountSummary {
    pub account_id: String,
    pub domain: String,
    pub expires_at: String,
    pub is_expired: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// One-shot notice from a redirecting action.
    pub flash: Option<String>,
}

/// Render the dashboard page.
pub async fn dashboard_page(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<DashboardTemplate> {
    let pool = state.db.pool();

    let stored = database::token::list_tokens(pool).await?;
    let messages = database::message::list_messages(pool, RECENT_MESSAGES).await?;

    let accounts = stored
        .into_iter()
        .map(|token| AccountSummary {
            is_expired: tokens::is_expired(&token.expires_at),
            account_id: token.account_id,
            domain: token.domain,
            expires_at: token.expires_at,
        })
        .collect();

    Ok(DashboardTemplate {
        flash: query.flash,
        consent_url: state.kommo.config().consent_url(),
        accounts,
        messages,
    })
}
