//! Route handlers for the relay server.

pub mod crm;
pub mod crm_webhook;
pub mod dashboard;
pub mod home;
pub mod lead_tracking;
pub mod messages;
pub mod status;
pub mod upload;
pub mod webhook;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Service banner and health
        .route("/", get(home::index))
        .route("/status", get(status::status))
        // HTML pages
        .route("/dashboard", get(dashboard::dashboard_page))
        .route("/kommo/auth", get(crm::auth_page))
        // Inbound webhooks
        .route("/webhook", post(webhook::evolution_webhook))
        .route("/kommo/webhook", post(crm_webhook::kommo_webhook))
        // Stored data
        .route("/messages", get(messages::list_messages))
        .route("/lead-tracking", get(lead_tracking::list_events))
        .route("/upload", post(upload::upload_file))
        // Kommo OAuth and API
        .route("/kommo/auth-url", get(crm::auth_url))
        .route("/kommo/callback", get(crm::oauth_callback))
        .route("/kommo/manual-auth", get(crm::manual_auth))
        .route("/kommo/token-info", get(crm::token_info))
        .route("/kommo/revoke-token", get(crm::revoke_token))
        .route("/kommo/search-lead", get(crm::search_lead))
        .route("/kommo/pipelines", get(crm::pipelines))
}
