//! Kommo CRM webhook intake.

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::NewLeadTrackingEvent;
use kommo::webhook::{self, StatusChange, WebhookAccount, WebhookEvent as CrmEvent, WebhookFields};
use kommo::{Lead, PipelineMap};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::clock;
use crate::error::{RelayError, Result};
use crate::state::AppState;
use crate::tokens::{ActiveToken, TokenError};

const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Receive a Kommo webhook.
///
/// Kommo delivers the same payload as bracketed form fields, JSON or
/// multipart depending on the integration setup; all three land in one
/// flattened field map. Every recognized outcome acks with HTTP 200 so
/// Kommo does not disable the hook over transient CRM-side failures.
pub async fn kommo_webhook(State(state): State<AppState>, request: Request) -> Result<Response> {
    let fields = read_fields(request).await?;

    let account = webhook::parse_account(&fields);
    match webhook::classify(&fields) {
        CrmEvent::StatusChanged(change) => handle_status_change(&state, &account, &change).await,
        CrmEvent::LeadAdded { lead_id } => {
            info!(
                "CRM lead {} added in account {}",
                lead_id,
                account.account_id.as_deref().unwrap_or("unknown")
            );
            Ok(ack("success"))
        }
        CrmEvent::ContactAdded { contact_id } => {
            info!(
                "CRM contact {} added in account {}",
                contact_id,
                account.account_id.as_deref().unwrap_or("unknown")
            );
            Ok(ack("success"))
        }
        CrmEvent::Unknown => {
            debug!("Unrecognized CRM webhook with {} field(s)", fields.len());
            Ok(ack("ignored"))
        }
    }
}

/// Read the webhook body into one bracketed-key field map, whatever the
/// content type.
async fn read_fields(request: Request) -> Result<WebhookFields> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| RelayError::BadRequest(format!("Unreadable multipart body: {e}")))?;

        let mut fields = WebhookFields::new();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| RelayError::BadRequest(format!("Unreadable multipart body: {e}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if let Ok(value) = field.text().await {
                fields.insert(name, value);
            }
        }
        return Ok(fields);
    }

    let body = axum::body::to_bytes(request.into_body(), BODY_LIMIT)
        .await
        .map_err(|e| RelayError::BadRequest(format!("Could not read request body: {e}")))?;

    if content_type.starts_with("application/json") {
        let value: Value = serde_json::from_slice(&body)
            .map_err(|e| RelayError::BadRequest(format!("Invalid JSON body: {e}")))?;
        return Ok(webhook::flatten_json(&value));
    }

    // Kommo's default rendition: bracketed form encoding
    Ok(url::form_urlencoded::parse(&body).into_owned().collect())
}

async fn handle_status_change(
    state: &AppState,
    account: &WebhookAccount,
    change: &StatusChange,
) -> Result<Response> {
    info!(
        "Lead {} moved {:?} -> {:?}",
        change.lead_id, change.old_status_id, change.new_status_id
    );

    let Some(account_id) = account.account_id.as_deref() else {
        error!("Status-change webhook without an account id, cannot pick a token");
        return Ok(ack("error"));
    };

    let token = match state.tokens.active_token(account_id).await {
        Ok(token) => token,
        Err(TokenError::Database(e)) => return Err(e.into()),
        Err(e) => {
            warn!("No usable token for account {}: {}", account_id, e);
            return Ok(ack("error"));
        }
    };

    let lead = match state
        .kommo
        .get_lead(&token.domain, &token.access_token, &change.lead_id)
        .await
    {
        Ok(lead) => Some(lead),
        Err(e) => {
            warn!("Fetching lead {} failed: {}", change.lead_id, e);
            None
        }
    };

    let phone = match &lead {
        Some(lead) => contact_phone(state, &token, lead).await,
        None => None,
    };
    let Some(phone) = phone else {
        warn!(
            "Lead {} has no contact phone, skipping tracking",
            change.lead_id
        );
        return Ok(ack("success"));
    };

    let pipelines = match state
        .kommo
        .get_pipelines(&token.domain, &token.access_token)
        .await
    {
        Ok(map) => map,
        Err(e) => {
            warn!("Pipeline fetch failed, using placeholder names: {}", e);
            PipelineMap::default()
        }
    };

    let event = tracking_event(state, change, phone, &pipelines, lead.as_ref());
    database::lead_tracking::insert_event(state.db.pool(), &event).await?;

    info!("Recorded status change for lead {}", change.lead_id);
    Ok(ack("success"))
}

/// Phone of the lead's first linked contact, when it has one.
async fn contact_phone(state: &AppState, token: &ActiveToken, lead: &Lead) -> Option<String> {
    let contact_id = lead.first_contact_id()?;
    match state
        .kommo
        .get_contact(&token.domain, &token.access_token, contact_id)
        .await
    {
        Ok(contact) => contact.phone(),
        Err(e) => {
            warn!("Fetching contact {} failed: {}", contact_id, e);
            None
        }
    }
}

fn tracking_event(
    state: &AppState,
    change: &StatusChange,
    phone: String,
    pipelines: &PipelineMap,
    lead: Option<&Lead>,
) -> NewLeadTrackingEvent {
    let old_pipeline = change.old_pipeline_id.as_deref();
    let new_pipeline = change.new_pipeline_id.as_deref();

    NewLeadTrackingEvent {
        message_id: None,
        lead_id: change.lead_id.clone(),
        phone: Some(phone),
        event_type: "status_changed".to_string(),
        source_id: None,
        previous_pipeline_id: change.old_pipeline_id.clone(),
        previous_pipeline_name: old_pipeline.map(|id| pipelines.pipeline_name(id)),
        previous_status_id: change.old_status_id.clone(),
        previous_status_name: change
            .old_status_id
            .as_deref()
            .map(|id| pipelines.status_name(old_pipeline.unwrap_or(""), id)),
        current_pipeline_id: change.new_pipeline_id.clone(),
        current_pipeline_name: new_pipeline.map(|id| pipelines.pipeline_name(id)),
        current_status_id: change.new_status_id.clone(),
        current_status_name: change
            .new_status_id
            .as_deref()
            .map(|id| pipelines.status_name(new_pipeline.unwrap_or(""), id)),
        lead_situation: lead.and_then(|l| l.situation()),
        event_time: clock::local_event_time(state.tz_offset_hours),
    }
}

fn ack(status: &str) -> Response {
    Json(json!({ "status": status })).into_response()
}
