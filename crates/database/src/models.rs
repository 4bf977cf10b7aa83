//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A persisted inbound WhatsApp message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Message {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Sender phone number (digits before the `@` in the JID).
    pub phone: String,
    /// Sender display name.
    pub name: String,
    /// Originating device/source label (e.g. "android", "web").
    pub device: String,
    /// Message text.
    pub message: String,
    /// Ad source identifier, when the message came from an ad click.
    pub source_id: Option<String>,
    /// Ad title.
    pub title: Option<String>,
    /// Ad URL.
    pub url: Option<String>,
    /// Whether the message was forwarded downstream.
    pub forwarded: bool,
    /// Provider-supplied timestamp string, normalized at ingest.
    pub date_time: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
    /// Ad name from the ads API.
    pub ad_name: Option<String>,
    /// Adset name from the ads API.
    pub adset_name: Option<String>,
    /// Adset ID from the ads API.
    pub adset_id: Option<String>,
    /// Campaign name from the ads API.
    pub campaign_name: Option<String>,
    /// Campaign ID from the ads API.
    pub campaign_id: Option<String>,
}

/// Fields for inserting a new message row.
#[derive(Debug, Clone, Default)]
pub struct NewMessage {
    pub phone: String,
    pub name: String,
    pub device: String,
    pub message: String,
    pub source_id: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub forwarded: bool,
    pub date_time: Option<String>,
    pub ad_name: Option<String>,
    pub adset_name: Option<String>,
    pub adset_id: Option<String>,
    pub campaign_name: Option<String>,
    pub campaign_id: Option<String>,
}

/// Stored OAuth credentials for one Kommo account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct KommoToken {
    /// Auto-incrementing ID.
    pub id: i64,
    /// CRM tenant identifier; natural key, one row per account.
    pub account_id: String,
    /// Current access token.
    pub access_token: String,
    /// Refresh token for the next renewal.
    pub refresh_token: String,
    /// Expiry instant, RFC 3339 UTC.
    pub expires_at: String,
    /// Account domain the tokens were issued for.
    pub domain: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// An observed lead state transition or message attribution event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LeadTrackingEvent {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Soft link to the message that triggered the event, if any.
    pub message_id: Option<i64>,
    /// CRM lead identifier.
    pub lead_id: String,
    /// Lead phone number, when known.
    pub phone: Option<String>,
    /// Event label, e.g. "message_received" or "status_changed".
    pub event_type: String,
    /// Ad source identifier, when attributable.
    pub source_id: Option<String>,
    pub previous_pipeline_id: Option<String>,
    pub previous_pipeline_name: Option<String>,
    pub previous_status_id: Option<String>,
    pub previous_status_name: Option<String>,
    pub current_pipeline_id: Option<String>,
    pub current_pipeline_name: Option<String>,
    pub current_status_id: Option<String>,
    pub current_status_name: Option<String>,
    /// When the event occurred.
    pub event_time: String,
    /// Creation timestamp.
    pub created_at: String,
    /// "Lead situation" custom-field value from the CRM.
    pub lead_situation: Option<String>,
}

/// Fields for inserting a new lead tracking event.
#[derive(Debug, Clone, Default)]
pub struct NewLeadTrackingEvent {
    pub message_id: Option<i64>,
    pub lead_id: String,
    pub phone: Option<String>,
    pub event_type: String,
    pub source_id: Option<String>,
    pub previous_pipeline_id: Option<String>,
    pub previous_pipeline_name: Option<String>,
    pub previous_status_id: Option<String>,
    pub previous_status_name: Option<String>,
    pub current_pipeline_id: Option<String>,
    pub current_pipeline_name: Option<String>,
    pub current_status_id: Option<String>,
    pub current_status_name: Option<String>,
    pub lead_situation: Option<String>,
    pub event_time: String,
}
