//! Webhook envelope types from the Evolution API.

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// A webhook event delivered by the Evolution API.
///
/// Top-level keys arrive snake_cased; everything under `data` is camelCased.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event name (e.g., "messages.upsert").
    #[serde(default)]
    pub event: String,

    /// Instance name the event came from.
    #[serde(default)]
    pub instance: String,

    /// Delivery timestamp as sent by the provider.
    #[serde(default)]
    pub date_time: Option<String>,

    /// Event payload.
    #[serde(default)]
    pub data: EventData,
}

/// The message payload of an event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    /// Message routing key.
    #[serde(default)]
    pub key: MessageKey,

    /// Sender display name.
    #[serde(default)]
    pub push_name: Option<String>,

    /// Originating device/source label (e.g., "android", "web").
    #[serde(default)]
    pub source: Option<String>,

    /// Message content.
    #[serde(default)]
    pub message: Option<MessageContent>,

    /// Context info, when the provider hoists it out of the message.
    #[serde(default)]
    pub context_info: Option<ContextInfo>,
}

/// Identifies a message and the chat it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageKey {
    /// Chat JID (e.g., "5511999998888@s.whatsapp.net").
    #[serde(default)]
    pub remote_jid: String,

    /// Whether the message was sent by the connected account.
    /// Absent means unknown, which is treated as outbound.
    #[serde(default = "default_true")]
    pub from_me: bool,

    /// Provider message ID.
    #[serde(default)]
    pub id: String,
}

impl Default for MessageKey {
    fn default() -> Self {
        Self {
            remote_jid: String::new(),
            from_me: true,
            id: String::new(),
        }
    }
}

/// Message content variants.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContent {
    /// Plain text message.
    #[serde(default)]
    pub conversation: Option<String>,

    /// Extended text message (link previews, ad replies).
    #[serde(default)]
    pub extended_text_message: Option<ExtendedTextMessage>,

    /// Context info attached directly to the message.
    #[serde(default)]
    pub context_info: Option<ContextInfo>,
}

/// An extended text message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedTextMessage {
    /// The text content.
    #[serde(default)]
    pub text: Option<String>,

    /// Context info, including ad attribution.
    #[serde(default)]
    pub context_info: Option<ContextInfo>,
}

/// Context attached to a message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextInfo {
    /// Ad attribution, present when the message came from an ad click.
    #[serde(default)]
    pub external_ad_reply: Option<ExternalAdReply>,
}

/// Ad attribution data for a click-to-WhatsApp message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalAdReply {
    /// Ad identifier in the ads platform.
    #[serde(default)]
    pub source_id: Option<String>,

    /// Ad title.
    #[serde(default)]
    pub title: Option<String>,

    /// Ad body text.
    #[serde(default)]
    pub body: Option<String>,

    /// Landing URL of the ad.
    #[serde(default)]
    pub source_url: Option<String>,

    /// Canonical URL, when the provider resolves one.
    #[serde(default)]
    pub canonical_url: Option<String>,

    /// Matched text of the link preview.
    #[serde(default)]
    pub matched_text: Option<String>,

    /// Media URL of the ad creative.
    #[serde(default)]
    pub media_url: Option<String>,
}
