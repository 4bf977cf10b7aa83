//! Pulls the relay-relevant fields out of a webhook event.

use crate::envelope::{ContextInfo, EventData, ExternalAdReply, WebhookEvent};

/// The fields of an inbound message the relay cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMessage {
    /// Sender phone, digits taken from the chat JID.
    pub phone: String,
    /// Sender display name.
    pub name: String,
    /// Originating device/source label.
    pub device: String,
    /// Message text.
    pub text: String,
    /// Whether the message was sent by the connected account.
    pub from_me: bool,
    /// Ad identifier, when the message came from an ad click.
    pub source_id: Option<String>,
    /// Ad title.
    pub title: Option<String>,
    /// Ad landing URL.
    pub url: Option<String>,
    /// Provider-supplied timestamp, untouched.
    pub date_time: Option<String>,
}

impl ExtractedMessage {
    /// Whether this message is an inbound ad lead worth persisting:
    /// not sent by us, and attributable to an ad click.
    pub fn is_ad_lead(&self) -> bool {
        !self.from_me && self.source_id.is_some()
    }
}

/// Extract message fields from a webhook event.
///
/// Missing sender fields fall back to `"unknown"`; ad fields are `None`
/// when the event carries no usable ad attribution.
pub fn extract_message(event: &WebhookEvent) -> ExtractedMessage {
    let data = &event.data;

    let ad = context_info(event).and_then(|ci| ci.external_ad_reply.as_ref());

    ExtractedMessage {
        phone: phone_from_jid(&data.key.remote_jid),
        name: non_empty(data.push_name.as_deref())
            .unwrap_or("unknown")
            .to_string(),
        device: non_empty(data.source.as_deref())
            .unwrap_or("unknown")
            .to_string(),
        text: message_text(data).unwrap_or_default(),
        from_me: data.key.from_me,
        source_id: ad
            .and_then(|a| non_empty(a.source_id.as_deref()))
            .map(str::to_string),
        title: ad
            .and_then(|a| non_empty(a.title.as_deref()))
            .map(str::to_string),
        url: ad.and_then(ad_url),
        date_time: event.date_time.clone(),
    }
}

/// Digits of the JID user part, or `"unknown"` when there are none.
fn phone_from_jid(jid: &str) -> String {
    let user = jid.split_once('@').map_or(jid, |(user, _)| user);
    let digits: String = user.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        "unknown".to_string()
    } else {
        digits
    }
}

/// Find ad context, checking the locations the provider uses.
///
/// Order: `message.extendedTextMessage.contextInfo`, then
/// `message.contextInfo`, then `data.contextInfo`. A context without an
/// ad reply does not shadow a later one that has it.
fn context_info(event: &WebhookEvent) -> Option<&ContextInfo> {
    let message = event.data.message.as_ref();
    let candidates = [
        message
            .and_then(|m| m.extended_text_message.as_ref())
            .and_then(|e| e.context_info.as_ref()),
        message.and_then(|m| m.context_info.as_ref()),
        event.data.context_info.as_ref(),
    ];

    candidates
        .into_iter()
        .flatten()
        .find(|ci| ci.external_ad_reply.is_some())
}

fn message_text(data: &EventData) -> Option<String> {
    let message = data.message.as_ref()?;
    non_empty(message.conversation.as_deref())
        .or_else(|| {
            message
                .extended_text_message
                .as_ref()
                .and_then(|e| non_empty(e.text.as_deref()))
        })
        .map(str::to_string)
}

/// First usable URL out of the ad reply.
fn ad_url(ad: &ExternalAdReply) -> Option<String> {
    [
        &ad.source_url,
        &ad.canonical_url,
        &ad.matched_text,
        &ad.media_url,
    ]
    .into_iter()
    .find_map(|u| non_empty(u.as_deref()))
    .map(str::to_string)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ad_event() -> WebhookEvent {
        serde_json::from_value(json!({
            "event": "messages.upsert",
            "instance": "main",
            "date_time": "2024-06-01T13:00:00.000Z",
            "data": {
                "key": {
                    "remoteJid": "5511999998888@s.whatsapp.net",
                    "fromMe": false,
                    "id": "3EB0A"
                },
                "pushName": "Maria Silva",
                "source": "android",
                "message": {
                    "extendedTextMessage": {
                        "text": "Olá, vi o anúncio de vocês",
                        "contextInfo": {
                            "externalAdReply": {
                                "sourceId": "120210000000000001",
                                "title": "Promoção de Junho",
                                "sourceUrl": "https://fb.me/abc123"
                            }
                        }
                    }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn extracts_ad_lead_fields() {
        let extracted = extract_message(&ad_event());

        assert!(extracted.is_ad_lead());
        assert_eq!(extracted.phone, "5511999998888");
        assert_eq!(extracted.name, "Maria Silva");
        assert_eq!(extracted.device, "android");
        assert_eq!(extracted.text, "Olá, vi o anúncio de vocês");
        assert_eq!(extracted.source_id.as_deref(), Some("120210000000000001"));
        assert_eq!(extracted.title.as_deref(), Some("Promoção de Junho"));
        assert_eq!(extracted.url.as_deref(), Some("https://fb.me/abc123"));
        assert_eq!(
            extracted.date_time.as_deref(),
            Some("2024-06-01T13:00:00.000Z")
        );
    }

    #[test]
    fn own_messages_are_not_ad_leads() {
        let mut event = ad_event();
        event.data.key.from_me = true;

        let extracted = extract_message(&event);
        assert!(!extracted.is_ad_lead());
    }

    #[test]
    fn missing_from_me_counts_as_outbound() {
        let event: WebhookEvent = serde_json::from_value(json!({
            "data": {
                "key": { "remoteJid": "5511999998888@s.whatsapp.net" },
                "message": {
                    "contextInfo": {
                        "externalAdReply": { "sourceId": "120210000000000001" }
                    }
                }
            }
        }))
        .unwrap();

        let extracted = extract_message(&event);
        assert!(extracted.from_me);
        assert!(!extracted.is_ad_lead());
    }

    #[test]
    fn empty_source_id_is_not_an_ad_lead() {
        let event: WebhookEvent = serde_json::from_value(json!({
            "data": {
                "key": { "remoteJid": "5511999998888@s.whatsapp.net", "fromMe": false },
                "message": {
                    "conversation": "oi",
                    "contextInfo": {
                        "externalAdReply": { "sourceId": "", "title": "x" }
                    }
                }
            }
        }))
        .unwrap();

        let extracted = extract_message(&event);
        assert_eq!(extracted.source_id, None);
        assert!(!extracted.is_ad_lead());
    }

    #[test]
    fn plain_message_is_not_an_ad_lead() {
        let event: WebhookEvent = serde_json::from_value(json!({
            "data": {
                "key": { "remoteJid": "5511999998888@s.whatsapp.net", "fromMe": false },
                "pushName": "Maria",
                "message": { "conversation": "bom dia" }
            }
        }))
        .unwrap();

        let extracted = extract_message(&event);
        assert!(!extracted.is_ad_lead());
        assert_eq!(extracted.text, "bom dia");
    }

    #[test]
    fn extended_text_context_wins_over_data_context() {
        let event: WebhookEvent = serde_json::from_value(json!({
            "data": {
                "key": { "remoteJid": "5511999998888@s.whatsapp.net", "fromMe": false },
                "message": {
                    "extendedTextMessage": {
                        "text": "oi",
                        "contextInfo": {
                            "externalAdReply": { "sourceId": "inner" }
                        }
                    }
                },
                "contextInfo": {
                    "externalAdReply": { "sourceId": "outer" }
                }
            }
        }))
        .unwrap();

        let extracted = extract_message(&event);
        assert_eq!(extracted.source_id.as_deref(), Some("inner"));
    }

    #[test]
    fn empty_context_does_not_shadow_later_one() {
        let event: WebhookEvent = serde_json::from_value(json!({
            "data": {
                "key": { "remoteJid": "5511999998888@s.whatsapp.net", "fromMe": false },
                "message": {
                    "extendedTextMessage": {
                        "text": "oi",
                        "contextInfo": {}
                    }
                },
                "contextInfo": {
                    "externalAdReply": { "sourceId": "outer" }
                }
            }
        }))
        .unwrap();

        let extracted = extract_message(&event);
        assert_eq!(extracted.source_id.as_deref(), Some("outer"));
    }

    #[test]
    fn url_falls_back_to_canonical() {
        let event: WebhookEvent = serde_json::from_value(json!({
            "data": {
                "key": { "remoteJid": "5511999998888@s.whatsapp.net", "fromMe": false },
                "message": {
                    "contextInfo": {
                        "externalAdReply": {
                            "sourceId": "120210000000000001",
                            "canonicalUrl": "https://example.com/landing"
                        }
                    }
                }
            }
        }))
        .unwrap();

        let extracted = extract_message(&event);
        assert_eq!(extracted.url.as_deref(), Some("https://example.com/landing"));
    }

    #[test]
    fn missing_sender_fields_fall_back_to_unknown() {
        let event: WebhookEvent = serde_json::from_value(json!({
            "data": {
                "key": { "fromMe": false },
                "message": { "conversation": "oi" }
            }
        }))
        .unwrap();

        let extracted = extract_message(&event);
        assert_eq!(extracted.phone, "unknown");
        assert_eq!(extracted.name, "unknown");
        assert_eq!(extracted.device, "unknown");
    }

    #[test]
    fn conversation_takes_precedence_over_extended_text() {
        let event: WebhookEvent = serde_json::from_value(json!({
            "data": {
                "key": { "remoteJid": "5511999998888@s.whatsapp.net", "fromMe": false },
                "message": {
                    "conversation": "texto simples",
                    "extendedTextMessage": { "text": "texto estendido" }
                }
            }
        }))
        .unwrap();

        let extracted = extract_message(&event);
        assert_eq!(extracted.text, "texto simples");
    }
}
