//! Evolution API webhook types and message extraction.
//!
//! The Evolution API pushes WhatsApp events to an HTTP webhook. This crate
//! models the `messages.upsert` envelope and pulls out the fields the relay
//! cares about: sender identity, message text, and ad attribution for
//! click-to-WhatsApp leads.
//!
//! # Example
//!
//! ```
//! use evolution::{extract_message, WebhookEvent};
//!
//! let event: WebhookEvent = serde_json::from_str(r#"{
//!     "event": "messages.upsert",
//!     "data": {
//!         "key": {"remoteJid": "5511999998888@s.whatsapp.net", "fromMe": false},
//!         "pushName": "Maria",
//!         "message": {
//!             "extendedTextMessage": {
//!                 "text": "Olá!",
//!                 "contextInfo": {"externalAdReply": {"sourceId": "12021000000"}}
//!             }
//!         }
//!     }
//! }"#).unwrap();
//!
//! let extracted = extract_message(&event);
//! assert!(extracted.is_ad_lead());
//! assert_eq!(extracted.phone, "5511999998888");
//! ```

pub mod envelope;
pub mod extract;

pub use envelope::{
    ContextInfo, EventData, ExtendedTextMessage, ExternalAdReply, MessageContent, MessageKey,
    WebhookEvent,
};
pub use extract::{extract_message, ExtractedMessage};
