//! Relay between Evolution API webhooks, Make and Kommo CRM.
//!
//! Receives WhatsApp messages, enriches ad-attributed ones via the Graph
//! API, forwards them to Make and records lead activity from Kommo.

pub mod clock;
pub mod config;
pub mod error;
pub mod forward;
pub mod ingest;
pub mod routes;
pub mod state;
pub mod tokens;
