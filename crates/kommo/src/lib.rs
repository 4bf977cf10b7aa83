//! Kommo CRM client library.
//!
//! This crate talks to the Kommo API v4 on behalf of the relay. It covers:
//!
//! - OAuth code exchange and token refresh, with account-id derivation
//! - Lead search by phone number across format permutations
//! - Lead, contact, and pipeline fetches
//! - Parsing the webhooks Kommo posts back to us
//!
//! # Example
//!
//! ```no_run
//! use kommo::{KommoClient, KommoConfig};
//!
//! # async fn example() -> kommo::Result<()> {
//! let config = KommoConfig::new("client-id", "client-secret", "https://relay.example.com/kommo/callback");
//! let client = KommoClient::new(config)?;
//!
//! let tokens = client.exchange_code("acme.kommo.com", "def502000a...").await?;
//! let account_id = kommo::derive_account_id(&tokens, "acme.kommo.com");
//!
//! let search = client
//!     .search_lead_by_phone("acme.kommo.com", &tokens.access_token, "+55 11 98888-7777")
//!     .await?;
//! println!("{} lead(s) for account {}", search.leads.len(), account_id);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod oauth;
pub mod phone;
pub mod types;
pub mod webhook;

pub use client::KommoClient;
pub use config::{api_base_url, KommoConfig};
pub use error::{KommoError, Result};
pub use oauth::derive_account_id;
pub use phone::phone_permutations;
pub use types::*;
