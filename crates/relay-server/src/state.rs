//! Application state shared across handlers.

use std::path::PathBuf;

use database::Database;
use graph_ads::AdsClient;
use kommo::KommoClient;

use crate::config::Config;
use crate::forward::Forwarder;
use crate::tokens::TokenManager;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Kommo API client.
    pub kommo: KommoClient,
    /// Stored Kommo tokens with lazy refresh.
    pub tokens: TokenManager,
    /// Graph API client, present when ad enrichment is configured.
    pub ads: Option<AdsClient>,
    /// Make forwarder, present when forwarding is configured.
    pub forwarder: Option<Forwarder>,
    /// Hours to shift provider timestamps into local time.
    pub tz_offset_hours: i64,
    /// Directory for uploaded files.
    pub upload_dir: PathBuf,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        config: &Config,
        db: Database,
        kommo: KommoClient,
        ads: Option<AdsClient>,
        forwarder: Option<Forwarder>,
    ) -> Self {
        let tokens = TokenManager::new(db.clone(), kommo.clone());
        Self {
            db,
            kommo,
            tokens,
            ads,
            forwarder,
            tz_offset_hours: config.tz_offset_hours,
            upload_dir: config.upload_dir.clone(),
        }
    }
}
