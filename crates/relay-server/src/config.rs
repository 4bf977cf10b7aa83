//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Relay server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Kommo OAuth client id.
    pub kommo_client_id: String,
    /// Kommo OAuth client secret.
    pub kommo_client_secret: String,
    /// Kommo OAuth redirect URI.
    pub kommo_redirect_uri: String,
    /// Graph API access token. Ad enrichment is disabled when unset.
    pub fb_access_token: Option<String>,
    /// Make webhook URL. Forwarding is disabled when unset.
    pub make_webhook_url: Option<String>,
    /// Hours to shift provider UTC timestamps into local time.
    pub tz_offset_hours: i64,
    /// Directory for uploaded files.
    pub upload_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `RELAY_ADDR` | Server bind address | `127.0.0.1:8900` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:relay.db?mode=rwc` |
    /// | `KOMMO_CLIENT_ID` | Kommo OAuth client id | (required) |
    /// | `KOMMO_CLIENT_SECRET` | Kommo OAuth client secret | (required) |
    /// | `KOMMO_REDIRECT_URI` | Kommo OAuth redirect URI | (required) |
    /// | `FB_ACCESS_TOKEN` | Graph API access token | (unset: enrichment off) |
    /// | `MAKE_WEBHOOK_URL` | Make webhook URL | (unset: forwarding off) |
    /// | `TZ_OFFSET_HOURS` | Local offset from UTC in hours | `-3` |
    /// | `UPLOAD_DIR` | Directory for uploaded files | OS temp dir |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("RELAY_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8900".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("SQLITE_PATH")
            .unwrap_or_else(|_| "sqlite:relay.db?mode=rwc".to_string());

        let kommo_client_id =
            env::var("KOMMO_CLIENT_ID").map_err(|_| ConfigError::MissingKommoClientId)?;

        let kommo_client_secret =
            env::var("KOMMO_CLIENT_SECRET").map_err(|_| ConfigError::MissingKommoClientSecret)?;

        let kommo_redirect_uri =
            env::var("KOMMO_REDIRECT_URI").map_err(|_| ConfigError::MissingKommoRedirectUri)?;

        let fb_access_token = env::var("FB_ACCESS_TOKEN").ok().filter(|v| !v.is_empty());

        let make_webhook_url = env::var("MAKE_WEBHOOK_URL").ok().filter(|v| !v.is_empty());

        let tz_offset_hours = env::var("TZ_OFFSET_HOURS")
            .unwrap_or_else(|_| "-3".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidTzOffset)?;

        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| env::temp_dir());

        Ok(Self {
            addr,
            database_url,
            kommo_client_id,
            kommo_client_secret,
            kommo_redirect_uri,
            fb_access_token,
            make_webhook_url,
            tz_offset_hours,
            upload_dir,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid RELAY_ADDR format")]
    InvalidAddr,

    #[error("KOMMO_CLIENT_ID environment variable is required")]
    MissingKommoClientId,

    #[error("KOMMO_CLIENT_SECRET environment variable is required")]
    MissingKommoClientSecret,

    #[error("KOMMO_REDIRECT_URI environment variable is required")]
    MissingKommoRedirectUri,

    #[error("Invalid TZ_OFFSET_HOURS value")]
    InvalidTzOffset,
}
