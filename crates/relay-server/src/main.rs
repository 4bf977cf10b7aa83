//! Relay server binary.

use database::Database;
use graph_ads::AdsClient;
use kommo::{KommoClient, KommoConfig};
use tracing::info;

use relay_server::config::Config;
use relay_server::forward::Forwarder;
use relay_server::routes;
use relay_server::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting relay server");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    // Kommo client with the integration credentials
    let kommo = KommoClient::new(KommoConfig::new(
        &config.kommo_client_id,
        &config.kommo_client_secret,
        &config.kommo_redirect_uri,
    ))?;

    // Optional integrations
    let ads = match &config.fb_access_token {
        Some(token) => Some(AdsClient::new(token.clone())?),
        None => {
            info!("FB_ACCESS_TOKEN not set, ad enrichment disabled");
            None
        }
    };
    let forwarder = match &config.make_webhook_url {
        Some(url) => Some(Forwarder::new(url.clone())?),
        None => {
            info!("MAKE_WEBHOOK_URL not set, forwarding disabled");
            None
        }
    };

    std::fs::create_dir_all(&config.upload_dir)?;

    // Build application state
    let state = AppState::new(&config, db, kommo, ads, forwarder);

    // Build router
    let app = routes::router().with_state(state);

    // Start server
    info!(addr = %config.addr, "Relay server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
