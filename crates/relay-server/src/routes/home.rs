//! Service banner endpoint.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct Banner {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Service banner with the running version.
pub async fn index() -> Json<Banner> {
    Json(Banner {
        status: "online",
        service: "whatsapp-kommo-relay",
        version: env!("CARGO_PKG_VERSION"),
    })
}
