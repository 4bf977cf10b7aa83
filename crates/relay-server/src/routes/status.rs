//! Service status endpoint.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use tracing::warn;

use crate::clock;
use crate::state::AppState;

/// Service status with a live database check.
///
/// Always answers HTTP 200; a store that stops responding shows up as
/// `db_status: "disconnected"` so monitors can alert on the body.
pub async fn status(State(state): State<AppState>) -> Json<Value> {
    let db_status = match state.db.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            warn!("Database ping failed: {}", e);
            "disconnected"
        }
    };

    Json(json!({
        "status": "online",
        "service": "webhook",
        "db_status": db_status,
        "timestamp": clock::local_status_time(state.tz_offset_hours),
    }))
}
