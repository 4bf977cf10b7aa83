//! Evolution API webhook intake.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use tracing::warn;

use crate::ingest;
use crate::state::AppState;

/// Receive an Evolution webhook event.
///
/// Processing runs inline and its failures only log. The provider
/// always gets a success ack, even for bodies we cannot parse,
/// otherwise it retries events we already decided to skip.
pub async fn evolution_webhook(State(state): State<AppState>, body: String) -> Json<Value> {
    match serde_json::from_str::<evolution::WebhookEvent>(&body) {
        Ok(event) => ingest::process_event(&state, &event).await,
        Err(e) => warn!("Discarding unparseable webhook body: {}", e),
    }

    Json(json!({
        "status": "success",
        "message": "webhook processed",
    }))
}
