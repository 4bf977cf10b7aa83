//! Lead tracking event queries.

use axum::extract::{Query, State};
use axum::Json;
use database::LeadTrackingEvent;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{RelayError, Result};
use crate::state::AppState;

const LIST_LIMIT: i64 = 100;

/// Accepted filters for the event list.
#[derive(Debug, Default, Deserialize)]
pub struct EventFilters {
    /// CRM lead ID. Takes precedence over `phone`.
    pub lead_id: Option<String>,
    /// Phone number; matched on digits, ignoring formatting.
    pub phone: Option<String>,
}

/// List lead tracking events, newest first.
pub async fn list_events(
    State(state): State<AppState>,
    Query(filters): Query<EventFilters>,
) -> Result<Json<Value>> {
    let pool = state.db.pool();

    let events = if let Some(lead_id) = &filters.lead_id {
        database::lead_tracking::list_events_for_lead(pool, lead_id, LIST_LIMIT).await?
    } else if let Some(phone) = &filters.phone {
        let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            // An all-formatting phone would match every row
            return Err(RelayError::BadRequest(
                "phone filter must contain at least one digit".to_string(),
            ));
        }
        database::lead_tracking::list_events_for_phone(pool, &digits, LIST_LIMIT).await?
    } else {
        database::lead_tracking::list_events(pool, LIST_LIMIT).await?
    };

    let events: Vec<Value> = events.iter().map(event_json).collect();

    Ok(Json(json!({
        "status": "success",
        "count": events.len(),
        "events": events,
    })))
}

/// Shape one event row for the API, grouping ids with their names.
fn event_json(event: &LeadTrackingEvent) -> Value {
    json!({
        "id": event.id,
        "message_id": event.message_id,
        "lead_id": event.lead_id,
        "phone": event.phone,
        "event_type": event.event_type,
        "source_id": event.source_id,
        "previous_pipeline": {
            "id": event.previous_pipeline_id,
            "name": event.previous_pipeline_name,
        },
        "previous_status": {
            "id": event.previous_status_id,
            "name": event.previous_status_name,
        },
        "current_pipeline": {
            "id": event.current_pipeline_id,
            "name": event.current_pipeline_name,
        },
        "current_status": {
            "id": event.current_status_id,
            "name": event.current_status_name,
        },
        "lead_situation": event.lead_situation,
        "event_time": event.event_time,
        "created_at": event.created_at,
    })
}
