//! Lead journey tracking.
//!
//! Records message attribution and pipeline state changes reported by the
//! CRM, so a lead's path from first contact onward can be reconstructed.

use sqlx::SqlitePool;

use crate::models::{LeadTrackingEvent, NewLeadTrackingEvent};
use crate::Result;

/// Insert a tracking event and return its row ID.
pub async fn insert_event(pool: &SqlitePool, event: &NewLeadTrackingEvent) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO lead_tracking (
            message_id, lead_id, phone, event_type, source_id,
            previous_pipeline_id, previous_pipeline_name,
            previous_status_id, previous_status_name,
            current_pipeline_id, current_pipeline_name,
            current_status_id, current_status_name,
            lead_situation, event_time
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(event.message_id)
    .bind(&event.lead_id)
    .bind(&event.phone)
    .bind(&event.event_type)
    .bind(&event.source_id)
    .bind(&event.previous_pipeline_id)
    .bind(&event.previous_pipeline_name)
    .bind(&event.previous_status_id)
    .bind(&event.previous_status_name)
    .bind(&event.current_pipeline_id)
    .bind(&event.current_pipeline_name)
    .bind(&event.current_status_id)
    .bind(&event.current_status_name)
    .bind(&event.lead_situation)
    .bind(&event.event_time)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// List the most recent tracking events.
pub async fn list_events(pool: &SqlitePool, limit: i64) -> Result<Vec<LeadTrackingEvent>> {
    let rows = sqlx::query_as::<_, LeadTrackingEvent>(
        r#"
        SELECT id, message_id, lead_id, phone, event_type, source_id,
               previous_pipeline_id, previous_pipeline_name,
               previous_status_id, previous_status_name,
               current_pipeline_id, current_pipeline_name,
               current_status_id, current_status_name,
               event_time, created_at, lead_situation
        FROM lead_tracking
        ORDER BY event_time DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// List tracking events for a specific lead.
pub async fn list_events_for_lead(
    pool: &SqlitePool,
    lead_id: &str,
    limit: i64,
) -> Result<Vec<LeadTrackingEvent>> {
    let rows = sqlx::query_as::<_, LeadTrackingEvent>(
        r#"
        SELECT id, message_id, lead_id, phone, event_type, source_id,
               previous_pipeline_id, previous_pipeline_name,
               previous_status_id, previous_status_name,
               current_pipeline_id, current_pipeline_name,
               current_status_id, current_status_name,
               event_time, created_at, lead_situation
        FROM lead_tracking
        WHERE lead_id = ?
        ORDER BY event_time DESC
        LIMIT ?
        "#,
    )
    .bind(lead_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// List tracking events whose phone contains the given digit string.
///
/// Substring matching tolerates country codes and formatting differences
/// between what the CRM stores and what the caller has.
pub async fn list_events_for_phone(
    pool: &SqlitePool,
    digits: &str,
    limit: i64,
) -> Result<Vec<LeadTrackingEvent>> {
    let rows = sqlx::query_as::<_, LeadTrackingEvent>(
        r#"
        SELECT id, message_id, lead_id, phone, event_type, source_id,
               previous_pipeline_id, previous_pipeline_name,
               previous_status_id, previous_status_name,
               current_pipeline_id, current_pipeline_name,
               current_status_id, current_status_name,
               event_time, created_at, lead_situation
        FROM lead_tracking
        WHERE phone LIKE ?
        ORDER BY event_time DESC
        LIMIT ?
        "#,
    )
    .bind(format!("%{digits}%"))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Count total tracking events.
pub async fn count_events(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM lead_tracking
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
