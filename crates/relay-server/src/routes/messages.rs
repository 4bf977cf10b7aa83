//! Stored message queries.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::clock;
use crate::error::Result;
use crate::state::AppState;

const LIST_LIMIT: i64 = 100;

/// Accepted filters for the message list.
#[derive(Debug, Default, Deserialize)]
pub struct MessageFilters {
    /// Single day, `YYYY-MM-DD`. Takes precedence over the range.
    pub date: Option<String>,
    /// Range start, `YYYY-MM-DD`. Only applied together with `end_date`.
    pub start_date: Option<String>,
    /// Range end, `YYYY-MM-DD`, inclusive.
    pub end_date: Option<String>,
}

/// List stored messages, newest first, with the filters echoed back.
pub async fn list_messages(
    State(state): State<AppState>,
    Query(filters): Query<MessageFilters>,
) -> Result<Json<Value>> {
    let pool = state.db.pool();

    let messages = if let Some(date) = &filters.date {
        database::message::list_messages_for_day(pool, date, LIST_LIMIT).await?
    } else if let (Some(start), Some(end)) = (&filters.start_date, &filters.end_date) {
        match clock::day_after(end) {
            Some(end_before) => {
                database::message::list_messages_between(pool, start, &end_before, LIST_LIMIT)
                    .await?
            }
            None => {
                warn!("Ignoring date range with unparseable end_date {:?}", end);
                database::message::list_messages(pool, LIST_LIMIT).await?
            }
        }
    } else {
        database::message::list_messages(pool, LIST_LIMIT).await?
    };

    Ok(Json(json!({
        "status": "success",
        "count": messages.len(),
        "messages": messages,
        "filters": {
            "date": filters.date,
            "start_date": filters.start_date,
            "end_date": filters.end_date,
        },
    })))
}
