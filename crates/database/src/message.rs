//! Inbound message persistence.

use sqlx::SqlitePool;

use crate::models::{Message, NewMessage};
use crate::Result;

/// Insert a message and return its row ID.
pub async fn insert_message(pool: &SqlitePool, message: &NewMessage) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO messages (
            phone, name, device, message, source_id, title, url, forwarded, date_time,
            ad_name, adset_name, adset_id, campaign_name, campaign_id
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&message.phone)
    .bind(&message.name)
    .bind(&message.device)
    .bind(&message.message)
    .bind(&message.source_id)
    .bind(&message.title)
    .bind(&message.url)
    .bind(message.forwarded)
    .bind(&message.date_time)
    .bind(&message.ad_name)
    .bind(&message.adset_name)
    .bind(&message.adset_id)
    .bind(&message.campaign_name)
    .bind(&message.campaign_id)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// List the most recent messages.
///
/// Messages without a provider timestamp sort after those with one.
pub async fn list_messages(pool: &SqlitePool, limit: i64) -> Result<Vec<Message>> {
    let rows = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, phone, name, device, message, source_id, title, url, forwarded, date_time,
               created_at, ad_name, adset_name, adset_id, campaign_name, campaign_id
        FROM messages
        ORDER BY date_time DESC NULLS LAST, created_at DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// List messages whose timestamp falls on the given day.
///
/// `day` is matched as a prefix of the stored `date_time`, so any
/// `YYYY-MM-DD` value selects that calendar day.
pub async fn list_messages_for_day(
    pool: &SqlitePool,
    day: &str,
    limit: i64,
) -> Result<Vec<Message>> {
    let rows = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, phone, name, device, message, source_id, title, url, forwarded, date_time,
               created_at, ad_name, adset_name, adset_id, campaign_name, campaign_id
        FROM messages
        WHERE date_time LIKE ?
        ORDER BY date_time DESC NULLS LAST, created_at DESC
        LIMIT ?
        "#,
    )
    .bind(format!("{day}%"))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// List messages with a timestamp in `[start, end_before)`.
pub async fn list_messages_between(
    pool: &SqlitePool,
    start: &str,
    end_before: &str,
    limit: i64,
) -> Result<Vec<Message>> {
    let rows = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, phone, name, device, message, source_id, title, url, forwarded, date_time,
               created_at, ad_name, adset_name, adset_id, campaign_name, campaign_id
        FROM messages
        WHERE date_time >= ? AND date_time < ?
        ORDER BY date_time DESC NULLS LAST, created_at DESC
        LIMIT ?
        "#,
    )
    .bind(start)
    .bind(end_before)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Count total messages.
pub async fn count_messages(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM messages
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
