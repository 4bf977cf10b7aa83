//! Kommo OAuth token storage.
//!
//! One row per CRM account, keyed by `account_id`. Re-authorizing an
//! account replaces its tokens in place.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::KommoToken;

/// Insert or replace the token set for an account.
pub async fn upsert_token(
    pool: &SqlitePool,
    account_id: &str,
    access_token: &str,
    refresh_token: &str,
    expires_at: &str,
    domain: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO kommo_tokens (account_id, access_token, refresh_token, expires_at, domain)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(account_id) DO UPDATE SET
            access_token = excluded.access_token,
            refresh_token = excluded.refresh_token,
            expires_at = excluded.expires_at,
            domain = excluded.domain,
            updated_at = datetime('now')
        "#,
    )
    .bind(account_id)
    .bind(access_token)
    .bind(refresh_token)
    .bind(expires_at)
    .bind(domain)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get the token set for an account.
pub async fn get_token(pool: &SqlitePool, account_id: &str) -> Result<KommoToken> {
    sqlx::query_as::<_, KommoToken>(
        r#"
        SELECT id, account_id, access_token, refresh_token, expires_at, domain,
               created_at, updated_at
        FROM kommo_tokens
        WHERE account_id = ?
        "#,
    )
    .bind(account_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "KommoToken",
        id: account_id.to_string(),
    })
}

/// Get the oldest stored token set, if any account is connected.
pub async fn first_token(pool: &SqlitePool) -> Result<Option<KommoToken>> {
    let record = sqlx::query_as::<_, KommoToken>(
        r#"
        SELECT id, account_id, access_token, refresh_token, expires_at, domain,
               created_at, updated_at
        FROM kommo_tokens
        ORDER BY id
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// List all stored token sets.
pub async fn list_tokens(pool: &SqlitePool) -> Result<Vec<KommoToken>> {
    let rows = sqlx::query_as::<_, KommoToken>(
        r#"
        SELECT id, account_id, access_token, refresh_token, expires_at, domain,
               created_at, updated_at
        FROM kommo_tokens
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Delete the token set for an account.
pub async fn delete_token(pool: &SqlitePool, account_id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM kommo_tokens
        WHERE account_id = ?
        "#,
    )
    .bind(account_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "KommoToken",
            id: account_id.to_string(),
        });
    }

    Ok(())
}
