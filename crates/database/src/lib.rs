//! SQLite persistence layer for the webhook relay.
//!
//! This crate provides async database operations for inbound messages, Kommo
//! OAuth tokens, and lead tracking events using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{models::NewMessage, message, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:relay.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Record an inbound message
//!     let message = NewMessage {
//!         phone: "5511999887766".to_string(),
//!         name: "Maria".to_string(),
//!         device: "android".to_string(),
//!         message: "Olá, vi o anúncio de vocês".to_string(),
//!         ..Default::default()
//!     };
//!     message::insert_message(db.pool(), &message).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod lead_tracking;
pub mod message;
pub mod models;
pub mod token;

pub use error::{DatabaseError, Result};
pub use models::{KommoToken, LeadTrackingEvent, Message, NewLeadTrackingEvent, NewMessage};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Covers concurrent webhook bursts alongside dashboard reads.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/relay.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Check that the database still answers queries.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewLeadTrackingEvent;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn sample_message(phone: &str, date_time: &str) -> NewMessage {
        NewMessage {
            phone: phone.to_string(),
            name: "Maria".to_string(),
            device: "android".to_string(),
            message: "Olá, vi o anúncio".to_string(),
            source_id: Some("120210000000000000".to_string()),
            date_time: Some(date_time.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_message_insert_and_list() {
        let db = test_db().await;

        let id = message::insert_message(db.pool(), &sample_message("5511999887766", "2024-06-01T10:00:00.000"))
            .await
            .unwrap();
        assert!(id > 0);
        message::insert_message(db.pool(), &sample_message("5511988776655", "2024-06-02T09:30:00.000"))
            .await
            .unwrap();

        let all = message::list_messages(db.pool(), 100).await.unwrap();
        assert_eq!(all.len(), 2);
        // Newest first
        assert_eq!(all[0].phone, "5511988776655");
        assert!(!all[0].forwarded);

        assert_eq!(message::count_messages(db.pool()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_message_day_and_range_filters() {
        let db = test_db().await;

        message::insert_message(db.pool(), &sample_message("1", "2024-06-01T10:00:00.000"))
            .await
            .unwrap();
        message::insert_message(db.pool(), &sample_message("2", "2024-06-02T09:30:00.000"))
            .await
            .unwrap();
        message::insert_message(db.pool(), &sample_message("3", "2024-06-03T08:00:00.000"))
            .await
            .unwrap();

        let day = message::list_messages_for_day(db.pool(), "2024-06-02", 100)
            .await
            .unwrap();
        assert_eq!(day.len(), 1);
        assert_eq!(day[0].phone, "2");

        // End bound is exclusive, so June 3 falls outside
        let range = message::list_messages_between(db.pool(), "2024-06-01", "2024-06-03", 100)
            .await
            .unwrap();
        assert_eq!(range.len(), 2);
        assert_eq!(range[0].phone, "2");
        assert_eq!(range[1].phone, "1");
    }

    #[tokio::test]
    async fn test_messages_without_timestamp_sort_last() {
        let db = test_db().await;

        let mut no_ts = sample_message("no-ts", "");
        no_ts.date_time = None;
        message::insert_message(db.pool(), &no_ts).await.unwrap();
        message::insert_message(db.pool(), &sample_message("with-ts", "2024-06-01T10:00:00.000"))
            .await
            .unwrap();

        let all = message::list_messages(db.pool(), 100).await.unwrap();
        assert_eq!(all[0].phone, "with-ts");
        assert_eq!(all[1].phone, "no-ts");
    }

    #[tokio::test]
    async fn test_token_upsert_replaces_in_place() {
        let db = test_db().await;

        token::upsert_token(
            db.pool(),
            "12345678",
            "access-1",
            "refresh-1",
            "2024-06-01T00:00:00Z",
            "acme.kommo.com",
        )
        .await
        .unwrap();

        token::upsert_token(
            db.pool(),
            "12345678",
            "access-2",
            "refresh-2",
            "2024-06-02T00:00:00Z",
            "acme.kommo.com",
        )
        .await
        .unwrap();

        let tokens = token::list_tokens(db.pool()).await.unwrap();
        assert_eq!(tokens.len(), 1);

        let fetched = token::get_token(db.pool(), "12345678").await.unwrap();
        assert_eq!(fetched.access_token, "access-2");
        assert_eq!(fetched.refresh_token, "refresh-2");
        assert_eq!(fetched.expires_at, "2024-06-02T00:00:00Z");
    }

    #[tokio::test]
    async fn test_token_get_and_delete() {
        let db = test_db().await;

        let missing = token::get_token(db.pool(), "nope").await;
        assert!(matches!(missing, Err(DatabaseError::NotFound { .. })));

        token::upsert_token(
            db.pool(),
            "111",
            "a",
            "r",
            "2024-06-01T00:00:00Z",
            "one.kommo.com",
        )
        .await
        .unwrap();
        token::upsert_token(
            db.pool(),
            "222",
            "b",
            "s",
            "2024-06-01T00:00:00Z",
            "two.kommo.com",
        )
        .await
        .unwrap();

        let first = token::first_token(db.pool()).await.unwrap().unwrap();
        assert_eq!(first.account_id, "111");

        token::delete_token(db.pool(), "111").await.unwrap();
        let result = token::get_token(db.pool(), "111").await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));

        let result = token::delete_token(db.pool(), "111").await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_lead_tracking_flow() {
        let db = test_db().await;

        let event = NewLeadTrackingEvent {
            message_id: None,
            lead_id: "9001".to_string(),
            phone: Some("5511999887766".to_string()),
            event_type: "status_changed".to_string(),
            previous_status_id: Some("100".to_string()),
            previous_status_name: Some("Novo".to_string()),
            current_status_id: Some("200".to_string()),
            current_status_name: Some("Em atendimento".to_string()),
            event_time: "2024-06-01T10:00:00.000".to_string(),
            ..Default::default()
        };
        let id = lead_tracking::insert_event(db.pool(), &event).await.unwrap();
        assert!(id > 0);

        let mut second = event.clone();
        second.lead_id = "9002".to_string();
        second.phone = Some("5521912345678".to_string());
        second.event_time = "2024-06-01T11:00:00.000".to_string();
        lead_tracking::insert_event(db.pool(), &second).await.unwrap();

        let all = lead_tracking::list_events(db.pool(), 100).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].lead_id, "9002");

        let by_lead = lead_tracking::list_events_for_lead(db.pool(), "9001", 100)
            .await
            .unwrap();
        assert_eq!(by_lead.len(), 1);
        assert_eq!(by_lead[0].current_status_name.as_deref(), Some("Em atendimento"));

        // Searching a local number still matches the stored 55-prefixed one
        let by_phone = lead_tracking::list_events_for_phone(db.pool(), "999887766", 100)
            .await
            .unwrap();
        assert_eq!(by_phone.len(), 1);
        assert_eq!(by_phone[0].lead_id, "9001");

        assert_eq!(lead_tracking::count_events(db.pool()).await.unwrap(), 2);
    }
}
