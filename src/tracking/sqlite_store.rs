//! SQLite-backed message and event store
//!
//! Two tables: `messages` (one row per tracking pixel) and `open_events`
//! (append-only fetch log). Timestamps are stored as epoch milliseconds.

use super::store::{EventStore, MessageStore, StoreError};
use super::types::{OpenEvent, TrackingMessage};
use crate::sqlite_pragma::apply_optimized_pragmas;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS messages (
        id TEXT PRIMARY KEY,
        label TEXT NOT NULL,
        recipient TEXT,
        subject TEXT,
        created_at_ms INTEGER NOT NULL,
        sent_at_ms INTEGER
    );

    CREATE TABLE IF NOT EXISTS open_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        message_id TEXT NOT NULL,
        observed_at_ms INTEGER NOT NULL,
        source_ip TEXT NOT NULL,
        user_agent TEXT NOT NULL,
        referrer TEXT,
        is_automated_load INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_events_message_observed
        ON open_events(message_id, observed_at_ms DESC);
    CREATE INDEX IF NOT EXISTS idx_events_observed
        ON open_events(observed_at_ms DESC);
    CREATE INDEX IF NOT EXISTS idx_messages_created
        ON messages(created_at_ms DESC);
";

const EVENT_COLUMNS: &str =
    "message_id, observed_at_ms, source_ip, user_agent, referrer, is_automated_load";

const MESSAGE_COLUMNS: &str = "id, label, recipient, subject, created_at_ms, sent_at_ms";

/// Both store traits over one shared connection
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database and ensure the schema exists
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Database(format!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let conn = Connection::open(db_path)?;
        apply_optimized_pragmas(&conn)?;
        conn.execute_batch(SCHEMA)?;

        log::info!("✅ SQLite tracking store initialized with WAL mode");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `op` against the connection on the blocking pool
    ///
    /// Keeps lock waits and SQLite busy waits off the async worker, so a
    /// caller's `tokio::time::timeout` can fire while the call is stuck.
    async fn with_conn<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| StoreError::LockPoisoned)?;
            op(&guard)
        })
        .await
        .map_err(|e| StoreError::Database(format!("Store task failed: {}", e)))?
    }
}

fn millis_to_datetime(ms: i64) -> Result<DateTime<Utc>, StoreError> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or(StoreError::InvalidTimestamp(ms))
}

/// Raw event row; timestamps are converted after the query finishes
struct EventRow {
    message_id: String,
    observed_at_ms: i64,
    source_ip: String,
    user_agent: String,
    referrer: Option<String>,
    is_automated_load: bool,
}

impl EventRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            message_id: row.get(0)?,
            observed_at_ms: row.get(1)?,
            source_ip: row.get(2)?,
            user_agent: row.get(3)?,
            referrer: row.get(4)?,
            is_automated_load: row.get(5)?,
        })
    }

    fn into_event(self) -> Result<OpenEvent, StoreError> {
        Ok(OpenEvent {
            message_id: self.message_id,
            observed_at: millis_to_datetime(self.observed_at_ms)?,
            source_ip: self.source_ip,
            user_agent: self.user_agent,
            referrer: self.referrer,
            is_automated_load: self.is_automated_load,
        })
    }
}

struct MessageRow {
    id: String,
    label: String,
    recipient: Option<String>,
    subject: Option<String>,
    created_at_ms: i64,
    sent_at_ms: Option<i64>,
}

impl MessageRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            label: row.get(1)?,
            recipient: row.get(2)?,
            subject: row.get(3)?,
            created_at_ms: row.get(4)?,
            sent_at_ms: row.get(5)?,
        })
    }

    fn into_message(self) -> Result<TrackingMessage, StoreError> {
        Ok(TrackingMessage {
            id: self.id,
            label: self.label,
            recipient: self.recipient,
            subject: self.subject,
            created_at: millis_to_datetime(self.created_at_ms)?,
            sent_at: self.sent_at_ms.map(millis_to_datetime).transpose()?,
        })
    }
}

fn query_events(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<OpenEvent>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, EventRow::from_row)?;

    let mut events = Vec::new();
    for row in rows {
        events.push(row?.into_event()?);
    }
    Ok(events)
}

#[async_trait]
impl EventStore for SqliteStore {
    async fn append(&self, event: &OpenEvent) -> Result<(), StoreError> {
        let event = event.clone();
        self.with_conn(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO open_events ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    EVENT_COLUMNS
                ),
                params![
                    event.message_id,
                    event.observed_at.timestamp_millis(),
                    event.source_ip,
                    event.user_agent,
                    event.referrer,
                    event.is_automated_load,
                ],
            )?;

            log::debug!("Appended open event for {}", event.message_id);
            Ok(())
        })
        .await
    }

    async fn list_by_message(&self, message_id: &str) -> Result<Vec<OpenEvent>, StoreError> {
        let message_id = message_id.to_string();
        self.with_conn(move |conn| {
            query_events(
                conn,
                &format!(
                    "SELECT {} FROM open_events
                     WHERE message_id = ?1
                     ORDER BY observed_at_ms DESC, id DESC",
                    EVENT_COLUMNS
                ),
                params![message_id],
            )
        })
        .await
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<OpenEvent>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            query_events(
                conn,
                &format!(
                    "SELECT {} FROM open_events
                     ORDER BY observed_at_ms DESC, id DESC
                     LIMIT ?1",
                    EVENT_COLUMNS
                ),
                params![limit],
            )
        })
        .await
    }

    async fn delete_by_message(&self, message_id: &str) -> Result<usize, StoreError> {
        let message_id = message_id.to_string();
        self.with_conn(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM open_events WHERE message_id = ?1",
                params![message_id],
            )?;
            Ok(deleted)
        })
        .await
    }
}

#[async_trait]
impl MessageStore for SqliteStore {
    async fn insert_message(&self, message: &TrackingMessage) -> Result<(), StoreError> {
        let message = message.clone();
        self.with_conn(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO messages ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    MESSAGE_COLUMNS
                ),
                params![
                    message.id,
                    message.label,
                    message.recipient,
                    message.subject,
                    message.created_at.timestamp_millis(),
                    message.sent_at.map(|t| t.timestamp_millis()),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_message(&self, id: &str) -> Result<Option<TrackingMessage>, StoreError> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {} FROM messages WHERE id = ?1", MESSAGE_COLUMNS),
                    params![id],
                    MessageRow::from_row,
                )
                .optional()?;

            row.map(MessageRow::into_message).transpose()
        })
        .await
    }

    async fn list_messages(&self) -> Result<Vec<TrackingMessage>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM messages ORDER BY created_at_ms DESC, rowid DESC",
                MESSAGE_COLUMNS
            ))?;
            let rows = stmt.query_map([], MessageRow::from_row)?;

            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?.into_message()?);
            }
            Ok(messages)
        })
        .await
    }

    async fn delete_message(&self, id: &str) -> Result<bool, StoreError> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let deleted = conn.execute("DELETE FROM messages WHERE id = ?1", params![id])?;
            Ok(deleted > 0)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
    }

    fn event(message_id: &str, offset_secs: i64, ip: &str, automated: bool) -> OpenEvent {
        OpenEvent {
            message_id: message_id.to_string(),
            observed_at: base_time() + Duration::seconds(offset_secs),
            source_ip: ip.to_string(),
            user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0) Mobile Safari".to_string(),
            referrer: Some("https://mail.example.com/".to_string()),
            is_automated_load: automated,
        }
    }

    fn message(id: &str, created_offset_secs: i64) -> TrackingMessage {
        TrackingMessage {
            id: id.to_string(),
            label: format!("Label {}", id),
            recipient: Some("someone@example.com".to_string()),
            subject: None,
            created_at: base_time() + Duration::seconds(created_offset_secs),
            sent_at: Some(base_time()),
        }
    }

    #[tokio::test]
    async fn test_append_and_list_by_message() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("test.db")).unwrap();

        store.append(&event("m1", 10, "1.1.1.1", true)).await.unwrap();
        store.append(&event("m1", 120, "2.2.2.2", false)).await.unwrap();
        store.append(&event("m2", 60, "3.3.3.3", false)).await.unwrap();

        let events = store.list_by_message("m1").await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].source_ip, "2.2.2.2");
        assert_eq!(events[1].source_ip, "1.1.1.1");
        assert!(events[1].is_automated_load);
        assert_eq!(events[1].referrer.as_deref(), Some("https://mail.example.com/"));
        assert_eq!(events[0].observed_at, base_time() + Duration::seconds(120));
    }

    #[tokio::test]
    async fn test_list_recent_ordering_and_limit() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("test.db")).unwrap();

        for i in 0..10 {
            store
                .append(&event(&format!("m{}", i % 3), i * 60, &format!("10.0.0.{}", i), false))
                .await
                .unwrap();
        }
        // Same timestamp as the newest row: appended later, listed first
        store.append(&event("m9", 9 * 60, "tie", false)).await.unwrap();

        let recent = store.list_recent(4).await.unwrap();
        let ips: Vec<&str> = recent.iter().map(|e| e.source_ip.as_str()).collect();
        assert_eq!(ips, vec!["tie", "10.0.0.9", "10.0.0.8", "10.0.0.7"]);
    }

    #[tokio::test]
    async fn test_delete_by_message_counts_rows() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("test.db")).unwrap();

        store.append(&event("m1", 10, "a", false)).await.unwrap();
        store.append(&event("m1", 20, "b", false)).await.unwrap();
        store.append(&event("m2", 30, "c", false)).await.unwrap();

        assert_eq!(store.delete_by_message("m1").await.unwrap(), 2);
        assert!(store.list_by_message("m1").await.unwrap().is_empty());
        assert_eq!(store.list_by_message("m2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_messages_round_trip_and_persist_across_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("test.db");

        {
            let store = SqliteStore::open(&db_path).unwrap();
            store.insert_message(&message("older", 0)).await.unwrap();
            store.insert_message(&message("newer", 3600)).await.unwrap();
            assert!(store.insert_message(&message("older", 0)).await.is_err());
        }

        let store = SqliteStore::open(&db_path).unwrap();
        let listed = store.list_messages().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, "newer");
        assert_eq!(listed[1], message("older", 0));

        assert!(store.delete_message("older").await.unwrap());
        assert!(!store.delete_message("older").await.unwrap());
        assert_eq!(store.get_message("older").await.unwrap(), None);
        assert_eq!(store.get_message("newer").await.unwrap(), Some(message("newer", 3600)));
    }

    #[tokio::test]
    async fn test_invalid_stored_timestamp_is_reported() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let store = SqliteStore::open(&db_path).unwrap();

        let conn = Connection::open(&db_path).unwrap();
        conn.execute(
            "INSERT INTO open_events (message_id, observed_at_ms, source_ip, user_agent, referrer, is_automated_load)
             VALUES ('m1', ?1, 'ip', 'ua', NULL, 0)",
            params![i64::MAX],
        )
        .unwrap();
        drop(conn);

        let result = store.list_by_message("m1").await;
        assert!(matches!(result, Err(StoreError::InvalidTimestamp(ms)) if ms == i64::MAX));
    }

    #[tokio::test]
    async fn test_held_connection_does_not_block_caller_timeout() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("test.db")).unwrap();
        store.append(&event("m1", 10, "a", false)).await.unwrap();

        let held = store.conn.lock().unwrap();
        let started = std::time::Instant::now();
        let result =
            tokio::time::timeout(std::time::Duration::from_millis(100), store.list_recent(10)).await;
        let waited = started.elapsed();
        drop(held);

        assert!(result.is_err());
        assert!(waited < std::time::Duration::from_millis(1_000), "waited {:?}", waited);
        // The connection is usable again once released
        assert_eq!(store.list_recent(10).await.unwrap().len(), 1);
    }
}
