//! Store traits for tracking messages and open events
//!
//! Defines the collaborator interfaces the ingestion and analytics layers are
//! built against. Implementations: [`SqliteStore`](super::SqliteStore) and
//! [`InMemoryStore`](super::InMemoryStore).

use super::types::{OpenEvent, TrackingMessage};
use async_trait::async_trait;

#[derive(Debug)]
pub enum StoreError {
    Database(String),
    LockPoisoned,
    InvalidTimestamp(i64),
    Timeout(u64),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "Database error: {}", e),
            StoreError::LockPoisoned => write!(f, "Store lock poisoned"),
            StoreError::InvalidTimestamp(ms) => write!(f, "Invalid stored timestamp: {}", ms),
            StoreError::Timeout(ms) => write!(f, "Store call timed out after {}ms", ms),
        }
    }
}

impl std::error::Error for StoreError {}

/// Append-only log of pixel fetches
///
/// All listings are newest-first by `observed_at`; ties go to the most
/// recently appended event.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append a classified event
    async fn append(&self, event: &OpenEvent) -> Result<(), StoreError>;

    /// All events for one message, newest-first
    async fn list_by_message(&self, message_id: &str) -> Result<Vec<OpenEvent>, StoreError>;

    /// The newest `limit` events across every message
    async fn list_recent(&self, limit: usize) -> Result<Vec<OpenEvent>, StoreError>;

    /// Remove every event of a message, returning how many were removed
    async fn delete_by_message(&self, message_id: &str) -> Result<usize, StoreError>;
}

/// Persistence of tracking messages
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn insert_message(&self, message: &TrackingMessage) -> Result<(), StoreError>;

    async fn get_message(&self, id: &str) -> Result<Option<TrackingMessage>, StoreError>;

    /// Every message, newest `created_at` first
    async fn list_messages(&self) -> Result<Vec<TrackingMessage>, StoreError>;

    /// Returns false when no message had this id
    async fn delete_message(&self, id: &str) -> Result<bool, StoreError>;
}
