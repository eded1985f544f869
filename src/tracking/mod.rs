//! Tracking core - pixel ingestion, classification and storage
//!
//! ```text
//! TrackRequest (id, sentAt, headers)
//!     ↓
//! IngestionService (best-effort, timeout-bounded)
//!     ↓
//! EventClassifier (elapsed since sentAt < threshold → automated load)
//!     ↓
//! EventStore::append → SqliteStore / InMemoryStore
//! ```
//!
//! `MessageRegistry` owns the other end of the lifecycle: ID generation,
//! tracking URL construction, and cascade deletion.

pub mod classifier;
pub mod ids;
pub mod ingestion;
pub mod memory_store;
pub mod registry;
pub mod sqlite_store;
pub mod store;
pub mod types;

pub use classifier::{parse_sent_at, Classification, EventClassifier};
pub use ingestion::{IngestionService, PixelResponse, TrackRequest, TRANSPARENT_GIF};
pub use memory_store::InMemoryStore;
pub use registry::{DeletionReport, GeneratedPixel, MessageRegistry, NewMessage};
pub use sqlite_store::SqliteStore;
pub use store::{EventStore, MessageStore, StoreError};
pub use types::{OpenEvent, TrackingMessage};
