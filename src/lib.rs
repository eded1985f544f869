//! mailbeacon - email open tracking with prefetch-aware analytics
//!
//! A per-message tracking pixel is fetched by the recipient's mail client.
//! Every fetch becomes an [`OpenEvent`](tracking::OpenEvent), labelled at
//! ingestion time as either a genuine open or an automated provider prefetch,
//! and the analytics layer turns the event log into per-message statistics
//! and fleet-wide dashboards.
//!
//! ```text
//! TrackRequest → IngestionService → EventClassifier
//!     ↓
//! EventStore (SQLite / in-memory, append-only)
//!     ↓
//! AnalyticsEngine → message_stats / fleet / time_to_open
//!     ↓
//! MessageReport, FleetAnalytics (JSON)
//! ```

pub mod analytics;
pub mod config;
pub mod persistence;
pub mod sqlite_pragma;
pub mod tracking;

pub use analytics::{AnalyticsEngine, AnalyticsOptions, EngineError, FleetAnalytics, MessageReport};
pub use config::TrackerConfig;
pub use tracking::{
    EventClassifier, EventStore, IngestionService, MessageRegistry, MessageStore, OpenEvent,
    TrackingMessage,
};
