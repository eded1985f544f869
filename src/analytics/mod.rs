//! Analytics - derived statistics over the open-event log
//!
//! ```text
//! AnalyticsEngine (timeout-bounded store reads, injected clock)
//!     ├─ get_message_report   → message_stats + time_to_open
//!     ├─ get_fleet_analytics  → fleet
//!     │                           ├─ bucketing   (weekday, hour, 14-day series)
//!     │                           ├─ ranking     (top messages, client counts)
//!     │                           └─ user_agent  (browser / device sniffing)
//!     └─ get_dashboard_snapshot
//! ```
//!
//! Everything below the engine is pure and deterministic.

pub mod bucketing;
pub mod engine;
pub mod fleet;
pub mod message_stats;
pub mod ranking;
pub mod time_to_open;
pub mod user_agent;

pub use bucketing::{DailyCount, WEEKDAY_NAMES};
pub use engine::{AnalyticsEngine, EngineError, MessageReport};
pub use fleet::{
    compute_fleet_analytics, AnalyticsOptions, BrowserCount, DeviceCount, FleetAnalytics,
    OpenCounts, TopMessage, ANALYTICS_WINDOW_DAYS,
};
pub use message_stats::{compute_message_statistics, MessageStatistics};
pub use time_to_open::compute_time_to_open;
pub use user_agent::{classify_browser, classify_device, Browser, Device};
