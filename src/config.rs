//! Tracker configuration from environment variables

use std::env;
use std::time::Duration;

/// Configuration for the tracker runtime
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Path to SQLite database file
    pub db_path: String,

    /// Fetches arriving sooner than this after the declared send time are
    /// labelled automated loads
    pub automated_load_threshold_secs: i64,

    /// Size of the fleet-wide recent event window used by analytics
    pub recent_events_limit: usize,

    /// Upper bound on any single store call, in milliseconds
    pub store_timeout_ms: u64,

    /// Base URL prepended to generated tracking URLs
    pub tracking_base_url: String,

    /// Count automated loads in fleet analytics as well
    pub include_automated_loads: bool,
}

impl TrackerConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `MAILBEACON_DB_PATH` (default: data/mailbeacon.db)
    /// - `AUTOMATED_LOAD_THRESHOLD_SECS` (default: 30)
    /// - `RECENT_EVENTS_LIMIT` (default: 100)
    /// - `STORE_TIMEOUT_MS` (default: 5000)
    /// - `TRACKING_BASE_URL` (default: http://localhost:3000)
    /// - `INCLUDE_AUTOMATED_LOADS` (default: false)
    pub fn from_env() -> Self {
        Self {
            db_path: env::var("MAILBEACON_DB_PATH")
                .unwrap_or_else(|_| "data/mailbeacon.db".to_string()),

            automated_load_threshold_secs: env::var("AUTOMATED_LOAD_THRESHOLD_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),

            recent_events_limit: env::var("RECENT_EVENTS_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100),

            store_timeout_ms: env::var("STORE_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5_000),

            tracking_base_url: env::var("TRACKING_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),

            include_automated_loads: env::var("INCLUDE_AUTOMATED_LOADS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
        }
    }

    pub fn automated_load_threshold(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.automated_load_threshold_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}
