//! Read boundary: fetch snapshots from the stores and aggregate them
//!
//! Every store call is bounded by the configured timeout. The aggregation
//! itself is delegated to the pure functions in the sibling modules.

use super::fleet::{compute_fleet_analytics, AnalyticsOptions, FleetAnalytics};
use super::message_stats::{compute_message_statistics, MessageStatistics};
use super::time_to_open::compute_time_to_open;
use crate::config::TrackerConfig;
use crate::persistence::DashboardSnapshot;
use crate::tracking::{EventStore, MessageStore, OpenEvent, StoreError, TrackingMessage};
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
pub enum EngineError {
    Store(StoreError),
    MessageNotFound(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        EngineError::Store(err)
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Store(e) => write!(f, "Store error: {}", e),
            EngineError::MessageNotFound(id) => write!(f, "Tracking message not found: {}", id),
        }
    }
}

impl std::error::Error for EngineError {}

/// Statistics and raw events for one message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageReport {
    pub message: TrackingMessage,
    pub statistics: MessageStatistics,
    pub median_minutes_to_open: Option<f64>,
    /// Newest first
    pub events: Vec<OpenEvent>,
}

pub struct AnalyticsEngine {
    events: Arc<dyn EventStore>,
    messages: Arc<dyn MessageStore>,
    recent_limit: usize,
    store_timeout: Duration,
    options: AnalyticsOptions,
    now_fn: Box<dyn Fn() -> DateTime<Utc> + Send + Sync>,
}

impl AnalyticsEngine {
    /// Create an engine reading the wall clock
    pub fn new(
        events: Arc<dyn EventStore>,
        messages: Arc<dyn MessageStore>,
        config: &TrackerConfig,
    ) -> Self {
        Self::new_with_clock(events, messages, config, Box::new(Utc::now))
    }

    /// Create an engine with a custom clock
    ///
    /// The clock decides which calendar day counts as "today" for the
    /// opens-over-time window.
    pub fn new_with_clock(
        events: Arc<dyn EventStore>,
        messages: Arc<dyn MessageStore>,
        config: &TrackerConfig,
        now_fn: Box<dyn Fn() -> DateTime<Utc> + Send + Sync>,
    ) -> Self {
        Self {
            events,
            messages,
            recent_limit: config.recent_events_limit,
            store_timeout: config.store_timeout(),
            options: AnalyticsOptions {
                include_automated_loads: config.include_automated_loads,
            },
            now_fn,
        }
    }

    pub fn options(&self) -> AnalyticsOptions {
        self.options
    }

    /// Statistics, median time-to-open and the raw event list for one message
    pub async fn get_message_report(&self, message_id: &str) -> Result<MessageReport, EngineError> {
        let message = self
            .bounded(self.messages.get_message(message_id))
            .await?
            .ok_or_else(|| EngineError::MessageNotFound(message_id.to_string()))?;

        let events = self.bounded(self.events.list_by_message(message_id)).await?;

        let statistics = compute_message_statistics(message_id, &events);
        let median_minutes_to_open = compute_time_to_open(&message, &events);

        log::debug!(
            "Report for {}: {} opens ({} genuine, {} unique)",
            message_id,
            statistics.total_opens,
            statistics.genuine_opens,
            statistics.unique_opens
        );

        Ok(MessageReport {
            message,
            statistics,
            median_minutes_to_open,
            events,
        })
    }

    /// Fleet analytics bucketed in the host's local time zone
    pub async fn get_fleet_analytics(&self) -> Result<FleetAnalytics, EngineError> {
        self.get_fleet_analytics_in(&Local).await
    }

    /// Fleet analytics bucketed in `tz`
    pub async fn get_fleet_analytics_in<Tz: TimeZone>(
        &self,
        tz: &Tz,
    ) -> Result<FleetAnalytics, EngineError> {
        let messages = self.bounded(self.messages.list_messages()).await?;
        let events = self.bounded(self.events.list_recent(self.recent_limit)).await?;

        let today = (self.now_fn)().with_timezone(tz).date_naive();
        let analytics = compute_fleet_analytics(&messages, &events, tz, today, self.options);

        log::info!(
            "📊 Fleet analytics: {} messages, {} opened ({}%), {} events in window",
            analytics.total_messages,
            analytics.opened_messages,
            analytics.open_rate,
            events.len()
        );

        Ok(analytics)
    }

    /// All messages plus the recent event window
    pub async fn get_dashboard_snapshot(&self) -> Result<DashboardSnapshot, EngineError> {
        let messages = self.bounded(self.messages.list_messages()).await?;
        let recent_events = self.bounded(self.events.list_recent(self.recent_limit)).await?;

        Ok(DashboardSnapshot {
            messages,
            recent_events,
            captured_at: (self.now_fn)(),
        })
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                log::error!(
                    "❌ Store read timed out after {}ms",
                    self.store_timeout.as_millis()
                );
                Err(StoreError::Timeout(self.store_timeout.as_millis() as u64))
            }
        }
    }
}
