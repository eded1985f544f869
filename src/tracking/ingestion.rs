//! Pixel ingestion - classify, log best-effort, always serve the GIF
//!
//! The pixel response never depends on the logging outcome: a missing
//! tracking ID, a failing store, or a store call that exceeds the timeout all
//! still produce the same 1×1 transparent image.

use super::classifier::{parse_sent_at, EventClassifier};
use super::store::EventStore;
use super::types::OpenEvent;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// 1×1 transparent GIF89a
pub const TRANSPARENT_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x01, 0x44, 0x00, 0x3b,
];

pub const PIXEL_CONTENT_TYPE: &str = "image/gif";

/// Headers that keep intermediaries from caching the pixel
pub const PIXEL_HEADERS: [(&str, &str); 4] = [
    ("Content-Type", PIXEL_CONTENT_TYPE),
    (
        "Cache-Control",
        "no-store, no-cache, must-revalidate, proxy-revalidate",
    ),
    ("Pragma", "no-cache"),
    ("Expires", "0"),
];

/// An inbound pixel fetch as seen by the HTTP layer
#[derive(Debug, Clone, Default)]
pub struct TrackRequest {
    /// `id` query parameter
    pub id: Option<String>,
    /// `sentAt` query parameter, epoch milliseconds
    pub sent_at: Option<String>,
    /// `X-Forwarded-For` header
    pub forwarded_for: Option<String>,
    /// `User-Agent` header
    pub user_agent: Option<String>,
    /// `Referer` header
    pub referrer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelResponse {
    pub body: &'static [u8],
    pub headers: [(&'static str, &'static str); 4],
    /// Whether an event was durably appended (informational only)
    pub logged: bool,
}

impl PixelResponse {
    fn new(logged: bool) -> Self {
        Self {
            body: TRANSPARENT_GIF,
            headers: PIXEL_HEADERS,
            logged,
        }
    }
}

/// Ingestion boundary: turns pixel fetches into classified open events
pub struct IngestionService {
    store: Arc<dyn EventStore>,
    classifier: EventClassifier,
    store_timeout: Duration,
}

impl IngestionService {
    pub fn new(store: Arc<dyn EventStore>, classifier: EventClassifier, store_timeout: Duration) -> Self {
        Self {
            store,
            classifier,
            store_timeout,
        }
    }

    /// Handle a fetch observed now
    pub async fn handle_track(&self, request: TrackRequest) -> PixelResponse {
        self.handle_track_at(request, Utc::now()).await
    }

    /// Handle a fetch observed at `observed_at`
    pub async fn handle_track_at(
        &self,
        request: TrackRequest,
        observed_at: DateTime<Utc>,
    ) -> PixelResponse {
        let Some(event) = self.build_event(&request, observed_at) else {
            log::debug!("Pixel fetched without tracking id, nothing to log");
            return PixelResponse::new(false);
        };

        let logged = match tokio::time::timeout(self.store_timeout, self.store.append(&event)).await {
            Ok(Ok(())) => {
                log::info!(
                    "📥 Tracked open for ID: {} (automated: {})",
                    event.message_id,
                    event.is_automated_load
                );
                true
            }
            Ok(Err(e)) => {
                log::warn!("Failed to log open event for {}: {}", event.message_id, e);
                false
            }
            Err(_) => {
                log::warn!(
                    "Logging open event for {} timed out after {}ms",
                    event.message_id,
                    self.store_timeout.as_millis()
                );
                false
            }
        };

        PixelResponse::new(logged)
    }

    /// Classify the request into an event; `None` when there is no tracking id
    pub fn build_event(&self, request: &TrackRequest, observed_at: DateTime<Utc>) -> Option<OpenEvent> {
        let message_id = request
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())?
            .to_string();

        let sent_at = parse_sent_at(request.sent_at.as_deref());
        let classification = self.classifier.classify(&message_id, observed_at, sent_at);

        Some(OpenEvent {
            message_id,
            observed_at,
            source_ip: request.forwarded_for.clone().unwrap_or_default(),
            user_agent: request.user_agent.clone().unwrap_or_default(),
            referrer: request.referrer.clone().filter(|r| !r.is_empty()),
            is_automated_load: classification.is_automated_load,
        })
    }
}
