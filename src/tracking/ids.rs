//! Tracking ID generation and tracking URL construction

use chrono::{DateTime, Utc};
use rand::RngCore;

/// Random bytes per tracking ID (hex-encoded: 8 characters)
const TRACKING_ID_BYTES: usize = 4;

/// Generate an opaque tracking ID (lowercase hex, short enough for URLs)
pub fn generate_tracking_id() -> String {
    let mut bytes = [0u8; TRACKING_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Build the pixel URL embedded in the email
///
/// The optional send time rides along as `sentAt` (epoch milliseconds) so the
/// ingestion side can tell provider prefetches from human opens.
pub fn tracking_url(base_url: &str, tracking_id: &str, sent_at: Option<DateTime<Utc>>) -> String {
    let base = base_url.trim_end_matches('/');
    match sent_at {
        Some(sent_at) => format!(
            "{}/api/track?id={}&sentAt={}",
            base,
            tracking_id,
            sent_at.timestamp_millis()
        ),
        None => format!("{}/api/track?id={}", base, tracking_id),
    }
}
