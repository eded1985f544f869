//! Tracking message and open event records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;

/// A logical email instance carrying one embedded tracking pixel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingMessage {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Declared send time, when the sender encoded one in the tracking URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}

/// One fetch of a tracking pixel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenEvent {
    /// Not required to reference an existing message
    pub message_id: String,
    pub observed_at: DateTime<Utc>,
    pub source_ip: String,
    pub user_agent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    pub is_automated_load: bool,
}

impl OpenEvent {
    /// Parse an OpenEvent from a JSONL line
    pub fn from_jsonl(line: &str) -> Result<Self, Box<dyn Error>> {
        let event: OpenEvent = serde_json::from_str(line)?;
        Ok(event)
    }

    /// Check if this event is a human open rather than a provider prefetch
    pub fn is_genuine(&self) -> bool {
        !self.is_automated_load
    }
}
