//! Tracking message creation and cascade deletion

use super::ids::{generate_tracking_id, tracking_url};
use super::store::{EventStore, MessageStore, StoreError};
use super::types::TrackingMessage;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

pub const DEFAULT_LABEL: &str = "Unnamed Email";

/// Collision retries before giving up on ID generation
const MAX_ID_ATTEMPTS: usize = 5;

/// Caller-supplied fields for a new tracking message
#[derive(Debug, Clone, Default)]
pub struct NewMessage {
    pub label: Option<String>,
    pub recipient: Option<String>,
    pub subject: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPixel {
    pub tracking_id: String,
    pub tracking_url: String,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionReport {
    pub deleted_message: bool,
    pub deleted_events: usize,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Creates tracking messages and deletes them together with their events
pub struct MessageRegistry {
    messages: Arc<dyn MessageStore>,
    events: Arc<dyn EventStore>,
    base_url: String,
}

impl MessageRegistry {
    pub fn new(
        messages: Arc<dyn MessageStore>,
        events: Arc<dyn EventStore>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            messages,
            events,
            base_url: base_url.into(),
        }
    }

    pub async fn create_message(&self, request: NewMessage) -> Result<GeneratedPixel, StoreError> {
        self.create_message_at(request, Utc::now()).await
    }

    /// Register a new message created at `created_at`
    pub async fn create_message_at(
        &self,
        request: NewMessage,
        created_at: DateTime<Utc>,
    ) -> Result<GeneratedPixel, StoreError> {
        let label = non_blank(request.label).unwrap_or_else(|| DEFAULT_LABEL.to_string());

        let mut attempt = 0;
        let id = loop {
            attempt += 1;
            let candidate = generate_tracking_id();
            if self.messages.get_message(&candidate).await?.is_none() {
                break candidate;
            }
            if attempt >= MAX_ID_ATTEMPTS {
                return Err(StoreError::Database(format!(
                    "No free tracking id after {} attempts",
                    MAX_ID_ATTEMPTS
                )));
            }
            log::debug!("Tracking id collision on {}, retrying", candidate);
        };

        let message = TrackingMessage {
            id: id.clone(),
            label: label.clone(),
            recipient: non_blank(request.recipient),
            subject: non_blank(request.subject),
            created_at,
            sent_at: request.sent_at,
        };
        self.messages.insert_message(&message).await?;

        log::info!("✅ Created tracking pixel {} ({})", id, label);

        Ok(GeneratedPixel {
            tracking_url: tracking_url(&self.base_url, &id, message.sent_at),
            tracking_id: id,
            label,
        })
    }

    /// Delete a message and every event recorded for it
    ///
    /// Events are removed even when the message row no longer exists.
    pub async fn delete_message(&self, id: &str) -> Result<DeletionReport, StoreError> {
        let deleted_message = self.messages.delete_message(id).await?;
        let deleted_events = self.events.delete_by_message(id).await?;

        log::info!(
            "🗑️  Deleted tracking pixel {} (message: {}, events: {})",
            id,
            deleted_message,
            deleted_events
        );

        Ok(DeletionReport {
            deleted_message,
            deleted_events,
        })
    }
}
