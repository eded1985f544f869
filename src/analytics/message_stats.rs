//! Per-message open statistics

use crate::tracking::OpenEvent;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// Derived statistics for one tracking message; recomputed on every read
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageStatistics {
    pub message_id: String,
    /// Every fetch, automated loads included
    pub total_opens: usize,
    pub genuine_opens: usize,
    pub automated_opens: usize,
    /// Distinct source IPs among genuine opens
    pub unique_opens: usize,
    pub first_genuine_open_at: Option<DateTime<Utc>>,
    pub last_genuine_open_at: Option<DateTime<Utc>>,
}

/// Compute statistics for `message_id` from a newest-first event list
///
/// Events for other messages are ignored. Uniqueness is by source IP, so
/// recipients behind a shared NAT collapse into one and a recipient hopping
/// networks counts more than once.
///
/// First/last genuine opens are read positionally from the newest-first
/// input: the last genuine element is the earliest open and the first
/// genuine element is the most recent.
pub fn compute_message_statistics(message_id: &str, events: &[OpenEvent]) -> MessageStatistics {
    let matching: Vec<&OpenEvent> = events
        .iter()
        .filter(|e| e.message_id == message_id)
        .collect();

    let genuine: Vec<&OpenEvent> = matching.iter().copied().filter(|e| e.is_genuine()).collect();

    let unique_ips: HashSet<&str> = genuine.iter().map(|e| e.source_ip.as_str()).collect();

    MessageStatistics {
        message_id: message_id.to_string(),
        total_opens: matching.len(),
        genuine_opens: genuine.len(),
        automated_opens: matching.len() - genuine.len(),
        unique_opens: unique_ips.len(),
        first_genuine_open_at: genuine.last().map(|e| e.observed_at),
        last_genuine_open_at: genuine.first().map(|e| e.observed_at),
    }
}
