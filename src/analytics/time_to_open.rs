//! Latency from message creation to genuine open

use crate::tracking::{OpenEvent, TrackingMessage};

/// Median whole minutes between `message.created_at` and each genuine open
///
/// Minutes truncate toward zero. Opens observed before creation give
/// negative values and are kept. `None` when there is no genuine open.
pub fn compute_time_to_open(message: &TrackingMessage, events: &[OpenEvent]) -> Option<f64> {
    let mut minutes: Vec<i64> = events
        .iter()
        .filter(|e| e.message_id == message.id && e.is_genuine())
        .map(|e| (e.observed_at - message.created_at).num_minutes())
        .collect();

    if minutes.is_empty() {
        return None;
    }

    minutes.sort_unstable();
    Some(median_of_sorted(&minutes))
}

fn median_of_sorted(sorted: &[i64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    } else {
        sorted[mid] as f64
    }
}
