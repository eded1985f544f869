//! Fleet-wide analytics over all messages and a recent event window

use super::bucketing::{opens_by_hour, opens_by_weekday, opens_over_time, DailyCount, WEEKDAY_NAMES};
use super::ranking::FrequencyCounter;
use super::user_agent::{classify_browser, classify_device, Browser, Device};
use crate::tracking::{OpenEvent, TrackingMessage};
use chrono::{NaiveDate, TimeZone};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Calendar days covered by `opens_over_time`
pub const ANALYTICS_WINDOW_DAYS: usize = 14;

pub const TOP_MESSAGES_LIMIT: usize = 5;

/// Label shown for ranked messages whose record no longer exists
pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalyticsOptions {
    /// Count automated loads in the fleet view as well
    pub include_automated_loads: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopMessage {
    pub message_id: String,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrowserCount {
    pub browser: Browser,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceCount {
    pub device: Device,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenCounts {
    pub automated_loads: usize,
    pub genuine_opens: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetAnalytics {
    pub total_messages: usize,
    pub opened_messages: usize,
    /// Percentage with one decimal, "0" for an empty fleet
    pub open_rate: String,
    pub opens_by_weekday: [usize; 7],
    pub weekday_names: [&'static str; 7],
    pub opens_by_hour: [usize; 24],
    pub top_messages: Vec<TopMessage>,
    pub browsers: Vec<BrowserCount>,
    pub devices: Vec<DeviceCount>,
    pub opens_over_time: Vec<DailyCount>,
    pub open_counts: OpenCounts,
}

/// Build the fleet view
///
/// `events` is the recent window, newest first. Only genuine events are
/// counted unless `options.include_automated_loads` is set; `open_counts`
/// always reports both kinds. Weekday, hour and day buckets use `tz`.
pub fn compute_fleet_analytics<Tz: TimeZone>(
    messages: &[TrackingMessage],
    events: &[OpenEvent],
    tz: &Tz,
    today: NaiveDate,
    options: AnalyticsOptions,
) -> FleetAnalytics {
    let counted: Vec<&OpenEvent> = events
        .iter()
        .filter(|e| options.include_automated_loads || e.is_genuine())
        .collect();

    let labels: HashMap<&str, &str> = messages
        .iter()
        .map(|m| (m.id.as_str(), m.label.as_str()))
        .collect();

    let opened: HashSet<&str> = counted
        .iter()
        .map(|e| e.message_id.as_str())
        .filter(|id| labels.contains_key(id))
        .collect();

    let top_messages = counted
        .iter()
        .map(|e| e.message_id.as_str())
        .collect::<FrequencyCounter<&str>>()
        .top(TOP_MESSAGES_LIMIT)
        .into_iter()
        .map(|(id, count)| TopMessage {
            message_id: id.to_string(),
            label: labels.get(id).copied().unwrap_or(UNKNOWN_LABEL).to_string(),
            count,
        })
        .collect();

    let browsers = counted
        .iter()
        .map(|e| classify_browser(&e.user_agent))
        .collect::<FrequencyCounter<Browser>>()
        .ranked()
        .into_iter()
        .map(|(browser, count)| BrowserCount { browser, count })
        .collect();

    let devices = counted
        .iter()
        .map(|e| classify_device(&e.user_agent))
        .collect::<FrequencyCounter<Device>>()
        .ranked()
        .into_iter()
        .map(|(device, count)| DeviceCount { device, count })
        .collect();

    let genuine_opens = events.iter().filter(|e| e.is_genuine()).count();

    FleetAnalytics {
        total_messages: messages.len(),
        opened_messages: opened.len(),
        open_rate: format_open_rate(opened.len(), messages.len()),
        opens_by_weekday: opens_by_weekday(counted.iter().copied(), tz),
        weekday_names: WEEKDAY_NAMES,
        opens_by_hour: opens_by_hour(counted.iter().copied(), tz),
        top_messages,
        browsers,
        devices,
        opens_over_time: opens_over_time(counted.iter().copied(), tz, today, ANALYTICS_WINDOW_DAYS),
        open_counts: OpenCounts {
            automated_loads: events.len() - genuine_opens,
            genuine_opens,
        },
    }
}

/// Percentage with one decimal, exact ties rounded up (6.25 → "6.3")
fn format_open_rate(opened: usize, total: usize) -> String {
    if total == 0 {
        return "0".to_string();
    }
    let (opened, total) = (opened as u128, total as u128);
    let tenths = (opened * 2_000 + total) / (total * 2);
    format!("{}.{}", tenths / 10, tenths % 10)
}
