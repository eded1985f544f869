//! Calendar bucketing of open events in a local time zone

use crate::tracking::OpenEvent;
use chrono::{Datelike, Duration, NaiveDate, TimeZone, Timelike};
use serde::Serialize;

pub const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Opens on one local calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    /// ISO calendar date (YYYY-MM-DD)
    pub date: NaiveDate,
    pub count: usize,
}

/// Fixed 7-bucket histogram, Sunday = 0 .. Saturday = 6
pub fn opens_by_weekday<'a, Tz: TimeZone>(
    events: impl IntoIterator<Item = &'a OpenEvent>,
    tz: &Tz,
) -> [usize; 7] {
    let mut buckets = [0usize; 7];
    for event in events {
        let day = event.observed_at.with_timezone(tz).weekday().num_days_from_sunday();
        buckets[day as usize] += 1;
    }
    buckets
}

/// Fixed 24-bucket histogram of local hour-of-day
pub fn opens_by_hour<'a, Tz: TimeZone>(
    events: impl IntoIterator<Item = &'a OpenEvent>,
    tz: &Tz,
) -> [usize; 24] {
    let mut buckets = [0usize; 24];
    for event in events {
        let hour = event.observed_at.with_timezone(tz).hour();
        buckets[hour as usize] += 1;
    }
    buckets
}

/// Per-day counts for the `days` calendar days ending on `today`
///
/// Always `days` entries, oldest first, zero-filled. An event lands in the
/// day whose local midnight-to-midnight span contains it; events outside the
/// window are ignored.
pub fn opens_over_time<'a, Tz: TimeZone>(
    events: impl IntoIterator<Item = &'a OpenEvent>,
    tz: &Tz,
    today: NaiveDate,
    days: usize,
) -> Vec<DailyCount> {
    if days == 0 {
        return Vec::new();
    }

    let first_day = today - Duration::days(days as i64 - 1);
    let mut series: Vec<DailyCount> = (0..days)
        .map(|offset| DailyCount {
            date: first_day + Duration::days(offset as i64),
            count: 0,
        })
        .collect();

    for event in events {
        let local_day = event.observed_at.with_timezone(tz).date_naive();
        let offset = local_day.signed_duration_since(first_day).num_days();
        if (0..days as i64).contains(&offset) {
            series[offset as usize].count += 1;
        }
    }

    series
}
