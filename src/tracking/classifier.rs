//! Automated-load detection with a configurable elapsed-time threshold

use chrono::{DateTime, Duration, TimeZone, Utc};

/// Outcome of classifying a single pixel fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub is_automated_load: bool,
}

/// Separates provider image prefetches from human opens
///
/// Mail providers fetch remote images within seconds of delivery, before
/// anyone has looked at the message. A fetch that lands sooner than
/// `threshold` after the declared send time is labelled an automated load.
#[derive(Debug, Clone, Copy)]
pub struct EventClassifier {
    threshold: Duration,
}

impl EventClassifier {
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    pub fn with_defaults() -> Self {
        Self::new(Duration::seconds(30))
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Classify a fetch observed at `observed_at`
    ///
    /// # Rules
    /// - No send time: genuine (no baseline to measure against)
    /// - `observed_at - sent_at < threshold`: automated load
    /// - Otherwise: genuine
    ///
    /// Negative elapsed time (clock skew) is below the threshold and therefore
    /// automated. Never fails.
    pub fn classify(
        &self,
        message_id: &str,
        observed_at: DateTime<Utc>,
        sent_at: Option<DateTime<Utc>>,
    ) -> Classification {
        let Some(sent_at) = sent_at else {
            return Classification { is_automated_load: false };
        };

        let elapsed = observed_at.signed_duration_since(sent_at);
        let is_automated_load = elapsed < self.threshold;

        log::debug!(
            "Classified fetch for {}: elapsed={}ms automated={}",
            message_id,
            elapsed.num_milliseconds(),
            is_automated_load
        );

        Classification { is_automated_load }
    }
}

impl Default for EventClassifier {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Parse the `sentAt` query parameter (epoch milliseconds)
///
/// Returns `None` for anything missing, blank, non-numeric or out of range.
pub fn parse_sent_at(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let millis: i64 = raw?.trim().parse().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}
