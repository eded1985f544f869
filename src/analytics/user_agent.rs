//! User-agent sniffing by ordered substring checks
//!
//! The check order is load-bearing: Chrome-based user agents also carry a
//! "Safari" token, and reordering silently changes results for those strings.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Browser {
    Chrome,
    Firefox,
    Safari,
    Edge,
    Opera,
    #[serde(rename = "Internet Explorer")]
    InternetExplorer,
    Unknown,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chrome => "Chrome",
            Browser::Firefox => "Firefox",
            Browser::Safari => "Safari",
            Browser::Edge => "Edge",
            Browser::Opera => "Opera",
            Browser::InternetExplorer => "Internet Explorer",
            Browser::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Device {
    Mobile,
    Tablet,
    Desktop,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Mobile => "Mobile",
            Device::Tablet => "Tablet",
            Device::Desktop => "Desktop",
        }
    }
}

/// Classify the browser; first match wins
///
/// Chrome → Firefox → Safari (not Chrome) → Edge → Opera/OPR →
/// Trident/MSIE → Unknown
pub fn classify_browser(user_agent: &str) -> Browser {
    let ua = user_agent.to_lowercase();

    if ua.contains("chrome") {
        Browser::Chrome
    } else if ua.contains("firefox") {
        Browser::Firefox
    } else if ua.contains("safari") && !ua.contains("chrome") {
        Browser::Safari
    } else if ua.contains("edge") {
        Browser::Edge
    } else if ua.contains("opera") || ua.contains("opr") {
        Browser::Opera
    } else if ua.contains("trident") || ua.contains("msie") {
        Browser::InternetExplorer
    } else {
        Browser::Unknown
    }
}

/// Classify the device; Mobile → Tablet (incl. iPad) → Desktop
pub fn classify_device(user_agent: &str) -> Device {
    let ua = user_agent.to_lowercase();

    if ua.contains("mobile") {
        Device::Mobile
    } else if ua.contains("tablet") || ua.contains("ipad") {
        Device::Tablet
    } else {
        Device::Desktop
    }
}
