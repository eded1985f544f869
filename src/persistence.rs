use {
    crate::tracking::{OpenEvent, TrackingMessage},
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::{fs, path::Path},
};

/// Everything the dashboard renders from: all messages plus the recent window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    /// Newest-created first
    pub messages: Vec<TrackingMessage>,
    /// Newest first, at most the configured recent limit
    pub recent_events: Vec<OpenEvent>,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug)]
pub enum SnapshotError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl From<std::io::Error> for SnapshotError {
    fn from(err: std::io::Error) -> Self {
        SnapshotError::Io(err)
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(err: serde_json::Error) -> Self {
        SnapshotError::Json(err)
    }
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Io(e) => write!(f, "Snapshot I/O error: {}", e),
            SnapshotError::Json(e) => write!(f, "Snapshot JSON error: {}", e),
        }
    }
}

impl std::error::Error for SnapshotError {}

/// Save a dashboard snapshot as pretty JSON, creating parent directories
pub fn save_snapshot(snapshot: &DashboardSnapshot, file_path: &Path) -> Result<(), SnapshotError> {
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(file_path, json)?;

    log::info!(
        "💾 Saved snapshot with {} messages and {} events to {}",
        snapshot.messages.len(),
        snapshot.recent_events.len(),
        file_path.display()
    );
    Ok(())
}

/// Load a dashboard snapshot; `None` when the file does not exist
pub fn load_snapshot(file_path: &Path) -> Result<Option<DashboardSnapshot>, SnapshotError> {
    if !file_path.exists() {
        log::info!("No existing snapshot file found: {}", file_path.display());
        return Ok(None);
    }

    let json = fs::read_to_string(file_path)?;
    let snapshot: DashboardSnapshot = serde_json::from_str(&json)?;

    log::debug!(
        "Loaded snapshot captured at {} from {}",
        snapshot.captured_at,
        file_path.display()
    );
    Ok(Some(snapshot))
}
