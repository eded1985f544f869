//! Shared SQLite PRAGMA configuration
//!
//! Every connection opened by the store goes through [`apply_optimized_pragmas`]
//! so the pixel write path and the dashboard read path see the same settings.

use rusqlite::Connection;

/// Apply WAL journaling and read-friendly tuning to a connection
///
/// - `journal_mode = WAL` (readers never block the append path)
/// - `synchronous = NORMAL`
/// - `temp_store = MEMORY`
/// - `mmap_size = 64 MiB`
/// - `cache_size = -16000` (~16 MiB)
/// - `wal_autocheckpoint = 1000` pages
/// - `busy_timeout = 5000` ms
pub fn apply_optimized_pragmas(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    conn.pragma_update(None, "mmap_size", 67_108_864i64)?;
    conn.pragma_update(None, "cache_size", -16_000i64)?;
    conn.pragma_update(None, "wal_autocheckpoint", 1_000i64)?;
    conn.pragma_update(None, "busy_timeout", 5_000i64)?;

    log::debug!("SQLite PRAGMAs applied (WAL, NORMAL, MEMORY, mmap, cache, autocheckpoint)");
    Ok(())
}
