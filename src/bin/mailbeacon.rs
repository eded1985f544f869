//! mailbeacon CLI - drives the tracker against a SQLite database
//!
//! ## Usage
//!
//! ```bash
//! mailbeacon create --label "Launch" [--recipient R] [--subject S] [--sent-at-now]
//! mailbeacon track --id ID [--sent-at MS] [--ip IP] [--user-agent UA] [--referrer REF]
//! mailbeacon stats --id ID
//! mailbeacon analytics
//! mailbeacon recent [--limit N]
//! mailbeacon delete --id ID
//! mailbeacon export --out PATH
//! mailbeacon import --file PATH
//! ```
//!
//! Results are printed as pretty JSON on stdout; logs go to stderr.
//!
//! ## Environment Variables
//!
//! - MAILBEACON_DB_PATH - SQLite database path (default: data/mailbeacon.db)
//! - AUTOMATED_LOAD_THRESHOLD_SECS - Automated-load window (default: 30)
//! - RECENT_EVENTS_LIMIT - Fleet analytics window size (default: 100)
//! - STORE_TIMEOUT_MS - Per store call timeout (default: 5000)
//! - TRACKING_BASE_URL - Base of generated tracking URLs (default: http://localhost:3000)
//! - INCLUDE_AUTOMATED_LOADS - Count automated loads in fleet analytics (default: false)
//! - RUST_LOG - Logging level (optional, default: info)

use chrono::Utc;
use mailbeacon::analytics::EngineError;
use mailbeacon::persistence::save_snapshot;
use mailbeacon::tracking::{
    EventClassifier, EventStore, IngestionService, MessageRegistry, NewMessage, OpenEvent,
    SqliteStore, TrackRequest,
};
use mailbeacon::{AnalyticsEngine, TrackerConfig};
use serde::Serialize;
use serde_json::json;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

const USAGE: &str = "usage: mailbeacon <create|track|stats|analytics|recent|delete|export|import> [options]";

/// Value following `flag`, e.g. `--id abc123`
fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|idx| args.get(idx + 1))
        .cloned()
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn required(args: &[String], flag: &str) -> Result<String, Box<dyn std::error::Error>> {
    arg_value(args, flag).ok_or_else(|| format!("missing required {} argument\n{}", flag, USAGE).into())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env may set RUST_LOG
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = TrackerConfig::from_env();
    let args: Vec<String> = env::args().skip(1).collect();
    let command = args.first().cloned().ok_or(USAGE)?;

    log::debug!("📁 Database: {}", config.db_path);

    let store = Arc::new(SqliteStore::open(&config.db_path)?);
    let events: Arc<dyn EventStore> = store.clone();

    match command.as_str() {
        "create" => {
            let registry = MessageRegistry::new(store.clone(), events, config.tracking_base_url.clone());
            let request = NewMessage {
                label: arg_value(&args, "--label"),
                recipient: arg_value(&args, "--recipient"),
                subject: arg_value(&args, "--subject"),
                sent_at: has_flag(&args, "--sent-at-now").then(Utc::now),
            };
            let pixel = registry.create_message(request).await?;
            print_json(&pixel)?;
        }

        "track" => {
            let classifier = EventClassifier::new(config.automated_load_threshold());
            let service = IngestionService::new(events, classifier, config.store_timeout());
            let request = TrackRequest {
                id: Some(required(&args, "--id")?),
                sent_at: arg_value(&args, "--sent-at"),
                forwarded_for: arg_value(&args, "--ip"),
                user_agent: arg_value(&args, "--user-agent"),
                referrer: arg_value(&args, "--referrer"),
            };
            let response = service.handle_track(request).await;
            print_json(&json!({
                "logged": response.logged,
                "bytes": response.body.len(),
            }))?;
        }

        "stats" => {
            let id = required(&args, "--id")?;
            let engine = AnalyticsEngine::new(events, store.clone(), &config);
            match engine.get_message_report(&id).await {
                Ok(report) => print_json(&report)?,
                Err(EngineError::MessageNotFound(_)) => {
                    print_json(&json!({ "error": "Pixel not found" }))?;
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
        }

        "analytics" => {
            let engine = AnalyticsEngine::new(events, store.clone(), &config);
            let analytics = engine.get_fleet_analytics().await?;
            print_json(&analytics)?;
        }

        "recent" => {
            let limit = arg_value(&args, "--limit")
                .and_then(|s| s.parse().ok())
                .unwrap_or(config.recent_events_limit);
            let recent = events.list_recent(limit).await?;
            print_json(&recent)?;
        }

        "delete" => {
            let id = required(&args, "--id")?;
            let registry = MessageRegistry::new(store.clone(), events, config.tracking_base_url.clone());
            let report = registry.delete_message(&id).await?;
            print_json(&report)?;
            if !report.deleted_message {
                log::warn!("Pixel not found: {}", id);
                std::process::exit(1);
            }
        }

        "export" => {
            let out = PathBuf::from(required(&args, "--out")?);
            let engine = AnalyticsEngine::new(events, store.clone(), &config);
            let snapshot = engine.get_dashboard_snapshot().await?;
            save_snapshot(&snapshot, &out)?;
            print_json(&json!({
                "messages": snapshot.messages.len(),
                "recentEvents": snapshot.recent_events.len(),
                "path": out.display().to_string(),
            }))?;
        }

        "import" => {
            let file = required(&args, "--file")?;
            let contents = tokio::fs::read_to_string(&file).await?;

            let mut imported = 0usize;
            let mut skipped = 0usize;
            for line in contents.lines().filter(|l| !l.trim().is_empty()) {
                match OpenEvent::from_jsonl(line) {
                    Ok(event) => {
                        events.append(&event).await?;
                        imported += 1;
                    }
                    Err(e) => {
                        log::warn!("Skipping malformed event line: {} ({})", line, e);
                        skipped += 1;
                    }
                }
            }

            log::info!("✅ Imported {} events from {} ({} skipped)", imported, file, skipped);
            print_json(&json!({ "imported": imported, "skipped": skipped }))?;
        }

        other => {
            return Err(format!("unknown command: {}\n{}", other, USAGE).into());
        }
    }

    Ok(())
}
