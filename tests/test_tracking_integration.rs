//! Integration tests: create → track → report → delete against SQLite
//!
//! Exercises the public API end to end:
//! - MessageRegistry creates messages and builds tracking URLs
//! - IngestionService classifies fetches relative to sentAt
//! - AnalyticsEngine reports per-message and fleet statistics
//! - Deletion cascades to the event log
//! - Dashboard snapshots survive a save/load cycle

#[cfg(test)]
mod tracking_integration_tests {
    use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
    use mailbeacon::analytics::{AnalyticsEngine, EngineError};
    use mailbeacon::persistence::{load_snapshot, save_snapshot};
    use mailbeacon::tracking::{
        EventClassifier, EventStore, IngestionService, MessageRegistry, MessageStore, NewMessage,
        SqliteStore, TrackRequest, TRANSPARENT_GIF,
    };
    use mailbeacon::TrackerConfig;
    use std::sync::Arc;
    use tempfile::tempdir;

    const CHROME_DESKTOP: &str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36";
    const IPHONE_MAIL: &str =
        "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148";

    fn sent_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
    }

    fn clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 18, 0, 0).unwrap()
    }

    fn config_for(db_path: &str) -> TrackerConfig {
        TrackerConfig {
            db_path: db_path.to_string(),
            automated_load_threshold_secs: 30,
            recent_events_limit: 100,
            store_timeout_ms: 2_000,
            tracking_base_url: "https://track.example.com/".to_string(),
            include_automated_loads: false,
        }
    }

    fn fetch(id: &str, ip: &str, user_agent: &str) -> TrackRequest {
        TrackRequest {
            id: Some(id.to_string()),
            sent_at: Some(sent_time().timestamp_millis().to_string()),
            forwarded_for: Some(ip.to_string()),
            user_agent: Some(user_agent.to_string()),
            referrer: None,
        }
    }

    #[tokio::test]
    async fn test_full_message_lifecycle() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("tracker.db");
        let config = config_for(db_path.to_str().unwrap());

        let store = Arc::new(SqliteStore::open(&db_path).unwrap());
        let registry = MessageRegistry::new(store.clone(), store.clone(), config.tracking_base_url.clone());
        let ingestion = IngestionService::new(
            store.clone(),
            EventClassifier::new(config.automated_load_threshold()),
            config.store_timeout(),
        );
        let engine =
            AnalyticsEngine::new_with_clock(store.clone(), store.clone(), &config, Box::new(clock));

        // 1. Create the message
        let pixel = registry
            .create_message_at(
                NewMessage {
                    label: Some("Quarterly report".to_string()),
                    recipient: Some("cfo@example.com".to_string()),
                    subject: None,
                    sent_at: Some(sent_time()),
                },
                sent_time(),
            )
            .await
            .unwrap();

        assert_eq!(pixel.tracking_id.len(), 8);
        assert_eq!(
            pixel.tracking_url,
            format!(
                "https://track.example.com/api/track?id={}&sentAt={}",
                pixel.tracking_id,
                sent_time().timestamp_millis()
            )
        );

        // 2. Provider prefetch 10s after send, then three human opens
        let id = pixel.tracking_id.as_str();
        let fetches = [
            (10, "66.249.84.1", "GoogleImageProxy"),
            (60, "1.2.3.4", CHROME_DESKTOP),
            (15 * 60, "1.2.3.4", CHROME_DESKTOP),
            (45 * 60, "5.6.7.8", IPHONE_MAIL),
        ];
        for (secs, ip, ua) in fetches {
            let response = ingestion
                .handle_track_at(fetch(id, ip, ua), sent_time() + Duration::seconds(secs))
                .await;
            assert_eq!(response.body, TRANSPARENT_GIF);
            assert!(response.logged);
        }

        // 3. Per-message report
        let report = engine.get_message_report(id).await.unwrap();
        assert_eq!(report.message.recipient.as_deref(), Some("cfo@example.com"));
        assert_eq!(report.statistics.total_opens, 4);
        assert_eq!(report.statistics.genuine_opens, 3);
        assert_eq!(report.statistics.automated_opens, 1);
        assert_eq!(report.statistics.unique_opens, 2);
        assert_eq!(
            report.statistics.first_genuine_open_at,
            Some(sent_time() + Duration::seconds(60))
        );
        assert_eq!(
            report.statistics.last_genuine_open_at,
            Some(sent_time() + Duration::seconds(45 * 60))
        );
        // Genuine opens at 1, 15 and 45 minutes
        assert_eq!(report.median_minutes_to_open, Some(15.0));
        assert!(report.events[0].observed_at > report.events[3].observed_at);
        assert!(report.events[3].is_automated_load);

        // 4. Delete cascades to events
        let deletion = registry.delete_message(id).await.unwrap();
        assert!(deletion.deleted_message);
        assert_eq!(deletion.deleted_events, 4);
        assert!(store.list_by_message(id).await.unwrap().is_empty());
        assert!(matches!(
            engine.get_message_report(id).await,
            Err(EngineError::MessageNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_fleet_analytics_across_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("tracker.db");
        let config = config_for(db_path.to_str().unwrap());

        let (opened_id, unopened_id) = {
            let store = Arc::new(SqliteStore::open(&db_path).unwrap());
            let registry =
                MessageRegistry::new(store.clone(), store.clone(), config.tracking_base_url.clone());
            let ingestion = IngestionService::new(
                store.clone(),
                EventClassifier::with_defaults(),
                config.store_timeout(),
            );

            let opened = registry
                .create_message_at(
                    NewMessage {
                        label: Some("Launch".to_string()),
                        sent_at: Some(sent_time()),
                        ..Default::default()
                    },
                    sent_time(),
                )
                .await
                .unwrap();
            let unopened = registry
                .create_message_at(NewMessage::default(), sent_time())
                .await
                .unwrap();
            assert_eq!(unopened.label, "Unnamed Email");

            ingestion
                .handle_track_at(
                    fetch(&opened.tracking_id, "10.0.0.1", "bot"),
                    sent_time() + Duration::seconds(5),
                )
                .await;
            ingestion
                .handle_track_at(
                    fetch(&opened.tracking_id, "1.2.3.4", IPHONE_MAIL),
                    sent_time() + Duration::hours(2),
                )
                .await;

            (opened.tracking_id, unopened.tracking_id)
        };

        // Reopen from disk
        let store = Arc::new(SqliteStore::open(&db_path).unwrap());
        assert_eq!(store.list_messages().await.unwrap().len(), 2);
        assert!(store.get_message(&unopened_id).await.unwrap().is_some());

        let engine = AnalyticsEngine::new_with_clock(store.clone(), store, &config, Box::new(clock));
        let tz = FixedOffset::west_opt(4 * 3600).unwrap();
        let analytics = engine.get_fleet_analytics_in(&tz).await.unwrap();

        assert_eq!(analytics.total_messages, 2);
        assert_eq!(analytics.opened_messages, 1);
        assert_eq!(analytics.open_rate, "50.0");
        assert_eq!(analytics.top_messages.len(), 1);
        assert_eq!(analytics.top_messages[0].message_id, opened_id);
        assert_eq!(analytics.top_messages[0].label, "Launch");
        assert_eq!(analytics.top_messages[0].count, 1);
        // 11:00 UTC is 07:00 at UTC-4
        assert_eq!(analytics.opens_by_hour[7], 1);
        assert_eq!(analytics.opens_by_hour.iter().sum::<usize>(), 1);
        assert_eq!(analytics.opens_over_time.len(), 14);
        assert_eq!(analytics.opens_over_time[13].count, 1);
        assert_eq!(analytics.open_counts.automated_loads, 1);
        assert_eq!(analytics.open_counts.genuine_opens, 1);
    }

    #[tokio::test]
    async fn test_fetch_without_id_still_serves_pixel() {
        let dir = tempdir().unwrap();
        let store = Arc::new(SqliteStore::open(dir.path().join("tracker.db")).unwrap());
        let ingestion = IngestionService::new(
            store.clone(),
            EventClassifier::with_defaults(),
            std::time::Duration::from_secs(2),
        );

        let response = ingestion.handle_track(TrackRequest::default()).await;

        assert_eq!(response.body, TRANSPARENT_GIF);
        assert!(!response.logged);
        assert!(store.list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dashboard_export_round_trip() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("tracker.db");
        let config = config_for(db_path.to_str().unwrap());
        let store = Arc::new(SqliteStore::open(&db_path).unwrap());
        let registry = MessageRegistry::new(store.clone(), store.clone(), config.tracking_base_url.clone());
        let ingestion = IngestionService::new(
            store.clone(),
            EventClassifier::with_defaults(),
            config.store_timeout(),
        );

        let pixel = registry
            .create_message_at(NewMessage::default(), sent_time())
            .await
            .unwrap();
        ingestion
            .handle_track_at(
                fetch(&pixel.tracking_id, "1.2.3.4", CHROME_DESKTOP),
                sent_time() + Duration::minutes(3),
            )
            .await;

        let engine = AnalyticsEngine::new_with_clock(store.clone(), store, &config, Box::new(clock));
        let snapshot = engine.get_dashboard_snapshot().await.unwrap();
        assert_eq!(snapshot.messages.len(), 1);
        assert_eq!(snapshot.recent_events.len(), 1);
        assert_eq!(snapshot.captured_at, clock());

        let out = dir.path().join("export").join("dashboard.json");
        save_snapshot(&snapshot, &out).unwrap();
        assert_eq!(load_snapshot(&out).unwrap(), Some(snapshot));
    }
}
