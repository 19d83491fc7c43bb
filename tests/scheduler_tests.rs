use bangumi_rss::config::{Config, SchedulerConfig};
use bangumi_rss::db::Store;
use bangumi_rss::scheduler::Scheduler;
use bangumi_rss::services::IngestService;
use std::time::Duration;

async fn setup_ingest() -> IngestService {
    let db_path =
        std::env::temp_dir().join(format!("bangumi-scheduler-test-{}.db", uuid::Uuid::new_v4()));
    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());

    let store = Store::new(&config.general.database_path)
        .await
        .expect("failed to create store");
    IngestService::from_config(store, &config).expect("failed to build ingest service")
}

#[tokio::test]
async fn test_disabled_scheduler_returns_immediately() {
    let scheduler = Scheduler::new(
        setup_ingest().await,
        SchedulerConfig {
            enabled: false,
            ..SchedulerConfig::default()
        },
    );

    scheduler.start().await.unwrap();
    assert!(!scheduler.is_running().await);
}

#[tokio::test]
async fn test_interval_scheduler_stops_on_request() {
    let scheduler = Scheduler::new(
        setup_ingest().await,
        SchedulerConfig {
            enabled: true,
            tick_seconds: 1,
            cron_expression: None,
        },
    );

    let handle = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.start().await })
    };

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(scheduler.is_running().await);

    scheduler.stop().await;
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler did not stop")
        .expect("scheduler task panicked");
    assert!(result.is_ok());
    assert!(!scheduler.is_running().await);
}

#[tokio::test]
async fn test_run_once_with_no_sources() {
    let scheduler = Scheduler::new(setup_ingest().await, SchedulerConfig::default());

    let report = scheduler.run_once(true).await.unwrap();
    assert!(report.sources.is_empty());
    assert!(report.failures.is_empty());
}
