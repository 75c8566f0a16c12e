//! Scheduler lifecycle integration tests.
//!
//! Configuration is loaded from TOML the way the daemon does it, then the
//! scheduler is driven through warm-up, repeated cycles and shutdown with
//! paused time.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use showsync_core::testing::{fixtures, MockShowProvider};
use showsync_core::{
    load_config_from_str, CatalogStore, CycleConfig, CycleRunner, SchedulerConfig, ShowProvider,
    SqliteCatalogStore, SyncScheduler,
};

fn build_scheduler(
    config_toml: &str,
    provider: Arc<MockShowProvider>,
    store: Arc<SqliteCatalogStore>,
) -> SyncScheduler {
    let config = load_config_from_str(config_toml).expect("Failed to parse config");
    let runner = CycleRunner::new(
        provider as Arc<dyn ShowProvider>,
        store as Arc<dyn CatalogStore>,
        CycleConfig::default(),
    );
    SyncScheduler::new(Arc::new(runner), SchedulerConfig::from(&config.sync))
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_runs_cycles_on_configured_interval() {
    let provider = Arc::new(MockShowProvider::new());
    provider
        .set_pages(vec![vec![
            fixtures::show_summary(1, "Dark"),
            fixtures::show_summary(2, "Ozark"),
        ]])
        .await;
    let store = Arc::new(SqliteCatalogStore::in_memory().unwrap());
    let scheduler = build_scheduler(
        "[sync]\ninterval_hours = 2\n",
        provider.clone(),
        store.clone(),
    );

    scheduler.start().await;

    sleep(Duration::from_secs(31)).await;
    let status = scheduler.status().await;
    assert!(status.running);
    assert_eq!(status.cycles_completed, 1);
    assert_eq!(status.last_outcome.as_ref().unwrap().created, 2);
    assert!(status.last_cycle_started_at.is_some());
    assert!(status.last_cycle_finished_at.is_some());
    assert_eq!(store.count().unwrap(), 2);

    sleep(Duration::from_secs(2 * 3600)).await;
    let status = scheduler.status().await;
    assert_eq!(status.cycles_completed, 2);
    assert_eq!(status.last_outcome.as_ref().unwrap().skipped(), 2);
    assert_eq!(store.count().unwrap(), 2);

    scheduler.stop().await;
    assert!(!scheduler.status().await.running);
}

#[tokio::test(start_paused = true)]
async fn test_unparsable_interval_falls_back_to_default() {
    let provider = Arc::new(MockShowProvider::new());
    let store = Arc::new(SqliteCatalogStore::in_memory().unwrap());
    let scheduler = build_scheduler(
        "[sync]\ninterval_hours = \"often\"\n",
        provider.clone(),
        store,
    );

    scheduler.start().await;
    sleep(Duration::from_secs(31)).await;
    assert_eq!(provider.requested_pages().await, vec![1]);

    sleep(Duration::from_secs(6 * 3600 - 2)).await;
    assert_eq!(provider.requested_pages().await, vec![1]);

    sleep(Duration::from_secs(2)).await;
    assert_eq!(provider.requested_pages().await, vec![1, 1]);

    scheduler.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_child_token_cancelled_on_stop() {
    let provider = Arc::new(MockShowProvider::new());
    let store = Arc::new(SqliteCatalogStore::in_memory().unwrap());
    let scheduler = build_scheduler("", provider.clone(), store);
    let token = scheduler.cancellation_token();

    scheduler.start().await;
    sleep(Duration::from_secs(10)).await;
    scheduler.stop().await;

    assert!(token.is_cancelled());
    sleep(Duration::from_secs(60)).await;
    assert!(provider.requested_pages().await.is_empty());
}
