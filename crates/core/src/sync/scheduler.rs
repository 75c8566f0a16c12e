//! Background scheduler driving sync cycles.
//!
//! One loop task per scheduler: wait out the warm-up, then alternate between
//! running a cycle and waiting the configured interval. Cycles never overlap
//! because the next wait only starts once the previous cycle has returned.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::cycle::CycleRunner;
use super::types::{SchedulerStatus, SyncError};
use crate::config::SyncConfig;
use crate::metrics::SCHEDULER_RUNNING;

/// Delay between scheduler start and the first cycle.
pub const DEFAULT_WARMUP: Duration = Duration::from_secs(30);

/// Scheduler timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub warmup: Duration,
    /// Wait between the end of one cycle and the start of the next.
    pub interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for SchedulerConfig {
    fn from(config: &SyncConfig) -> Self {
        Self {
            warmup: DEFAULT_WARMUP,
            interval: config.interval(),
        }
    }
}

/// Owns the background sync loop.
pub struct SyncScheduler {
    runner: Arc<CycleRunner>,
    config: SchedulerConfig,
    cancel: CancellationToken,
    running: Arc<AtomicBool>,
    status: Arc<RwLock<SchedulerStatus>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SyncScheduler {
    pub fn new(runner: Arc<CycleRunner>, config: SchedulerConfig) -> Self {
        Self {
            runner,
            config,
            cancel: CancellationToken::new(),
            running: Arc::new(AtomicBool::new(false)),
            status: Arc::new(RwLock::new(SchedulerStatus::default())),
            handle: Mutex::new(None),
        }
    }

    /// Start the scheduler loop. A stopped scheduler cannot be restarted.
    pub async fn start(&self) {
        if self.cancel.is_cancelled() {
            warn!("Sync scheduler was stopped and cannot be restarted");
            return;
        }
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Sync scheduler already running");
            return;
        }

        info!(
            "Starting sync scheduler (warm-up {:?}, interval {:?})",
            self.config.warmup, self.config.interval
        );
        SCHEDULER_RUNNING.set(1);

        let handle = tokio::spawn(run_loop(
            Arc::clone(&self.runner),
            self.config,
            self.cancel.clone(),
            Arc::clone(&self.running),
            Arc::clone(&self.status),
        ));
        *self.handle.lock().await = Some(handle);
    }

    /// Signal cancellation and wait for the loop to exit.
    ///
    /// A cycle in progress runs to completion (its delays are cut short);
    /// no further cycle is started.
    pub async fn stop(&self) {
        self.cancel.cancel();

        let Some(handle) = self.handle.lock().await.take() else {
            warn!("Sync scheduler not running");
            return;
        };

        info!("Stopping sync scheduler");
        if let Err(e) = handle.await {
            error!("Sync scheduler loop ended abnormally: {}", e);
        }
        self.running.store(false, Ordering::SeqCst);
        SCHEDULER_RUNNING.set(0);
        info!("Sync scheduler stopped");
    }

    /// Snapshot of the scheduler state.
    pub async fn status(&self) -> SchedulerStatus {
        let mut status = self.status.read().await.clone();
        status.running = self.running.load(Ordering::Relaxed);
        status
    }

    /// Token cancelled when the scheduler stops.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }
}

async fn run_loop(
    runner: Arc<CycleRunner>,
    config: SchedulerConfig,
    cancel: CancellationToken,
    running: Arc<AtomicBool>,
    status: Arc<RwLock<SchedulerStatus>>,
) {
    info!("Sync loop started");

    if wait_or_cancel(&cancel, config.warmup).await {
        loop {
            run_cycle(&runner, &cancel, &status).await;

            info!("Next sync cycle in {:?}", config.interval);
            if !wait_or_cancel(&cancel, config.interval).await {
                break;
            }
        }
    }

    running.store(false, Ordering::SeqCst);
    info!("Sync loop stopped");
}

/// Sleep for `delay`. Returns `false` if cancelled first.
async fn wait_or_cancel(cancel: &CancellationToken, delay: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

/// Run one cycle in its own task so a panic surfaces as a join error.
async fn run_cycle(
    runner: &Arc<CycleRunner>,
    cancel: &CancellationToken,
    status: &RwLock<SchedulerStatus>,
) {
    status.write().await.last_cycle_started_at = Some(Utc::now());
    info!("Starting sync cycle");

    let task = {
        let runner = Arc::clone(runner);
        let cancel = cancel.clone();
        tokio::spawn(async move { runner.run(&cancel).await })
    };

    let result = match task.await {
        Ok(result) => result,
        Err(e) => Err(SyncError::TaskFailed(e.to_string())),
    };

    let mut status = status.write().await;
    status.cycles_completed += 1;
    status.last_cycle_finished_at = Some(Utc::now());
    match result {
        Ok(outcome) => {
            status.last_outcome = Some(outcome);
            status.last_error = None;
        }
        Err(e) => {
            error!("Sync cycle failed: {}", e);
            status.last_error = Some(e.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ExternalShowDetail, ProviderError, ShowPage, ShowProvider};
    use crate::sync::CycleConfig;
    use crate::testing::{fixtures, MockCatalogStore, MockShowProvider};
    use async_trait::async_trait;
    use tokio::time::{sleep, Instant};

    const INTERVAL: Duration = Duration::from_secs(600);

    fn scheduler(provider: Arc<dyn ShowProvider>, store: Arc<MockCatalogStore>) -> SyncScheduler {
        let runner = CycleRunner::new(provider, store, CycleConfig::default());
        SyncScheduler::new(
            Arc::new(runner),
            SchedulerConfig {
                warmup: DEFAULT_WARMUP,
                interval: INTERVAL,
            },
        )
    }

    struct PanickingProvider;

    #[async_trait]
    impl ShowProvider for PanickingProvider {
        async fn fetch_page(&self, _page: u32) -> Result<ShowPage, ProviderError> {
            panic!("provider exploded");
        }

        async fn fetch_detail(
            &self,
            _external_id: u64,
        ) -> Result<Option<ExternalShowDetail>, ProviderError> {
            Ok(None)
        }
    }

    #[test]
    fn test_scheduler_config_from_sync_config() {
        let config = SchedulerConfig::from(&SyncConfig { interval_hours: 2.0 });
        assert_eq!(config.warmup, Duration::from_secs(30));
        assert_eq!(config.interval, Duration::from_secs(7200));

        assert_eq!(
            SchedulerConfig::default().interval,
            Duration::from_secs(6 * 3600)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_cycle_waits_for_warmup() {
        let provider = Arc::new(MockShowProvider::new());
        let scheduler = scheduler(provider.clone(), Arc::new(MockCatalogStore::new()));

        scheduler.start().await;
        assert!(scheduler.status().await.running);

        sleep(Duration::from_secs(29)).await;
        assert!(provider.requested_pages().await.is_empty());

        sleep(Duration::from_secs(2)).await;
        assert_eq!(provider.requested_pages().await, vec![1]);
        assert_eq!(scheduler.status().await.cycles_completed, 1);

        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycles_repeat_after_interval() {
        let provider = Arc::new(MockShowProvider::new());
        provider
            .set_pages(vec![vec![fixtures::show_summary(1, "Lost")]])
            .await;
        let scheduler = scheduler(provider.clone(), Arc::new(MockCatalogStore::new()));

        scheduler.start().await;
        sleep(DEFAULT_WARMUP + Duration::from_secs(1)).await;
        assert_eq!(scheduler.status().await.cycles_completed, 1);

        sleep(INTERVAL).await;
        let status = scheduler.status().await;
        assert_eq!(status.cycles_completed, 2);
        let outcome = status.last_outcome.unwrap();
        assert_eq!(outcome.created, 0);
        assert_eq!(outcome.skipped(), 1);

        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_interval_is_immediate() {
        let provider = Arc::new(MockShowProvider::new());
        let scheduler = scheduler(provider.clone(), Arc::new(MockCatalogStore::new()));

        scheduler.start().await;
        sleep(DEFAULT_WARMUP + Duration::from_secs(1)).await;

        let before = Instant::now();
        scheduler.stop().await;

        assert!(before.elapsed() < Duration::from_secs(1));
        let status = scheduler.status().await;
        assert!(!status.running);
        assert_eq!(status.cycles_completed, 1);

        sleep(INTERVAL * 2).await;
        assert_eq!(provider.requested_pages().await, vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_warmup_runs_no_cycle() {
        let provider = Arc::new(MockShowProvider::new());
        let scheduler = scheduler(provider.clone(), Arc::new(MockCatalogStore::new()));

        scheduler.start().await;
        sleep(Duration::from_secs(5)).await;
        scheduler.stop().await;

        sleep(DEFAULT_WARMUP).await;
        assert!(provider.requested_pages().await.is_empty());
        assert_eq!(scheduler.status().await.cycles_completed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_cycle_does_not_stop_scheduler() {
        let provider = Arc::new(MockShowProvider::new());
        let store = Arc::new(MockCatalogStore::new());
        store.fail_next_begin();
        let scheduler = scheduler(provider.clone(), store);

        scheduler.start().await;
        sleep(DEFAULT_WARMUP + Duration::from_secs(1)).await;

        let status = scheduler.status().await;
        assert_eq!(status.cycles_completed, 1);
        assert!(status.last_error.unwrap().contains("catalog error"));
        assert!(status.running);

        // The failure does not shorten the wait before the next cycle.
        sleep(INTERVAL - Duration::from_secs(2)).await;
        assert_eq!(scheduler.status().await.cycles_completed, 1);

        sleep(Duration::from_secs(2)).await;
        let status = scheduler.status().await;
        assert_eq!(status.cycles_completed, 2);
        assert!(status.last_error.is_none());

        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_cycle_is_contained() {
        let scheduler = scheduler(Arc::new(PanickingProvider), Arc::new(MockCatalogStore::new()));

        scheduler.start().await;
        sleep(DEFAULT_WARMUP + Duration::from_secs(1)).await;

        let status = scheduler.status().await;
        assert!(status.running);
        assert_eq!(status.cycles_completed, 1);
        assert!(status.last_error.unwrap().contains("cycle task failed"));

        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent_and_stop_is_terminal() {
        let provider = Arc::new(MockShowProvider::new());
        let scheduler = scheduler(provider.clone(), Arc::new(MockCatalogStore::new()));

        scheduler.start().await;
        scheduler.start().await;
        sleep(DEFAULT_WARMUP + Duration::from_secs(1)).await;
        assert_eq!(provider.requested_pages().await, vec![1]);

        scheduler.stop().await;
        scheduler.start().await;
        assert!(!scheduler.status().await.running);
    }

    #[tokio::test]
    async fn test_cancellation_token_follows_stop() {
        let scheduler = scheduler(
            Arc::new(MockShowProvider::new()),
            Arc::new(MockCatalogStore::new()),
        );
        let token = scheduler.cancellation_token();
        assert!(!token.is_cancelled());

        scheduler.stop().await;
        assert!(token.is_cancelled());
    }
}
