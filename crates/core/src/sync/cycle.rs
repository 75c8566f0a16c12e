//! One sync cycle: fetch ranked pages, reconcile every show, commit once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::reconciler::{Reconciler, StalenessPolicy};
use super::types::{fold_outcomes, CycleOutcome, SyncError};
use crate::catalog::CatalogStore;
use crate::metrics::{SYNC_CYCLES, SYNC_CYCLE_DURATION, SYNC_ITEMS};
use crate::provider::{fetch_pages, ShowProvider, PAGE_DELAY};

/// Tuning of a single cycle. Not externally configurable.
#[derive(Debug, Clone)]
pub struct CycleConfig {
    /// Maximum ranking pages fetched per cycle.
    pub max_pages: u32,
    /// Delay between page requests.
    pub page_delay: Duration,
    /// Pause after this many successfully processed items (0 disables).
    pub throttle_every: u32,
    /// Length of each throttle pause.
    pub throttle_delay: Duration,
    pub staleness: StalenessPolicy,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            max_pages: 3,
            page_delay: PAGE_DELAY,
            throttle_every: 5,
            throttle_delay: Duration::from_secs(2),
            staleness: StalenessPolicy::default(),
        }
    }
}

/// Runs sync cycles against a provider and a catalog store.
pub struct CycleRunner {
    provider: Arc<dyn ShowProvider>,
    store: Arc<dyn CatalogStore>,
    config: CycleConfig,
}

impl CycleRunner {
    pub fn new(
        provider: Arc<dyn ShowProvider>,
        store: Arc<dyn CatalogStore>,
        config: CycleConfig,
    ) -> Self {
        Self {
            provider,
            store,
            config,
        }
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    /// Run one cycle.
    ///
    /// `cancel` only interrupts the page and throttle delays. Item work
    /// already underway is finished and the commit still happens.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<CycleOutcome, SyncError> {
        let start = Instant::now();
        let result = self.run_cycle(cancel).await;

        let label = match &result {
            Ok(outcome) if outcome.attempted() == 0 => "empty",
            Ok(outcome) if !outcome.committed => "commit_failed",
            Ok(_) => "completed",
            Err(_) => "error",
        };
        SYNC_CYCLES.with_label_values(&[label]).inc();
        SYNC_CYCLE_DURATION
            .with_label_values(&[label])
            .observe(start.elapsed().as_secs_f64());

        result
    }

    async fn run_cycle(&self, cancel: &CancellationToken) -> Result<CycleOutcome, SyncError> {
        let mut session = self.store.begin()?;

        let items = fetch_pages(
            self.provider.as_ref(),
            self.config.max_pages,
            self.config.page_delay,
            cancel,
        )
        .await;

        if items.is_empty() {
            info!("Provider returned no shows, nothing to sync");
            return Ok(CycleOutcome::default());
        }

        info!("Reconciling {} shows", items.len());

        let reconciler = Reconciler::new(self.provider.as_ref(), self.config.staleness);
        let mut results = Vec::with_capacity(items.len());
        let mut succeeded = 0u32;
        let mut throttle_pauses = 0u32;

        for summary in &items {
            let result = reconciler
                .reconcile(session.as_mut(), summary, Utc::now())
                .await;

            let label = match &result {
                Ok(outcome) => outcome.as_str(),
                Err(_) => "failed",
            };
            SYNC_ITEMS.with_label_values(&[label]).inc();

            if result.is_ok() {
                succeeded += 1;
                if self.should_throttle(succeeded) {
                    throttle_pauses += 1;
                    self.throttle(cancel).await;
                }
            }
            results.push(result);
        }

        let mut outcome = fold_outcomes(items.iter().zip(results.iter()));
        outcome.throttle_pauses = throttle_pauses;

        let pending = session.pending();
        match session.commit() {
            Ok(summary) => {
                outcome.committed = true;
                debug!(
                    "Committed {} inserts and {} updates",
                    summary.inserted, summary.updated
                );
            }
            Err(e) => {
                error!("Failed to commit {} catalog changes: {}", pending, e);
            }
        }

        info!(
            created = outcome.created,
            updated = outcome.updated,
            skipped = outcome.skipped(),
            failed = outcome.failed,
            committed = outcome.committed,
            "Sync cycle finished"
        );

        Ok(outcome)
    }

    fn should_throttle(&self, succeeded: u32) -> bool {
        self.config.throttle_every > 0 && succeeded % self.config.throttle_every == 0
    }

    async fn throttle(&self, cancel: &CancellationToken) {
        debug!("Throttling for {:?}", self.config.throttle_delay);
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Throttle pause cut short by cancellation");
            }
            _ = tokio::time::sleep(self.config.throttle_delay) => {}
        }
    }
}
