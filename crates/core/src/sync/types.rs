//! Types shared by the sync components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::catalog::CatalogError;
use crate::provider::{ExternalShowSummary, ProviderError};

/// Errors that can occur during synchronization.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Catalog store error.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Provider error that was not absorbed by the client.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The cycle task ended abnormally (panicked or was aborted).
    #[error("cycle task failed: {0}")]
    TaskFailed(String),
}

/// Result of reconciling one provider show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    Created,
    Updated,
    /// Matched and still fresh; nothing to do.
    Skipped,
}

impl ItemOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemOutcome::Created => "created",
            ItemOutcome::Updated => "updated",
            ItemOutcome::Skipped => "skipped",
        }
    }
}

/// Aggregated counters of one sync cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleOutcome {
    /// Shows inserted into the catalog.
    pub created: u32,
    /// Existing shows refreshed from the provider.
    pub updated: u32,
    /// Items handled without error (created + updated + skipped).
    pub processed: u32,
    /// Items whose reconciliation failed.
    pub failed: u32,
    /// Rate-limit pauses taken during reconciliation.
    pub throttle_pauses: u32,
    /// Whether the cycle's changes were committed.
    pub committed: bool,
}

impl CycleOutcome {
    /// Items that matched a fresh catalog show and were left alone.
    pub fn skipped(&self) -> u32 {
        self.processed - self.created - self.updated
    }

    /// Total items attempted.
    pub fn attempted(&self) -> u32 {
        self.processed + self.failed
    }

    /// Fold one per-item result into the counters. Failures are routed to
    /// the log with the show's identity.
    pub fn absorb(
        &mut self,
        summary: &ExternalShowSummary,
        result: &Result<ItemOutcome, SyncError>,
    ) {
        match result {
            Ok(outcome) => {
                self.processed += 1;
                match outcome {
                    ItemOutcome::Created => self.created += 1,
                    ItemOutcome::Updated => self.updated += 1,
                    ItemOutcome::Skipped => {}
                }
            }
            Err(e) => {
                self.failed += 1;
                warn!(
                    external_id = summary.id,
                    name = %summary.name,
                    "Failed to sync show {} ({}): {}",
                    summary.name,
                    summary.id,
                    e
                );
            }
        }
    }
}

/// Reduce a list of per-item results into a [`CycleOutcome`].
pub fn fold_outcomes<'a, I>(results: I) -> CycleOutcome
where
    I: IntoIterator<Item = (&'a ExternalShowSummary, &'a Result<ItemOutcome, SyncError>)>,
{
    results
        .into_iter()
        .fold(CycleOutcome::default(), |mut outcome, (summary, result)| {
            outcome.absorb(summary, result);
            outcome
        })
}

/// Current status of the sync scheduler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerStatus {
    /// Whether the scheduler loop is running.
    pub running: bool,
    /// Cycles that ran to completion (successfully or not).
    pub cycles_completed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cycle_started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cycle_finished_at: Option<DateTime<Utc>>,
    /// Outcome of the most recent successful cycle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_outcome: Option<CycleOutcome>,
    /// Error of the most recent cycle, cleared on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_fold_outcomes_counts_and_skips() {
        let shows: Vec<_> = (1..=6)
            .map(|i| fixtures::show_summary(i, &format!("Show {}", i)))
            .collect();
        let results: Vec<Result<ItemOutcome, SyncError>> = vec![
            Ok(ItemOutcome::Created),
            Ok(ItemOutcome::Updated),
            Ok(ItemOutcome::Skipped),
            Err(SyncError::Catalog(CatalogError::Database("locked".to_string()))),
            Ok(ItemOutcome::Created),
            Ok(ItemOutcome::Skipped),
        ];

        let outcome = fold_outcomes(shows.iter().zip(results.iter()));

        assert_eq!(outcome.created, 2);
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.processed, 5);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.skipped(), 2);
        assert_eq!(outcome.attempted(), 6);
        assert!(!outcome.committed);
    }

    #[test]
    fn test_cycle_outcome_default_is_all_zero() {
        let outcome = CycleOutcome::default();
        assert_eq!(outcome.processed, 0);
        assert_eq!(outcome.skipped(), 0);
        assert_eq!(outcome.throttle_pauses, 0);
    }

    #[test]
    fn test_item_outcome_serialization() {
        assert_eq!(
            serde_json::to_string(&ItemOutcome::Created).unwrap(),
            "\"created\""
        );
        assert_eq!(ItemOutcome::Skipped.as_str(), "skipped");
    }

    #[test]
    fn test_scheduler_status_default() {
        let status = SchedulerStatus::default();
        assert!(!status.running);
        assert_eq!(status.cycles_completed, 0);
        let json = serde_json::to_string(&status).unwrap();
        assert!(!json.contains("last_outcome"));
    }

    #[test]
    fn test_error_display() {
        let err = SyncError::Catalog(CatalogError::NotFound("show-1".to_string()));
        assert_eq!(err.to_string(), "catalog error: Not found: show-1");
    }
}
