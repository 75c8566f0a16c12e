//! Create / update / skip decisions for provider shows.
//!
//! The provider and the catalog share no key. A provider show is matched to a
//! catalog show by case-insensitive exact title equality, and nothing else.
//! Two distinct shows with the same title therefore collide, and a provider
//! rename produces a second catalog entry instead of updating the first.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use super::normalize::{
    apply_rating, default_genres, parse_start_date, text_or, PLACEHOLDER_DESCRIPTION,
    START_DATE_POLICY,
};
use super::types::{ItemOutcome, SyncError};
use crate::catalog::{CatalogSession, CatalogShow, SERIES_CONTENT_TYPE};
use crate::provider::{ExternalShowDetail, ExternalShowSummary, ShowProvider};

/// Value stored for status/network when the provider gives nothing.
pub const UNKNOWN_FIELD: &str = "Unknown";

/// Decides when a matched catalog show is refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessPolicy {
    /// A show last updated longer ago than this is refreshed.
    pub max_age: TimeDelta,
}

impl Default for StalenessPolicy {
    fn default() -> Self {
        Self {
            max_age: TimeDelta::days(1),
        }
    }
}

impl StalenessPolicy {
    /// Strictly older than `max_age`; a show exactly `max_age` old is fresh.
    pub fn is_stale(&self, updated_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - updated_at > self.max_age
    }
}

/// What to do with one provider show.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// No catalog show has this title.
    Create,
    /// Matched and stale.
    Refresh(CatalogShow),
    /// Matched and fresh.
    Fresh(CatalogShow),
}

/// Pure decision given the current catalog match.
pub fn decide(
    existing: Option<CatalogShow>,
    now: DateTime<Utc>,
    policy: &StalenessPolicy,
) -> Reconciliation {
    match existing {
        None => Reconciliation::Create,
        Some(show) if policy.is_stale(show.updated_at, now) => Reconciliation::Refresh(show),
        Some(show) => Reconciliation::Fresh(show),
    }
}

/// Reconciles provider shows into a catalog session.
pub struct Reconciler<'a> {
    provider: &'a dyn ShowProvider,
    staleness: StalenessPolicy,
}

impl<'a> Reconciler<'a> {
    pub fn new(provider: &'a dyn ShowProvider, staleness: StalenessPolicy) -> Self {
        Self {
            provider,
            staleness,
        }
    }

    /// Reconcile one provider show, staging the resulting change in `session`.
    ///
    /// An absent detail degrades a create to a summary-only record and an
    /// update to the summary's status/network. A provider error or a catalog
    /// error fails the item.
    pub async fn reconcile(
        &self,
        session: &mut dyn CatalogSession,
        summary: &ExternalShowSummary,
        now: DateTime<Utc>,
    ) -> Result<ItemOutcome, SyncError> {
        let existing = session.find_by_title(&summary.name)?;

        match decide(existing, now, &self.staleness) {
            Reconciliation::Create => {
                let detail = self.fetch_detail(summary).await?;
                let show = build_show(summary, detail.as_ref(), now);
                debug!("Creating catalog show '{}' ({})", show.title, show.id);
                session.insert(show)?;
                Ok(ItemOutcome::Created)
            }
            Reconciliation::Refresh(show) => {
                let detail = self.fetch_detail(summary).await?;
                let show = refresh_show(show, summary, detail.as_ref(), now);
                debug!("Refreshing catalog show '{}' ({})", show.title, show.id);
                session.update(show)?;
                Ok(ItemOutcome::Updated)
            }
            Reconciliation::Fresh(show) => {
                debug!("Catalog show '{}' is fresh, skipping", show.title);
                Ok(ItemOutcome::Skipped)
            }
        }
    }

    async fn fetch_detail(
        &self,
        summary: &ExternalShowSummary,
    ) -> Result<Option<ExternalShowDetail>, SyncError> {
        let detail = self.provider.fetch_detail(summary.id).await?;
        if detail.is_none() {
            warn!(
                "No detail for show {} ({}), using summary fields only",
                summary.name, summary.id
            );
        }
        Ok(detail)
    }
}

/// Build a new catalog show from provider data.
pub fn build_show(
    summary: &ExternalShowSummary,
    detail: Option<&ExternalShowDetail>,
    now: DateTime<Utc>,
) -> CatalogShow {
    let start_date = detail
        .and_then(|d| d.start_date.as_deref())
        .or(summary.start_date.as_deref());

    let mut rating = 0.0;
    apply_rating(&mut rating, detail.and_then(|d| d.rating.as_deref()));

    let image_url = detail
        .and_then(|d| d.best_image())
        .or(summary.image_thumbnail_path.as_deref())
        .unwrap_or_default()
        .to_string();

    CatalogShow {
        id: Uuid::new_v4().to_string(),
        title: summary.name.clone(),
        description: text_or(
            detail.and_then(|d| d.description.as_deref()),
            PLACEHOLDER_DESCRIPTION,
        ),
        start_date: parse_start_date(start_date, now, START_DATE_POLICY).unwrap_or(now),
        status: text_or(status_of(summary, detail), UNKNOWN_FIELD),
        network: text_or(network_of(summary, detail), UNKNOWN_FIELD),
        image_url,
        rating,
        genres: default_genres(detail.and_then(|d| d.genres.as_deref())),
        content_type: SERIES_CONTENT_TYPE.to_string(),
        created_at: now,
        updated_at: now,
    }
}

/// Refresh a stale catalog show. Only status, network, rating and
/// `updated_at` change; title, genres, description and dates are kept.
pub fn refresh_show(
    mut show: CatalogShow,
    summary: &ExternalShowSummary,
    detail: Option<&ExternalShowDetail>,
    now: DateTime<Utc>,
) -> CatalogShow {
    if let Some(status) = non_blank(status_of(summary, detail)) {
        show.status = status.to_string();
    }
    if let Some(network) = non_blank(network_of(summary, detail)) {
        show.network = network.to_string();
    }
    if let Some(detail) = detail {
        apply_rating(&mut show.rating, detail.rating.as_deref());
    }
    show.updated_at = now;
    show
}

fn status_of<'a>(
    summary: &'a ExternalShowSummary,
    detail: Option<&'a ExternalShowDetail>,
) -> Option<&'a str> {
    non_blank(detail.and_then(|d| d.status.as_deref())).or(summary.status.as_deref())
}

fn network_of<'a>(
    summary: &'a ExternalShowSummary,
    detail: Option<&'a ExternalShowDetail>,
) -> Option<&'a str> {
    non_blank(detail.and_then(|d| d.network.as_deref())).or(summary.network.as_deref())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
