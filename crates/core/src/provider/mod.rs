//! Provider client for the external show catalog.
//!
//! The provider publishes a paginated popularity ranking and per-show details.
//! [`ShowProvider`] is the seam the sync engine talks to; [`EpisodateClient`]
//! is the HTTP implementation.

mod episodate;
mod types;

pub use episodate::{EpisodateClient, EpisodateConfig};
pub use types::*;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Delay inserted between page requests of an aggregate fetch.
pub const PAGE_DELAY: Duration = Duration::from_secs(1);

/// Errors that can occur when talking to the provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Provider asked us to slow down.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// Provider returned a non-success status.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured correctly.
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

/// Read-only access to the external show provider.
#[async_trait]
pub trait ShowProvider: Send + Sync {
    /// Fetch one page (1-based) of the popularity ranking.
    async fn fetch_page(&self, page: u32) -> Result<ShowPage, ProviderError>;

    /// Fetch the full record for one show. `Ok(None)` means the provider has
    /// no usable record for that ID.
    async fn fetch_detail(
        &self,
        external_id: u64,
    ) -> Result<Option<ExternalShowDetail>, ProviderError>;
}

/// Fetch sequential pages starting at 1, up to `max_pages`.
///
/// Stops early when a page comes back empty or reports itself as the last
/// page. Sleeps `page_delay` between requests; if `cancel` fires during that
/// sleep, paging stops and the items collected so far are returned. A page
/// that fails to load is treated as empty.
pub async fn fetch_pages(
    provider: &dyn ShowProvider,
    max_pages: u32,
    page_delay: Duration,
    cancel: &CancellationToken,
) -> Vec<ExternalShowSummary> {
    let mut items = Vec::new();

    for page_number in 1..=max_pages {
        let page = match provider.fetch_page(page_number).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Failed to fetch page {}: {}", page_number, e);
                ShowPage::empty(page_number)
            }
        };

        if page.items.is_empty() {
            debug!("Page {} returned no items, stopping", page_number);
            break;
        }

        debug!(
            "Fetched page {} (of {:?}) with {} shows",
            page_number,
            page.total_pages,
            page.items.len()
        );
        let is_last = page.is_last();
        items.extend(page.items);

        if is_last || page_number == max_pages {
            break;
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Page fetch cancelled after page {}", page_number);
                break;
            }
            _ = tokio::time::sleep(page_delay) => {}
        }
    }

    items
}
