//! Mock show provider for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::provider::{
    ExternalShowDetail, ExternalShowSummary, ProviderError, ShowPage, ShowProvider,
};

/// A recorded provider request for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedProviderRequest {
    Page(u32),
    Detail(u64),
}

/// Mock implementation of the ShowProvider trait.
///
/// Provides controllable behavior for testing:
/// - Serve configurable ranking pages and show details
/// - Track requests for assertions
/// - Simulate failing pages and details
///
/// Pages are 1-based; requests past the configured pages return an empty
/// page. Unknown detail IDs return `Ok(None)`.
#[derive(Debug)]
pub struct MockShowProvider {
    pages: Arc<RwLock<Vec<Vec<ExternalShowSummary>>>>,
    /// Whether pages report a total page count.
    report_page_count: Arc<RwLock<bool>>,
    details: Arc<RwLock<HashMap<u64, ExternalShowDetail>>>,
    failing_pages: Arc<RwLock<HashSet<u32>>>,
    failing_details: Arc<RwLock<HashSet<u64>>>,
    requests: Arc<RwLock<Vec<RecordedProviderRequest>>>,
}

impl Default for MockShowProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockShowProvider {
    /// Create a provider with no pages and no details.
    pub fn new() -> Self {
        Self {
            pages: Arc::new(RwLock::new(Vec::new())),
            report_page_count: Arc::new(RwLock::new(true)),
            details: Arc::new(RwLock::new(HashMap::new())),
            failing_pages: Arc::new(RwLock::new(HashSet::new())),
            failing_details: Arc::new(RwLock::new(HashSet::new())),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Set the ranking pages, page 1 first.
    pub async fn set_pages(&self, pages: Vec<Vec<ExternalShowSummary>>) {
        *self.pages.write().await = pages;
    }

    /// Stop reporting a page count, so only an empty page ends paging.
    pub async fn hide_page_count(&self) {
        *self.report_page_count.write().await = false;
    }

    /// Add a show detail.
    pub async fn add_detail(&self, detail: ExternalShowDetail) {
        self.details.write().await.insert(detail.id, detail);
    }

    /// Make requests for `page` fail.
    pub async fn fail_page(&self, page: u32) {
        self.failing_pages.write().await.insert(page);
    }

    /// Make detail requests for `external_id` fail.
    pub async fn fail_detail(&self, external_id: u64) {
        self.failing_details.write().await.insert(external_id);
    }

    // =========================================================================
    // Assertions
    // =========================================================================

    /// All requests in order.
    pub async fn requests(&self) -> Vec<RecordedProviderRequest> {
        self.requests.read().await.clone()
    }

    /// Requested page numbers in order.
    pub async fn requested_pages(&self) -> Vec<u32> {
        self.requests
            .read()
            .await
            .iter()
            .filter_map(|r| match r {
                RecordedProviderRequest::Page(page) => Some(*page),
                _ => None,
            })
            .collect()
    }

    /// Requested detail IDs in order.
    pub async fn requested_details(&self) -> Vec<u64> {
        self.requests
            .read()
            .await
            .iter()
            .filter_map(|r| match r {
                RecordedProviderRequest::Detail(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Forget recorded requests.
    pub async fn clear_requests(&self) {
        self.requests.write().await.clear();
    }
}

#[async_trait]
impl ShowProvider for MockShowProvider {
    async fn fetch_page(&self, page: u32) -> Result<ShowPage, ProviderError> {
        self.requests
            .write()
            .await
            .push(RecordedProviderRequest::Page(page));

        if self.failing_pages.read().await.contains(&page) {
            return Err(ProviderError::ApiError {
                status: 500,
                message: format!("mock failure for page {}", page),
            });
        }

        let pages = self.pages.read().await;
        let items = page
            .checked_sub(1)
            .and_then(|idx| pages.get(idx as usize))
            .cloned()
            .unwrap_or_default();
        let total_pages = if *self.report_page_count.read().await {
            Some(pages.len() as u32)
        } else {
            None
        };

        Ok(ShowPage {
            page,
            total_pages,
            items,
        })
    }

    async fn fetch_detail(
        &self,
        external_id: u64,
    ) -> Result<Option<ExternalShowDetail>, ProviderError> {
        self.requests
            .write()
            .await
            .push(RecordedProviderRequest::Detail(external_id));

        if self.failing_details.read().await.contains(&external_id) {
            return Err(ProviderError::ApiError {
                status: 503,
                message: format!("mock failure for show {}", external_id),
            });
        }

        Ok(self.details.read().await.get(&external_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_pages_are_one_based() {
        let provider = MockShowProvider::new();
        provider
            .set_pages(vec![
                vec![fixtures::show_summary(1, "A")],
                vec![fixtures::show_summary(2, "B")],
            ])
            .await;

        let page = provider.fetch_page(2).await.unwrap();
        assert_eq!(page.items[0].id, 2);
        assert_eq!(page.total_pages, Some(2));

        assert!(provider.fetch_page(0).await.unwrap().items.is_empty());
        assert!(provider.fetch_page(3).await.unwrap().items.is_empty());
        assert_eq!(provider.requested_pages().await, vec![2, 0, 3]);
    }

    #[tokio::test]
    async fn test_hidden_page_count() {
        let provider = MockShowProvider::new();
        provider.hide_page_count().await;
        assert_eq!(provider.fetch_page(1).await.unwrap().total_pages, None);
    }

    #[tokio::test]
    async fn test_details_and_failures() {
        let provider = MockShowProvider::new();
        provider.add_detail(fixtures::show_detail(7, "Dark")).await;
        provider.fail_detail(8).await;

        assert!(provider.fetch_detail(7).await.unwrap().is_some());
        assert!(provider.fetch_detail(8).await.is_err());
        assert!(provider.fetch_detail(9).await.unwrap().is_none());
        assert_eq!(
            provider.requests().await,
            vec![
                RecordedProviderRequest::Detail(7),
                RecordedProviderRequest::Detail(8),
                RecordedProviderRequest::Detail(9),
            ]
        );
    }
}
