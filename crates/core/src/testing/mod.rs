//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the provider and catalog
//! seams, allowing sync cycles to be exercised without network or disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use showsync_core::testing::{fixtures, MockCatalogStore, MockShowProvider};
//!
//! let provider = MockShowProvider::new();
//! provider.set_pages(vec![vec![fixtures::show_summary(1, "Dark")]]).await;
//! provider.add_detail(fixtures::show_detail(1, "Dark")).await;
//!
//! let store = MockCatalogStore::new();
//! store.fail_next_commit();
//! ```

mod mock_catalog;
mod mock_provider;

pub use mock_catalog::MockCatalogStore;
pub use mock_provider::{MockShowProvider, RecordedProviderRequest};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use crate::catalog::{CatalogShow, SERIES_CONTENT_TYPE};
    use crate::provider::{ExternalEpisode, ExternalShowDetail, ExternalShowSummary};

    fn permalink(name: &str) -> String {
        name.to_lowercase().replace(' ', "-")
    }

    /// Create a ranking entry with reasonable defaults.
    pub fn show_summary(id: u64, name: &str) -> ExternalShowSummary {
        ExternalShowSummary {
            id,
            name: name.to_string(),
            permalink: Some(permalink(name)),
            start_date: Some("2020-01-01".to_string()),
            end_date: None,
            country: Some("US".to_string()),
            network: Some("HBO".to_string()),
            status: Some("Running".to_string()),
            image_thumbnail_path: Some(format!(
                "https://static.episodate.com/images/tv-show/thumbnail/{}.jpg",
                id
            )),
        }
    }

    /// Create a full show record matching [`show_summary`].
    pub fn show_detail(id: u64, name: &str) -> ExternalShowDetail {
        ExternalShowDetail {
            id,
            name: name.to_string(),
            permalink: Some(permalink(name)),
            description: Some(format!("A show about {}.", name.to_lowercase())),
            start_date: Some("2020-01-01".to_string()),
            end_date: None,
            country: Some("US".to_string()),
            network: Some("HBO".to_string()),
            status: Some("Running".to_string()),
            image_path: Some(format!(
                "https://static.episodate.com/images/tv-show/full/{}.jpg",
                id
            )),
            image_thumbnail_path: Some(format!(
                "https://static.episodate.com/images/tv-show/thumbnail/{}.jpg",
                id
            )),
            rating: Some("8.5".to_string()),
            rating_count: Some("120".to_string()),
            runtime: Some(55),
            genres: Some(vec!["Drama".to_string(), "Mystery".to_string()]),
            episodes: (1..=3)
                .map(|e| ExternalEpisode {
                    season: 1,
                    episode: e,
                    name: format!("Episode {}", e),
                    air_date: Some(format!("2020-01-{:02} 21:00:00", e)),
                })
                .collect(),
        }
    }

    /// Create a catalog show with a fresh ID, created and updated now.
    pub fn catalog_show(title: &str) -> CatalogShow {
        let now = Utc::now();
        CatalogShow {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: format!("A show about {}.", title.to_lowercase()),
            start_date: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).single().unwrap_or(now),
            status: "Running".to_string(),
            network: "HBO".to_string(),
            image_url: "https://static.episodate.com/images/tv-show/full/1.jpg".to_string(),
            rating: 7.0,
            genres: vec!["Drama".to_string()],
            content_type: SERIES_CONTENT_TYPE.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}
