//! Provider-side show records.
//!
//! These mirror what the provider publishes, after wire-level tolerance
//! (string-typed numbers, missing optionals) has been resolved by the client.
//! Canonical catalog types live in [`crate::catalog`].

use serde::{Deserialize, Serialize};

/// One entry of the provider's popularity ranking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExternalShowSummary {
    /// Provider show ID. Not stable enough to be used as a catalog key.
    pub id: u64,
    /// Show title.
    pub name: String,
    /// Provider permalink slug.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,
    /// Start date as published (free text, usually YYYY-MM-DD).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// End date as published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// Country code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Broadcasting network.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    /// Lifecycle status ("Running", "Ended", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Thumbnail image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_thumbnail_path: Option<String>,
}

/// Full show record, fetched lazily per reconciled show.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExternalShowDetail {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Full-size image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_thumbnail_path: Option<String>,
    /// Rating exactly as the provider sent it (a decimal string, when sane).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_count: Option<String>,
    /// Episode runtime in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
    /// Genre names; `None` when the provider omitted the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
    #[serde(default)]
    pub episodes: Vec<ExternalEpisode>,
}

impl ExternalShowDetail {
    /// Best image reference available: full image first, then thumbnail.
    pub fn best_image(&self) -> Option<&str> {
        self.image_path
            .as_deref()
            .or(self.image_thumbnail_path.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}

/// An episode listed in a show detail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExternalEpisode {
    pub season: u32,
    pub episode: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_date: Option<String>,
}

/// One page of the popularity ranking.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ShowPage {
    /// Page number that was requested (1-based).
    pub page: u32,
    /// Total number of pages the provider reports, when it reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    pub items: Vec<ExternalShowSummary>,
}

impl ShowPage {
    /// An empty page, used when a page could not be fetched or parsed.
    pub fn empty(page: u32) -> Self {
        Self {
            page,
            total_pages: None,
            items: Vec::new(),
        }
    }

    /// Whether this page is the last one according to the provider. Without
    /// a page count, only an empty page ends the ranking.
    pub fn is_last(&self) -> bool {
        matches!(self.total_pages, Some(total) if self.page >= total)
    }
}
