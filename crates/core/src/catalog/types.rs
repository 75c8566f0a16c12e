//! Types for the local show catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Content-type tag carried by every show the sync engine creates.
pub const SERIES_CONTENT_TYPE: &str = "tv_series";

/// A show as stored in the local catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogShow {
    /// Opaque local ID (UUID v4). Unrelated to any provider ID.
    pub id: String,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    /// Lifecycle status as published ("Running", "Ended", ...).
    pub status: String,
    pub network: String,
    /// Image URL (may be empty).
    pub image_url: String,
    /// Rating in [0.0, 10.0].
    pub rating: f64,
    /// Genre names; never empty for shows created by the sync engine.
    pub genres: Vec<String>,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CatalogShow {
    /// Key used for title lookups: the title, Unicode-lowercased.
    pub fn title_key(&self) -> String {
        title_key(&self.title)
    }
}

/// Normalize a title for case-insensitive exact matching.
///
/// Only case is folded: whitespace and punctuation differences still make
/// two titles distinct.
pub fn title_key(title: &str) -> String {
    title.to_lowercase()
}

/// Counts reported by a successful commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub inserted: usize,
    pub updated: usize,
}

impl CommitSummary {
    pub fn is_empty(&self) -> bool {
        self.inserted == 0 && self.updated == 0
    }
}

/// Errors for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
