//! EpisoDate API client.
//!
//! Public, keyless API. Responses are loosely typed: numbers frequently
//! arrive as strings, most fields may be null, and an unknown show comes back
//! as `{"tvShow": []}` instead of a 404.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use super::types::{ExternalEpisode, ExternalShowDetail, ExternalShowSummary, ShowPage};
use super::{ProviderError, ShowProvider};
use crate::config::ProviderConfig;
use crate::metrics::{PROVIDER_REQUESTS, PROVIDER_REQUEST_DURATION};

const USER_AGENT: &str = concat!("showsync/", env!("CARGO_PKG_VERSION"));

/// EpisoDate client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodateConfig {
    /// Base URL (default: https://www.episodate.com/api).
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u32,
}

impl From<&ProviderConfig> for EpisodateConfig {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

/// EpisoDate API client.
pub struct EpisodateClient {
    client: Client,
    base_url: String,
}

impl EpisodateClient {
    /// Create a new client.
    pub fn new(config: EpisodateConfig) -> Result<Self, ProviderError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ProviderError::NotConfigured(
                "provider base URL is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Fetch one ranking page, surfacing every failure as an error.
    pub async fn get_page(&self, page: u32) -> Result<ShowPage, ProviderError> {
        let url = format!("{}/most-popular", self.base_url);

        debug!("Provider page request: page={}", page);

        let _timer = PROVIDER_REQUEST_DURATION
            .with_label_values(&["page"])
            .start_timer();

        let response = self
            .client
            .get(&url)
            .query(&[("page", page.to_string())])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimitExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: MostPopularResponse = response.json().await.map_err(|e| {
            ProviderError::ParseError(format!("Failed to parse page {}: {}", page, e))
        })?;

        Ok(parsed.into_page(page))
    }

    /// Fetch one show detail, surfacing every failure as an error.
    ///
    /// Returns `Ok(None)` when the provider answers but has no record.
    pub async fn get_detail(
        &self,
        external_id: u64,
    ) -> Result<Option<ExternalShowDetail>, ProviderError> {
        let url = format!("{}/show-details", self.base_url);

        debug!("Provider detail request: id={}", external_id);

        let _timer = PROVIDER_REQUEST_DURATION
            .with_label_values(&["detail"])
            .start_timer();

        let response = self
            .client
            .get(&url)
            .query(&[("q", external_id.to_string())])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimitExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: ShowDetailsResponse = response.json().await.map_err(|e| {
            ProviderError::ParseError(format!(
                "Failed to parse detail for show {}: {}",
                external_id, e
            ))
        })?;

        parsed.into_detail(external_id)
    }
}

#[async_trait]
impl ShowProvider for EpisodateClient {
    async fn fetch_page(&self, page: u32) -> Result<ShowPage, ProviderError> {
        match self.get_page(page).await {
            Ok(result) => {
                PROVIDER_REQUESTS
                    .with_label_values(&["page", "success"])
                    .inc();
                Ok(result)
            }
            Err(e) => {
                PROVIDER_REQUESTS.with_label_values(&["page", "error"]).inc();
                log_failure("page", &page.to_string(), &e);
                Ok(ShowPage::empty(page))
            }
        }
    }

    async fn fetch_detail(
        &self,
        external_id: u64,
    ) -> Result<Option<ExternalShowDetail>, ProviderError> {
        match self.get_detail(external_id).await {
            Ok(detail) => {
                PROVIDER_REQUESTS
                    .with_label_values(&["detail", "success"])
                    .inc();
                Ok(detail)
            }
            Err(e) => {
                PROVIDER_REQUESTS
                    .with_label_values(&["detail", "error"])
                    .inc();
                log_failure("show", &external_id.to_string(), &e);
                Ok(None)
            }
        }
    }
}

fn log_failure(kind: &str, key: &str, error: &ProviderError) {
    let status = match error {
        ProviderError::ApiError { status, .. } => Some(*status),
        ProviderError::RateLimitExceeded => Some(StatusCode::TOO_MANY_REQUESTS.as_u16()),
        ProviderError::HttpError(e) => e.status().map(|s| s.as_u16()),
        _ => None,
    };

    match error {
        ProviderError::RateLimitExceeded => {
            warn!(status = ?status, "Provider rate limited request for {} {}", kind, key)
        }
        _ => warn!(status = ?status, "Provider request for {} {} failed: {}", kind, key, error),
    }
}

// ============================================================================
// EpisoDate API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct MostPopularResponse {
    #[serde(default, deserialize_with = "lenient_u32")]
    pages: Option<u32>,
    #[serde(default, deserialize_with = "null_as_empty")]
    tv_shows: Vec<serde_json::Value>,
}

impl MostPopularResponse {
    fn into_page(self, page: u32) -> ShowPage {
        let items = self
            .tv_shows
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<ShowResult>(raw) {
                Ok(show) => Some(show.into()),
                Err(e) => {
                    debug!("Skipping malformed show on page {}: {}", page, e);
                    None
                }
            })
            .collect();

        ShowPage {
            page,
            total_pages: self.pages,
            items,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ShowResult {
    #[serde(deserialize_with = "strict_u64")]
    id: u64,
    name: String,
    permalink: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    country: Option<String>,
    network: Option<String>,
    status: Option<String>,
    image_thumbnail_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ShowDetailsResponse {
    #[serde(rename = "tvShow", default)]
    tv_show: Option<serde_json::Value>,
}

impl ShowDetailsResponse {
    fn into_detail(self, external_id: u64) -> Result<Option<ExternalShowDetail>, ProviderError> {
        match self.tv_show {
            Some(value @ serde_json::Value::Object(_)) => {
                let details: ShowDetails = serde_json::from_value(value).map_err(|e| {
                    ProviderError::ParseError(format!(
                        "Malformed detail for show {}: {}",
                        external_id, e
                    ))
                })?;
                Ok(Some(details.into()))
            }
            // Unknown IDs come back as an empty array.
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ShowDetails {
    #[serde(deserialize_with = "strict_u64")]
    id: u64,
    name: String,
    permalink: Option<String>,
    description: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    country: Option<String>,
    network: Option<String>,
    status: Option<String>,
    image_path: Option<String>,
    image_thumbnail_path: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    rating: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    rating_count: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    runtime: Option<u32>,
    #[serde(default, deserialize_with = "lenient_genres")]
    genres: Option<Vec<String>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    episodes: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct EpisodeResult {
    #[serde(default, deserialize_with = "lenient_u32")]
    season: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    episode: Option<u32>,
    name: Option<String>,
    air_date: Option<String>,
}

/// A JSON scalar that should have been a number.
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Number(serde_json::Number),
    Text(String),
    Other(serde::de::IgnoredAny),
}

impl Loose {
    fn as_text(&self) -> Option<String> {
        match self {
            Loose::Number(n) => Some(n.to_string()),
            Loose::Text(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Loose::Other(_) => None,
        }
    }
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Loose>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|v| v.as_text())
        .and_then(|s| s.parse::<u32>().ok()))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Loose>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| v.as_text()))
}

/// A list that may arrive as `null` or as something other than an array.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Array(items)) => Ok(items),
        _ => Ok(Vec::new()),
    }
}

/// Genre names, dropping entries that are not strings.
fn lenient_genres<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Array(items)) => Ok(Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    serde_json::Value::String(genre) => Some(genre),
                    _ => None,
                })
                .collect(),
        )),
        _ => Ok(None),
    }
}

fn strict_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Loose::deserialize(deserializer)?;
    raw.as_text()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| serde::de::Error::custom("expected a numeric show id"))
}

// ============================================================================
// Conversions
// ============================================================================

impl From<ShowResult> for ExternalShowSummary {
    fn from(r: ShowResult) -> Self {
        Self {
            id: r.id,
            name: r.name,
            permalink: r.permalink,
            start_date: r.start_date,
            end_date: r.end_date,
            country: r.country,
            network: r.network,
            status: r.status,
            image_thumbnail_path: r.image_thumbnail_path,
        }
    }
}

impl From<ShowDetails> for ExternalShowDetail {
    fn from(d: ShowDetails) -> Self {
        let episodes = d
            .episodes
            .into_iter()
            .filter_map(|raw| serde_json::from_value::<EpisodeResult>(raw).ok())
            .filter_map(|e| {
                Some(ExternalEpisode {
                    season: e.season?,
                    episode: e.episode?,
                    name: e.name.unwrap_or_default(),
                    air_date: e.air_date,
                })
            })
            .collect();

        Self {
            id: d.id,
            name: d.name,
            permalink: d.permalink,
            description: d.description,
            start_date: d.start_date,
            end_date: d.end_date,
            country: d.country,
            network: d.network,
            status: d.status,
            image_path: d.image_path,
            image_thumbnail_path: d.image_thumbnail_path,
            rating: d.rating,
            rating_count: d.rating_count,
            runtime: d.runtime,
            genres: d.genres,
            episodes,
        }
    }
}
