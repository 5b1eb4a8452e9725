//! Photo lookup: the single point of entry for Unsplash search calls.
//!
//! The photo is decorative: every failure except a missing credential collapses
//! into `FALLBACK_IMAGE_URL` inside `resolve_image`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

pub const UNSPLASH_API_BASE: &str = "https://api.unsplash.com";
/// Shown whenever no photo could be resolved for a search term.
pub const FALLBACK_IMAGE_URL: &str = "https://images.unsplash.com/photo-1476514525535-07fb3b4ae5f1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("Unsplash API key not configured")]
    MissingAccessKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unsplash API responded with status: {0}")]
    Api(u16),
}

/// Capability interface over the image-search provider.
#[async_trait]
pub trait PhotoSearch: Send + Sync {
    /// Returns the URL of the best landscape photo for `term`, or `None` when nothing matched.
    async fn search_photo(&self, term: &str) -> Result<Option<String>, PhotoError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    urls: PhotoUrls,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: Option<String>,
}

#[derive(Clone)]
pub struct UnsplashClient {
    client: Client,
    access_key: Option<String>,
    base_url: String,
}

impl UnsplashClient {
    pub fn new(access_key: Option<String>, base_url: &str) -> Result<Self, PhotoError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            access_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PhotoSearch for UnsplashClient {
    async fn search_photo(&self, term: &str) -> Result<Option<String>, PhotoError> {
        let access_key = self
            .access_key
            .as_deref()
            .ok_or(PhotoError::MissingAccessKey)?;

        let response = self
            .client
            .get(format!("{}/search/photos", self.base_url))
            .query(&[
                ("query", term),
                ("per_page", "1"),
                ("orientation", "landscape"),
            ])
            .header("Authorization", format!("Client-ID {access_key}"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PhotoError::Api(status.as_u16()));
        }

        let body: SearchResponse = response.json().await?;
        Ok(body
            .results
            .into_iter()
            .next()
            .and_then(|result| result.urls.regular))
    }
}

/// Resolves a search term to a display URL.
///
/// Only `PhotoError::MissingAccessKey` is returned; every other failure, and an
/// empty result set, yields `FALLBACK_IMAGE_URL`.
pub async fn resolve_image(photos: &dyn PhotoSearch, term: &str) -> Result<String, PhotoError> {
    match photos.search_photo(term).await {
        Ok(Some(url)) => {
            debug!("Resolved photo for '{term}'");
            Ok(url)
        }
        Ok(None) => {
            debug!("No photo found for '{term}', using fallback");
            Ok(FALLBACK_IMAGE_URL.to_string())
        }
        Err(PhotoError::MissingAccessKey) => Err(PhotoError::MissingAccessKey),
        Err(e) => {
            warn!("Photo lookup for '{term}' failed: {e}");
            Ok(FALLBACK_IMAGE_URL.to_string())
        }
    }
}
