//! Catalog client
//!
//! Loads the video list through the hlsdeck proxy (`/api/videos`).

use reqwest::StatusCode;
use thiserror::Error;

use crate::config::trim_base;
use crate::models::Video;

/// Catalog API error types
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Video not found: {0}")]
    NotFound(String),

    #[error("Failed to load videos (HTTP {0})")]
    Http(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

/// Client for the proxy's catalog endpoints
#[derive(Debug, Clone)]
pub struct CatalogClient {
    base_url: String,
    client: reqwest::Client,
}

impl CatalogClient {
    /// Create a client for the proxy at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: trim_base(base_url),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the full catalog
    pub async fn videos(&self) -> Result<Vec<Video>, CatalogError> {
        let url = format!("{}/api/videos", self.base_url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Http(status.as_u16()));
        }

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| CatalogError::InvalidResponse(format!("JSON parse error: {}", e)))
    }

    /// Fetch a single catalog entry by id
    pub async fn video(&self, id: &str) -> Result<Video, CatalogError> {
        let url = format!(
            "{}/api/videos?id={}",
            self.base_url,
            urlencoding::encode(id)
        );
        let response = self.client.get(&url).send().await?;

        match response.status() {
            status if status.is_success() => {
                let text = response.text().await?;
                serde_json::from_str(&text).map_err(|e| {
                    CatalogError::InvalidResponse(format!("JSON parse error: {}", e))
                })
            }
            StatusCode::NOT_FOUND => Err(CatalogError::NotFound(id.to_string())),
            status => Err(CatalogError::Http(status.as_u16())),
        }
    }

    /// Fetch the proxy's local-directory catalog
    pub async fn local_videos(&self) -> Result<Vec<Video>, CatalogError> {
        let url = format!("{}/api/videos/local", self.base_url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Http(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))
    }
}
