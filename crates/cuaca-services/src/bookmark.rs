//! Remote bookmark store (REST collection at a single base URL).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::id::string_or_number;

/// A saved city
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub city: String,
    pub province: String,
}

/// Request body for creating a bookmark
#[derive(Debug, Clone, Serialize)]
pub struct BookmarkCreateRequest<'a> {
    pub city: &'a str,
    pub province: &'a str,
}

#[derive(Error, Debug, Clone)]
pub enum BookmarkError {
    #[error("Bookmark store rate limited")]
    RateLimited,

    #[error("Bookmark store error: {0}")]
    Service(String),
}

#[async_trait]
pub trait BookmarkStore: Send + Sync {
    async fn add_bookmark(&self, city: &str, province: &str) -> Result<Bookmark, BookmarkError>;

    async fn get_bookmarks(&self) -> Result<Vec<Bookmark>, BookmarkError>;

    async fn delete_bookmark(&self, id: &str) -> Result<(), BookmarkError>;
}

/// HTTP bookmark client. No local cache; every call goes to the store.
#[derive(Debug, Clone)]
pub struct BookmarkClient {
    base_url: Url,
    client: Arc<Client>,
}

impl BookmarkClient {
    /// `base_url` is the collection URL and must end with `/`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BookmarkError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| BookmarkError::Service(format!("invalid URL {}: {}", base_url, e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BookmarkError::Service(e.to_string()))?;

        Ok(Self {
            base_url,
            client: Arc::new(client),
        })
    }

    /// Check response status and extract error
    async fn check_response(&self, response: Response) -> Result<Response, BookmarkError> {
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("Bookmark store rate limited");
            return Err(BookmarkError::RateLimited);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BookmarkError::Service(format!("{}: {}", status, error_text)));
        }
        Ok(response)
    }

    /// Collection URL plus `id` as one percent-encoded path segment
    fn item_url(&self, id: &str) -> Result<Url, BookmarkError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                BookmarkError::Service(format!("cannot append id to {}", self.base_url))
            })?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    fn request_error(e: reqwest::Error) -> BookmarkError {
        BookmarkError::Service(e.to_string())
    }
}

#[async_trait]
impl BookmarkStore for BookmarkClient {
    #[instrument(skip(self), level = "info")]
    async fn add_bookmark(&self, city: &str, province: &str) -> Result<Bookmark, BookmarkError> {
        let response = self
            .client
            .post(self.base_url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .json(&BookmarkCreateRequest { city, province })
            .send()
            .await
            .map_err(Self::request_error)?;
        let response = self.check_response(response).await?;

        let bookmark: Bookmark = response
            .json()
            .await
            .map_err(|e| BookmarkError::Service(format!("parse error: {}", e)))?;

        tracing::info!("Added bookmark {} ({})", bookmark.city, bookmark.id);
        Ok(bookmark)
    }

    #[instrument(skip(self), level = "debug")]
    async fn get_bookmarks(&self) -> Result<Vec<Bookmark>, BookmarkError> {
        let response = self
            .client
            .get(self.base_url.clone())
            .send()
            .await
            .map_err(Self::request_error)?;
        let response = self.check_response(response).await?;

        let bookmarks: Vec<Bookmark> = response
            .json()
            .await
            .map_err(|e| BookmarkError::Service(format!("parse error: {}", e)))?;

        tracing::debug!("Fetched {} bookmarks", bookmarks.len());
        Ok(bookmarks)
    }

    #[instrument(skip(self), level = "info")]
    async fn delete_bookmark(&self, id: &str) -> Result<(), BookmarkError> {
        let url = self.item_url(id)?;

        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(Self::request_error)?;
        self.check_response(response).await?;

        tracing::info!("Deleted bookmark {}", id);
        Ok(())
    }
}
