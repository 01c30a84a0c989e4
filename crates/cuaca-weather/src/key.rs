//! Where the weather API key comes from.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::types::WeatherError;

#[async_trait]
pub trait ApiKeySource: Send + Sync {
    async fn fetch_key(&self) -> Result<String, WeatherError>;
}

/// A key known up front (config file or environment)
#[derive(Clone)]
pub struct StaticKeySource {
    key: String,
}

impl StaticKeySource {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl std::fmt::Debug for StaticKeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticKeySource").field("key", &"<redacted>").finish()
    }
}

#[async_trait]
impl ApiKeySource for StaticKeySource {
    async fn fetch_key(&self) -> Result<String, WeatherError> {
        if self.key.trim().is_empty() {
            return Err(WeatherError::KeyUnavailable("configured key is empty".into()));
        }
        Ok(self.key.clone())
    }
}

#[derive(Debug, Deserialize)]
struct KeyResponse {
    key: Option<String>,
}

/// Fetches the key from the same-origin key endpoint (`GET` → `{"key": ...}`)
#[derive(Debug, Clone)]
pub struct HttpKeySource {
    client: Arc<Client>,
    url: String,
}

impl HttpKeySource {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WeatherError::KeyUnavailable(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl ApiKeySource for HttpKeySource {
    #[instrument(skip(self), fields(url = %self.url), level = "info")]
    async fn fetch_key(&self) -> Result<String, WeatherError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| WeatherError::KeyUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Key endpoint returned status {}", status);
            return Err(WeatherError::KeyUnavailable(format!(
                "key endpoint returned {}",
                status
            )));
        }

        let body: KeyResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::KeyUnavailable(format!("parse error: {}", e)))?;

        body.key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| WeatherError::KeyUnavailable("no API key returned".into()))
    }
}
