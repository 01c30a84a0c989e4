//! Province and regency listings for Indonesia.
//!
//! Two public directories are supported. Both return the same domain types;
//! which one is used is a configuration choice.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::id::string_or_number;

/// Default base URL of the Cloud Alert address API
pub const CLOUD_ALERT_URL: &str = "https://alamat.thecloudalert.com/api/";
/// Default base URL of the emsifa static region API
pub const EMSIFA_URL: &str = "https://www.emsifa.com/api-wilayah-indonesia/api/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Province {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Regency {
    pub id: String,
    /// Raw name as listed, possibly with an administrative prefix
    pub display_name: String,
    pub parent_province_id: String,
}

#[derive(Error, Debug, Clone)]
pub enum RegionError {
    #[error("Invalid region directory URL: {0}")]
    InvalidUrl(String),

    #[error("Region request failed: {0}")]
    Request(String),

    #[error("Region directory returned status {0}")]
    Status(u16),

    #[error("Unexpected region response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait RegionDirectory: Send + Sync {
    async fn list_provinces(&self) -> Result<Vec<Province>, RegionError>;

    async fn list_regencies(&self, province_id: &str) -> Result<Vec<Regency>, RegionError>;
}

/// Shared HTTP plumbing for both directories
#[derive(Debug, Clone)]
struct Transport {
    client: Arc<Client>,
    base_url: Url,
}

impl Transport {
    fn new(base_url: &str, timeout: Duration) -> Result<Self, RegionError> {
        let base_url =
            Url::parse(base_url).map_err(|e| RegionError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RegionError::Request(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
            base_url,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, RegionError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| RegionError::InvalidUrl(e.to_string()))?;

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| RegionError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Region directory returned {} for {}", status, path);
            return Err(RegionError::Status(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| RegionError::Malformed(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// alamat.thecloudalert.com
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CloudAlertEnvelope {
    status: Option<u16>,
    result: Option<Vec<CloudAlertItem>>,
}

#[derive(Debug, Deserialize)]
struct CloudAlertItem {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    text: String,
}

impl CloudAlertEnvelope {
    fn into_items(self) -> Result<Vec<CloudAlertItem>, RegionError> {
        match (self.status, self.result) {
            (Some(200), Some(items)) => Ok(items),
            (status, None) => Err(RegionError::Malformed(format!(
                "missing result (status {:?})",
                status
            ))),
            (status, Some(_)) => Err(RegionError::Malformed(format!(
                "envelope status {:?}",
                status
            ))),
        }
    }
}

/// Cloud Alert address API (`{status, result: [{id, text}]}` envelope)
#[derive(Debug, Clone)]
pub struct CloudAlertDirectory {
    transport: Transport,
}

impl CloudAlertDirectory {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RegionError> {
        Ok(Self {
            transport: Transport::new(base_url, timeout)?,
        })
    }
}

#[async_trait]
impl RegionDirectory for CloudAlertDirectory {
    #[instrument(skip(self), level = "info")]
    async fn list_provinces(&self) -> Result<Vec<Province>, RegionError> {
        let envelope: CloudAlertEnvelope = self.transport.get_json("provinsi/get/", &[]).await?;
        let provinces: Vec<Province> = envelope
            .into_items()?
            .into_iter()
            .map(|item| Province {
                id: item.id,
                display_name: item.text.trim().to_string(),
            })
            .collect();

        tracing::info!("Loaded {} provinces", provinces.len());
        Ok(provinces)
    }

    #[instrument(skip(self), level = "info")]
    async fn list_regencies(&self, province_id: &str) -> Result<Vec<Regency>, RegionError> {
        let envelope: CloudAlertEnvelope = self
            .transport
            .get_json("kabkota/get/", &[("d_provinsi_id", province_id)])
            .await?;

        Ok(envelope
            .into_items()?
            .into_iter()
            .map(|item| Regency {
                id: item.id,
                display_name: item.text.trim().to_string(),
                parent_province_id: province_id.to_string(),
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// emsifa api-wilayah-indonesia
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct EmsifaItem {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    name: String,
}

/// Static JSON region API (`provinces.json`, `regencies/<id>.json`)
#[derive(Debug, Clone)]
pub struct EmsifaDirectory {
    transport: Transport,
}

impl EmsifaDirectory {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RegionError> {
        Ok(Self {
            transport: Transport::new(base_url, timeout)?,
        })
    }
}

#[async_trait]
impl RegionDirectory for EmsifaDirectory {
    #[instrument(skip(self), level = "info")]
    async fn list_provinces(&self) -> Result<Vec<Province>, RegionError> {
        let items: Vec<EmsifaItem> = self.transport.get_json("provinces.json", &[]).await?;
        Ok(items
            .into_iter()
            .map(|item| Province {
                id: item.id,
                display_name: item.name.trim().to_string(),
            })
            .collect())
    }

    #[instrument(skip(self), level = "info")]
    async fn list_regencies(&self, province_id: &str) -> Result<Vec<Regency>, RegionError> {
        if province_id.is_empty() || !province_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(RegionError::InvalidUrl(format!(
                "bad province id {:?}",
                province_id
            )));
        }

        let path = format!("regencies/{}.json", province_id);
        let items: Vec<EmsifaItem> = self.transport.get_json(&path, &[]).await?;
        Ok(items
            .into_iter()
            .map(|item| Regency {
                id: item.id,
                display_name: item.name.trim().to_string(),
                parent_province_id: province_id.to_string(),
            })
            .collect())
    }
}
