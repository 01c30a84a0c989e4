//! Builds the production adapters from configuration.

use std::sync::Arc;
use std::time::Duration;

use cuaca_core::{AppError, Config, ConfigError, RegionProviderKind, API_KEY_ENV};
use cuaca_services::region::{CLOUD_ALERT_URL, EMSIFA_URL};
use cuaca_services::{BookmarkClient, CloudAlertDirectory, EmsifaDirectory, RegionDirectory};
use cuaca_weather::{ApiKeySource, HttpKeySource, NominatimGeocoder, OpenWeatherMapProvider, StaticKeySource};

use crate::connectivity::{Connectivity, FixedConnectivity, TcpProbe};
use crate::controller::Adapters;
use crate::error_mapping::IntoAppError;

/// Upper bound for the connectivity probe, independent of the request timeout
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

pub fn adapters_from_config(config: &Config) -> Result<Adapters, AppError> {
    let services = &config.services;
    let timeout = Duration::from_secs(services.request_timeout_secs);

    let regions: Arc<dyn RegionDirectory> = match services.region_provider {
        RegionProviderKind::CloudAlert => Arc::new(
            CloudAlertDirectory::new(&services.region_api_url, timeout)
                .map_err(IntoAppError::into_app_error)?,
        ),
        RegionProviderKind::Emsifa => {
            // The stock URL belongs to the other provider
            let base = if services.region_api_url == CLOUD_ALERT_URL {
                EMSIFA_URL
            } else {
                services.region_api_url.as_str()
            };
            Arc::new(EmsifaDirectory::new(base, timeout).map_err(IntoAppError::into_app_error)?)
        }
    };

    let geocoder = NominatimGeocoder::new(&services.geocoder_url, &services.user_agent, timeout)
        .map_err(IntoAppError::into_app_error)?;
    let weather = OpenWeatherMapProvider::new(
        &services.weather_api_url,
        &config.weather.language,
        &config.weather.units,
        timeout,
    )
    .map_err(IntoAppError::into_app_error)?;
    let bookmarks = BookmarkClient::new(&services.bookmark_api_url, timeout)
        .map_err(IntoAppError::into_app_error)?;

    let connectivity: Arc<dyn Connectivity> =
        match TcpProbe::for_url(&services.weather_api_url, PROBE_TIMEOUT) {
            Some(probe) => Arc::new(probe),
            None => {
                tracing::warn!("No connectivity probe target; assuming online");
                Arc::new(FixedConnectivity::new(true))
            }
        };

    Ok(Adapters {
        regions,
        geocoder: Arc::new(geocoder),
        weather: Arc::new(weather),
        bookmarks: Arc::new(bookmarks),
        connectivity,
    })
}

/// The key endpoint when one is configured, otherwise the local key.
pub fn key_source_from_config(config: &Config) -> Result<Box<dyn ApiKeySource>, AppError> {
    if let Some(url) = &config.services.key_endpoint_url {
        let timeout = Duration::from_secs(config.services.request_timeout_secs);
        let source = HttpKeySource::new(url, timeout).map_err(IntoAppError::into_app_error)?;
        return Ok(Box::new(source));
    }

    match config.weather.resolved_api_key() {
        Some(key) => Ok(Box::new(StaticKeySource::new(key))),
        None => Err(ConfigError::MissingSetting(format!(
            "weather.api_key (or {})",
            API_KEY_ENV
        ))
        .into()),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_adapters_from_default_config() {
        assert!(adapters_from_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_emsifa_provider() {
        let mut config = Config::default();
        config.services.region_provider = RegionProviderKind::Emsifa;
        assert!(adapters_from_config(&config).is_ok());
    }

    #[test]
    fn test_bad_region_url() {
        let mut config = Config::default();
        config.services.region_api_url = "nope".into();
        let err = adapters_from_config(&config).err().unwrap();
        assert!(matches!(err, AppError::RegionService(_)));
    }

    #[tokio::test]
    async fn test_key_endpoint_preferred() {
        let mut config = Config::default();
        config.weather.api_key = Some("local".into());
        config.services.key_endpoint_url = Some("http://127.0.0.1:9/api/key".into());

        // Endpoint is unreachable, so the HTTP source is the one in use
        let source = key_source_from_config(&config).unwrap();
        assert!(source.fetch_key().await.is_err());
    }
}
