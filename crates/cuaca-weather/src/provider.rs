//! Current conditions and forecast from OpenWeatherMap.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::instrument;

use crate::forecast::build_forecast_digest;
use crate::types::{CurrentConditions, RawForecastEntry, WeatherError, WeatherSnapshot};

const SERVICE: &str = "openweathermap";

/// Source of current conditions and sub-daily forecasts
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current_conditions(
        &self,
        api_key: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<CurrentConditions, WeatherError>;

    async fn forecast(
        &self,
        api_key: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<RawForecastEntry>, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    #[serde(default)]
    humidity: u8,
    #[serde(default)]
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwmCurrent {
    weather: Vec<OwmCondition>,
    main: OwmMain,
    wind: OwmWind,
    dt: i64,
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwmForecastItem {
    dt: i64,
    main: OwmMain,
    weather: Vec<OwmCondition>,
}

#[derive(Debug, Deserialize)]
struct OwmForecast {
    list: Vec<OwmForecastItem>,
}

fn first_condition(conditions: Vec<OwmCondition>) -> Result<OwmCondition, WeatherError> {
    conditions
        .into_iter()
        .next()
        .ok_or_else(|| WeatherError::WeatherService("response has no weather condition".into()))
}

/// OpenWeatherMap 2.5 API client
#[derive(Debug, Clone)]
pub struct OpenWeatherMapProvider {
    client: Arc<Client>,
    base_url: String,
    language: String,
    units: String,
}

impl OpenWeatherMapProvider {
    pub fn new(
        base_url: &str,
        language: &str,
        units: &str,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WeatherError::WeatherService(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
            language: language.to_string(),
            units: units.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        api_key: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<T, WeatherError> {
        let url = format!("{}/data/2.5/{}", self.base_url, endpoint);
        let lat = latitude.to_string();
        let lon = longitude.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", api_key),
                ("units", self.units.as_str()),
                ("lang", self.language.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::debug!("Weather request to {} failed: {}", endpoint, e);
                WeatherError::WeatherService(e.to_string())
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("Weather provider rate limited on {}", endpoint);
            return Err(WeatherError::RateLimited { service: SERVICE });
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(WeatherError::WeatherService(format!("{}: {}", status, text)));
        }

        response
            .json()
            .await
            .map_err(|e| WeatherError::WeatherService(format!("parse error: {}", e)))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherMapProvider {
    #[instrument(skip(self, api_key), level = "info")]
    async fn current_conditions(
        &self,
        api_key: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<CurrentConditions, WeatherError> {
        let body: OwmCurrent = self.get_json("weather", api_key, latitude, longitude).await?;
        let condition = first_condition(body.weather)?;

        Ok(CurrentConditions {
            description: condition.description,
            temperature_c: body.main.temp,
            humidity_pct: body.main.humidity,
            pressure_hpa: body.main.pressure,
            wind_speed: body.wind.speed,
            icon_id: condition.icon,
            timezone_offset_seconds: body.timezone,
            observed_at_unix: body.dt,
        })
    }

    #[instrument(skip(self, api_key), level = "info")]
    async fn forecast(
        &self,
        api_key: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<RawForecastEntry>, WeatherError> {
        let body: OwmForecast = self.get_json("forecast", api_key, latitude, longitude).await?;

        body.list
            .into_iter()
            .map(|item| -> Result<RawForecastEntry, WeatherError> {
                let condition = first_condition(item.weather)?;
                Ok(RawForecastEntry {
                    observed_at_unix: item.dt,
                    description: condition.description,
                    temperature_c: item.main.temp,
                    icon_id: condition.icon,
                })
            })
            .collect()
    }
}

/// Fetch current conditions and the forecast concurrently.
///
/// Both requests must succeed. If either one is throttled the whole fetch
/// fails with `RateLimited`, even when the other succeeded. No retry.
#[instrument(skip(provider, api_key), level = "info")]
pub async fn fetch_weather(
    provider: &dyn WeatherProvider,
    api_key: &str,
    latitude: f64,
    longitude: f64,
) -> Result<WeatherSnapshot, WeatherError> {
    let (current, forecast) = tokio::join!(
        provider.current_conditions(api_key, latitude, longitude),
        provider.forecast(api_key, latitude, longitude),
    );

    match (current, forecast) {
        (Ok(current), Ok(entries)) => {
            let forecast = build_forecast_digest(&entries, current.timezone_offset_seconds);
            tracing::info!(
                "Fetched weather: {} with {} forecast days",
                current.description,
                forecast.len()
            );
            Ok(WeatherSnapshot { current, forecast })
        }
        (Err(e @ WeatherError::RateLimited { .. }), _)
        | (_, Err(e @ WeatherError::RateLimited { .. })) => Err(e),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!("Weather fetch failed: {}", e);
            Err(match e {
                WeatherError::WeatherService(_) => e,
                other => WeatherError::WeatherService(other.to_string()),
            })
        }
    }
}
