use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Place classification reported by the geocoder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceType {
    City,
    AdministrativeArea,
    Town,
    Other(String),
}

impl PlaceType {
    /// Map an OpenStreetMap `type` value
    pub fn from_osm(value: &str) -> Self {
        match value {
            "city" => Self::City,
            "administrative" => Self::AdministrativeArea,
            "town" => Self::Town,
            other => Self::Other(other.to_string()),
        }
    }

    /// City, administrative area or town. Anything else (a restaurant, a
    /// street) is a poor anchor for a regency weather lookup.
    pub fn is_settlement(&self) -> bool {
        matches!(self, Self::City | Self::AdministrativeArea | Self::Town)
    }
}

/// One geocoder search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoCandidate {
    pub display_name: String,
    pub short_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub place_type: PlaceType,
    /// Relevance score; missing scores rank as zero
    pub relevance: Option<f64>,
}

/// Resolved coordinates for a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoResult {
    pub resolved_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<GeoCandidate> for GeoResult {
    fn from(candidate: GeoCandidate) -> Self {
        Self {
            resolved_name: candidate.display_name,
            latitude: candidate.latitude,
            longitude: candidate.longitude,
        }
    }
}

/// Current conditions at a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub description: String,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: u32,
    pub wind_speed: f64,
    pub icon_id: String,
    /// Location's offset from UTC
    pub timezone_offset_seconds: i32,
    pub observed_at_unix: i64,
}

/// Sub-daily forecast entry as returned by the provider (3-hour steps)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawForecastEntry {
    pub observed_at_unix: i64,
    pub description: String,
    pub temperature_c: f64,
    pub icon_id: String,
}

/// One day of the forecast digest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    /// Calendar date at the location
    pub date: NaiveDate,
    pub observed_at_unix: i64,
    pub description: String,
    pub temperature_c: f64,
    pub icon_id: String,
}

/// Current conditions plus the daily digest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub current: CurrentConditions,
    pub forecast: Vec<ForecastDay>,
}

/// Weather and geocoding errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum WeatherError {
    #[error("Location not found: {0}")]
    LocationNotFound(String),
    #[error("Rate limited by {service}")]
    RateLimited { service: &'static str },
    #[error("Location service error: {0}")]
    LocationService(String),
    #[error("Weather service error: {0}")]
    WeatherService(String),
    #[error("API key unavailable: {0}")]
    KeyUnavailable(String),
}

impl WeatherError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}
