//! Forward geocoding: regency/province names to coordinates.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use tracing::instrument;

use crate::cache::GeocodeCache;
use crate::types::{GeoCandidate, GeoResult, PlaceType, WeatherError};

/// Country filter passed to the geocoder
pub const COUNTRY_FILTER: &str = "ID";
/// Maximum number of candidates requested per search
pub const CANDIDATE_LIMIT: usize = 10;

const SERVICE: &str = "nominatim";

/// Resolves free-text place names to candidates
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn search(
        &self,
        query: &str,
        country: &str,
        limit: usize,
    ) -> Result<Vec<GeoCandidate>, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    display_name: String,
    #[serde(default)]
    name: String,
    lat: String,
    lon: String,
    #[serde(rename = "type", default)]
    place_type: String,
    importance: Option<f64>,
}

impl NominatimPlace {
    fn into_candidate(self) -> Option<GeoCandidate> {
        let latitude = self.lat.parse().ok()?;
        let longitude = self.lon.parse().ok()?;
        Some(GeoCandidate {
            display_name: self.display_name,
            short_name: self.name,
            latitude,
            longitude,
            place_type: PlaceType::from_osm(&self.place_type),
            relevance: self.importance,
        })
    }
}

/// Nominatim search client
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Arc<Client>,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| WeatherError::LocationService(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    #[instrument(skip(self), level = "info")]
    async fn search(
        &self,
        query: &str,
        country: &str,
        limit: usize,
    ) -> Result<Vec<GeoCandidate>, WeatherError> {
        let url = format!("{}/search", self.base_url);
        let limit = limit.to_string();

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT_LANGUAGE, "id")
            .query(&[
                ("q", query),
                ("format", "json"),
                ("limit", limit.as_str()),
                ("countrycodes", country),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::debug!("Geocode request failed: {}", e);
                WeatherError::LocationService(e.to_string())
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("Geocoder rate limited");
            return Err(WeatherError::RateLimited { service: SERVICE });
        }
        if !status.is_success() {
            tracing::debug!("Geocode returned status {}", status);
            return Err(WeatherError::LocationService(format!(
                "geocoder returned {}",
                status
            )));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| WeatherError::LocationService(format!("parse error: {}", e)))?;

        let total = places.len();
        let candidates: Vec<GeoCandidate> = places
            .into_iter()
            .filter_map(NominatimPlace::into_candidate)
            .collect();
        if candidates.len() < total {
            tracing::debug!(
                "Dropped {} candidates with unparsable coordinates",
                total - candidates.len()
            );
        }

        Ok(candidates)
    }
}

/// `"<city>, <province>, Indonesia"`
pub fn build_query(city: &str, province: &str) -> String {
    format!("{}, {}, Indonesia", city.trim(), province.trim())
}

/// Pick the best candidate for `city` in `province`.
///
/// Candidates are ranked by descending relevance (missing = 0, ties keep the
/// upstream order). A candidate whose display name contains
/// `"<city>, <province>"` or whose short name equals `city` (both
/// case-insensitive) wins over rank. When the pick is not a settlement, the
/// highest-ranked settlement replaces it if one exists.
pub fn select_candidate(
    mut candidates: Vec<GeoCandidate>,
    city: &str,
    province: &str,
) -> Option<GeoCandidate> {
    if candidates.is_empty() {
        return None;
    }

    candidates.sort_by(|a, b| {
        b.relevance
            .unwrap_or(0.0)
            .total_cmp(&a.relevance.unwrap_or(0.0))
    });

    let full_name = format!("{}, {}", city.trim(), province.trim()).to_lowercase();
    let city_term = city.trim().to_lowercase();

    let mut index = candidates
        .iter()
        .position(|c| {
            c.display_name.to_lowercase().contains(&full_name)
                || c.short_name.to_lowercase() == city_term
        })
        .unwrap_or(0);

    if !candidates[index].place_type.is_settlement() {
        if let Some(settlement) = candidates.iter().position(|c| c.place_type.is_settlement()) {
            tracing::debug!(
                "Substituting {:?} candidate with settlement {}",
                candidates[index].place_type,
                candidates[settlement].display_name
            );
            index = settlement;
        }
    }

    Some(candidates.swap_remove(index))
}

/// Resolve a cleaned regency name and province to coordinates.
///
/// Results are memoized in `cache` by the exact query string; a hit issues no
/// upstream call.
#[instrument(skip(geocoder, cache), level = "info")]
pub async fn resolve_location(
    geocoder: &dyn Geocoder,
    cache: &GeocodeCache,
    city: &str,
    province: &str,
) -> Result<GeoResult, WeatherError> {
    let query = build_query(city, province);

    if let Some(hit) = cache.get(&query) {
        tracing::debug!("Geocode cache hit for {}", query);
        return Ok(hit);
    }

    let candidates = geocoder
        .search(&query, COUNTRY_FILTER, CANDIDATE_LIMIT)
        .await?;

    let chosen = select_candidate(candidates, city, province)
        .ok_or_else(|| WeatherError::LocationNotFound(query.clone()))?;

    let result = GeoResult::from(chosen);
    tracing::info!(
        "Resolved {} to {} ({:.4}, {:.4})",
        query,
        result.resolved_name,
        result.latitude,
        result.longitude
    );

    cache.insert(query, result.clone());
    Ok(result)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use parking_lot::Mutex;

    fn candidate(name: &str, short: &str, kind: &str, relevance: Option<f64>) -> GeoCandidate {
        GeoCandidate {
            display_name: name.to_string(),
            short_name: short.to_string(),
            latitude: -6.2,
            longitude: 106.8,
            place_type: PlaceType::from_osm(kind),
            relevance,
        }
    }

    #[test]
    fn test_build_query() {
        assert_eq!(
            build_query("Jakarta Selatan", "DKI Jakarta"),
            "Jakarta Selatan, DKI Jakarta, Indonesia"
        );
    }

    #[test]
    fn test_select_highest_relevance_without_match() {
        let candidates = vec![
            candidate("A, Somewhere", "A", "city", Some(0.4)),
            candidate("B, Somewhere", "B", "city", Some(0.9)),
            candidate("C, Somewhere", "C", "city", Some(0.2)),
        ];
        let chosen = select_candidate(candidates, "Sleman", "DI Yogyakarta").unwrap();
        assert_eq!(chosen.short_name, "B");
    }

    #[test]
    fn test_full_name_match_beats_relevance() {
        let candidates = vec![
            candidate("Malang, Jawa Timur, Indonesia", "Malang", "city", Some(0.9)),
            candidate(
                "Kepanjen, Jawa Timur, Indonesia",
                "Kecamatan Kepanjen",
                "town",
                Some(0.3),
            ),
        ];
        let chosen = select_candidate(candidates, "Kepanjen", "Jawa Timur").unwrap();
        assert_eq!(chosen.short_name, "Kecamatan Kepanjen");
    }

    #[test]
    fn test_short_name_match_is_case_insensitive() {
        let candidates = vec![
            candidate("Somewhere Else", "Other", "city", Some(0.8)),
            candidate("Kabupaten Sleman", "SLEMAN", "administrative", Some(0.5)),
        ];
        let chosen = select_candidate(candidates, "Sleman", "DI Yogyakarta").unwrap();
        assert_eq!(chosen.short_name, "SLEMAN");
    }

    #[test]
    fn test_missing_relevance_ranks_as_zero() {
        let candidates = vec![
            candidate("A", "A", "city", None),
            candidate("B", "B", "city", Some(0.1)),
        ];
        let chosen = select_candidate(candidates, "Z", "Y").unwrap();
        assert_eq!(chosen.short_name, "B");
    }

    #[test]
    fn test_non_settlement_is_substituted() {
        let candidates = vec![
            candidate("Warung Bogor", "Warung", "restaurant", Some(0.9)),
            candidate("Bogor, Jawa Barat", "Bogor Kota", "city", Some(0.5)),
        ];
        let chosen = select_candidate(candidates, "Depok", "Jawa Barat").unwrap();
        assert_eq!(chosen.place_type, PlaceType::City);
        assert_eq!(chosen.short_name, "Bogor Kota");
    }

    #[test]
    fn test_town_counts_as_settlement() {
        let candidates = vec![
            candidate("Jalan Wates", "Jalan", "residential", Some(0.9)),
            candidate("Wates, Kulon Progo", "Wates Town", "town", Some(0.4)),
        ];
        let chosen = select_candidate(candidates, "Kulon Progo", "DI Yogyakarta").unwrap();
        assert_eq!(chosen.place_type, PlaceType::Town);
    }

    #[test]
    fn test_non_settlement_kept_when_no_alternative() {
        let candidates = vec![
            candidate("Pantai Kuta", "Kuta", "beach", Some(0.9)),
            candidate("Jalan Kuta", "Jalan", "road", Some(0.4)),
        ];
        let chosen = select_candidate(candidates, "Badung", "Bali").unwrap();
        assert_eq!(chosen.short_name, "Kuta");
    }

    #[test]
    fn test_empty_candidates() {
        assert!(select_candidate(Vec::new(), "Badung", "Bali").is_none());
    }

    struct CountingGeocoder {
        calls: Mutex<usize>,
        results: Vec<GeoCandidate>,
    }

    #[async_trait]
    impl Geocoder for CountingGeocoder {
        async fn search(
            &self,
            _query: &str,
            _country: &str,
            _limit: usize,
        ) -> Result<Vec<GeoCandidate>, WeatherError> {
            *self.calls.lock() += 1;
            Ok(self.results.clone())
        }
    }

    #[tokio::test]
    async fn test_resolve_location_memoizes() {
        let geocoder = CountingGeocoder {
            calls: Mutex::new(0),
            results: vec![candidate(
                "Jakarta Selatan, Daerah Khusus Ibukota Jakarta, Indonesia",
                "Jakarta Selatan",
                "city",
                Some(0.6),
            )],
        };
        let cache = GeocodeCache::new();

        let first = resolve_location(&geocoder, &cache, "Jakarta Selatan", "DKI Jakarta")
            .await
            .unwrap();
        let second = resolve_location(&geocoder, &cache, "Jakarta Selatan", "DKI Jakarta")
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(*geocoder.calls.lock(), 1);
        assert!(cache
            .get("Jakarta Selatan, DKI Jakarta, Indonesia")
            .is_some());
    }

    #[tokio::test]
    async fn test_resolve_location_not_found() {
        let geocoder = CountingGeocoder {
            calls: Mutex::new(0),
            results: Vec::new(),
        };
        let cache = GeocodeCache::new();

        let err = resolve_location(&geocoder, &cache, "Atlantis", "Bali")
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherError::LocationNotFound(q) if q == "Atlantis, Bali, Indonesia"));
        assert!(cache.is_empty());
    }
}
