//! Integration tests for NominatimGeocoder and resolve_location using wiremock.

use std::time::Duration;

use cuaca_weather::{resolve_location, GeocodeCache, Geocoder, NominatimGeocoder, PlaceType, WeatherError};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_AGENT: &str = "CuacaTest/1.0";

fn geocoder(server: &MockServer) -> NominatimGeocoder {
    NominatimGeocoder::new(&server.uri(), USER_AGENT, Duration::from_secs(5)).unwrap()
}

/// Helper to create a Nominatim search hit
fn place(display: &str, name: &str, kind: &str, importance: Option<f64>) -> serde_json::Value {
    let mut value = serde_json::json!({
        "place_id": 1,
        "display_name": display,
        "name": name,
        "lat": "-6.2615",
        "lon": "106.8106",
        "class": "boundary",
        "type": kind,
    });
    if let Some(score) = importance {
        value["importance"] = serde_json::json!(score);
    }
    value
}

#[tokio::test]
async fn test_search_sends_filters_and_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Jakarta Selatan, DKI Jakarta, Indonesia"))
        .and(query_param("format", "json"))
        .and(query_param("limit", "10"))
        .and(query_param("countrycodes", "ID"))
        .and(header("user-agent", USER_AGENT))
        .and(header("accept-language", "id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            place(
                "Jakarta Selatan, Daerah Khusus Ibukota Jakarta, Indonesia",
                "Jakarta Selatan",
                "administrative",
                Some(0.62)
            )
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let candidates = geocoder(&mock_server)
        .search("Jakarta Selatan, DKI Jakarta, Indonesia", "ID", 10)
        .await
        .unwrap();

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].short_name, "Jakarta Selatan");
    assert_eq!(candidates[0].place_type, PlaceType::AdministrativeArea);
    assert_eq!(candidates[0].relevance, Some(0.62));
    assert!((candidates[0].latitude + 6.2615).abs() < 1e-9);
}

#[tokio::test]
async fn test_search_drops_unparsable_coordinates() {
    let mock_server = MockServer::start().await;

    let mut broken = place("Broken", "Broken", "city", None);
    broken["lat"] = serde_json::json!("not-a-number");

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            broken,
            place("Bandung, Jawa Barat, Indonesia", "Bandung", "city", None),
        ])))
        .mount(&mock_server)
        .await;

    let candidates = geocoder(&mock_server).search("Bandung", "ID", 10).await.unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].short_name, "Bandung");
    assert_eq!(candidates[0].relevance, None);
}

#[tokio::test]
async fn test_resolve_location_hits_upstream_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            place("Sleman, Daerah Istimewa Yogyakarta, Indonesia", "Sleman", "administrative", Some(0.5)),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let geocoder = geocoder(&mock_server);
    let cache = GeocodeCache::new();

    let first = resolve_location(&geocoder, &cache, "Sleman", "DI Yogyakarta").await.unwrap();
    let second = resolve_location(&geocoder, &cache, "Sleman", "DI Yogyakarta").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.resolved_name, "Sleman, Daerah Istimewa Yogyakarta, Indonesia");
    // MockServer verifies `.expect(1)` on drop
}

#[tokio::test]
async fn test_resolve_location_empty_result() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&mock_server)
        .await;

    let cache = GeocodeCache::new();
    let err = resolve_location(&geocoder(&mock_server), &cache, "Nowhere", "Papua")
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::LocationNotFound(_)));
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_rate_limited() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let cache = GeocodeCache::new();
    let err = resolve_location(&geocoder(&mock_server), &cache, "Badung", "Bali")
        .await
        .unwrap_err();

    assert!(err.is_rate_limited(), "expected RateLimited, got {:?}", err);
}

#[tokio::test]
async fn test_server_error_is_location_service_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let cache = GeocodeCache::new();
    let err = resolve_location(&geocoder(&mock_server), &cache, "Badung", "Bali")
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::LocationService(msg) if msg.contains("503")));
}
