//! Render model for the result panel.
//!
//! Everything here is a pure function of its inputs. The presentation layer
//! draws these structs however it likes.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use cuaca_core::{AppError, MapConfig};
use cuaca_weather::{
    clean_location_name, local_clock_at, timezone_name, title_case, ForecastDay, GeoResult,
    WeatherSnapshot,
};

use crate::translations::TranslationTables;

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// What the result panel currently shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Panel {
    Placeholder(PlaceholderView),
    Loading,
    Card(Box<WeatherCardView>),
    Error(ErrorView),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceholderView {
    pub message: String,
}

impl Default for PlaceholderView {
    fn default() -> Self {
        Self {
            message: "Select a province and regency to see the weather.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorView {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherCardView {
    pub title: String,
    pub province: String,
    pub condition: String,
    pub temperature: String,
    pub humidity: String,
    pub pressure: String,
    pub wind: String,
    pub icon_url: String,
    pub local_time: String,
    pub timezone: String,
    pub forecast: Vec<ForecastItemView>,
    pub map: MapView,
    pub bookmarked: bool,
    /// Set when the geocoder resolved to a place that does not carry the
    /// requested name
    pub nearby_notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastItemView {
    pub day_label: String,
    pub icon_url: String,
    pub condition: String,
    pub temperature: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: u8,
    pub base_tile_url: String,
    pub overlay_tile_url: String,
    pub overlay_opacity: f64,
    pub marker: MapMarker,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub latitude: f64,
    pub longitude: f64,
    pub label: String,
}

/// Build the weather card for a resolved regency.
pub fn render_weather_card(
    regency_name: &str,
    province_name: &str,
    location: &GeoResult,
    weather: &WeatherSnapshot,
    translations: &TranslationTables,
    map: &MapConfig,
    api_key: &str,
    bookmarked: bool,
    now_unix: i64,
) -> WeatherCardView {
    let current = &weather.current;
    let title = title_case(regency_name.trim());

    WeatherCardView {
        province: title_case(province_name.trim()),
        condition: condition_text(&current.description, translations),
        temperature: format!("{}°C", current.temperature_c),
        humidity: format!("{}%", current.humidity_pct),
        pressure: format!("{} hPa", current.pressure_hpa),
        wind: format!("{} m/s", current.wind_speed),
        icon_url: format!("{}/{}@2x.png", ICON_BASE_URL, current.icon_id),
        local_time: local_clock_at(
            current.observed_at_unix,
            current.timezone_offset_seconds,
            now_unix,
        ),
        timezone: timezone_name(current.timezone_offset_seconds).to_string(),
        forecast: weather
            .forecast
            .iter()
            .map(|day| forecast_item(day, translations))
            .collect(),
        map: map_view(location, map, api_key, &title),
        bookmarked,
        nearby_notice: nearby_notice(regency_name, location),
        title,
    }
}

/// Inline error message. `online` is the connectivity signal at failure time.
pub fn render_error(error: &AppError, online: bool) -> ErrorView {
    let message = if !online && error.is_network_failure() {
        AppError::Offline.user_message()
    } else {
        error.user_message()
    };
    ErrorView {
        message: message.to_string(),
    }
}

fn condition_text(description: &str, translations: &TranslationTables) -> String {
    title_case(translations.condition(description).unwrap_or(description))
}

fn forecast_item(day: &ForecastDay, translations: &TranslationTables) -> ForecastItemView {
    ForecastItemView {
        day_label: day_label(day.date),
        icon_url: format!("{}/{}.png", ICON_BASE_URL, day.icon_id),
        condition: condition_text(&day.description, translations),
        temperature: format!("{}°C", day.temperature_c),
    }
}

fn map_view(location: &GeoResult, map: &MapConfig, api_key: &str, label: &str) -> MapView {
    MapView {
        latitude: location.latitude,
        longitude: location.longitude,
        zoom: map.zoom,
        base_tile_url: map.base_tile_url.clone(),
        overlay_tile_url: map.overlay_tile_url.replace("{key}", api_key),
        overlay_opacity: map.overlay_opacity,
        marker: MapMarker {
            latitude: location.latitude,
            longitude: location.longitude,
            label: label.to_string(),
        },
    }
}

fn nearby_notice(regency_name: &str, location: &GeoResult) -> Option<String> {
    let requested = clean_location_name(regency_name).to_lowercase();
    if requested.is_empty() || location.resolved_name.to_lowercase().contains(&requested) {
        return None;
    }
    Some(format!(
        "Showing weather for the nearest match: {}",
        location.resolved_name
    ))
}

/// `"Senin, 14 Okt"`
pub fn day_label(date: NaiveDate) -> String {
    format!(
        "{}, {} {}",
        day_name(date.weekday()),
        date.day(),
        month_abbrev(date.month())
    )
}

fn day_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Senin",
        Weekday::Tue => "Selasa",
        Weekday::Wed => "Rabu",
        Weekday::Thu => "Kamis",
        Weekday::Fri => "Jumat",
        Weekday::Sat => "Sabtu",
        Weekday::Sun => "Minggu",
    }
}

fn month_abbrev(month: u32) -> &'static str {
    match month {
        1 => "Jan",
        2 => "Feb",
        3 => "Mar",
        4 => "Apr",
        5 => "Mei",
        6 => "Jun",
        7 => "Jul",
        8 => "Agu",
        9 => "Sep",
        10 => "Okt",
        11 => "Nov",
        _ => "Des",
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use std::collections::HashMap;

    use cuaca_weather::CurrentConditions;

    // 2024-10-14T05:30:15Z
    const OBSERVED: i64 = 1_728_883_815;

    fn snapshot() -> WeatherSnapshot {
        WeatherSnapshot {
            current: CurrentConditions {
                description: "hujan ringan".into(),
                temperature_c: 29.4,
                humidity_pct: 74,
                pressure_hpa: 1009,
                wind_speed: 3.6,
                icon_id: "10d".into(),
                timezone_offset_seconds: 25200,
                observed_at_unix: OBSERVED,
            },
            forecast: vec![
                ForecastDay {
                    date: NaiveDate::from_ymd_opt(2024, 10, 14).unwrap(),
                    observed_at_unix: OBSERVED,
                    description: "awan mendung".into(),
                    temperature_c: 30.0,
                    icon_id: "04d".into(),
                },
                ForecastDay {
                    date: NaiveDate::from_ymd_opt(2024, 10, 15).unwrap(),
                    observed_at_unix: OBSERVED + 86_400,
                    description: "cerah".into(),
                    temperature_c: 31.5,
                    icon_id: "01d".into(),
                },
            ],
        }
    }

    fn location(name: &str) -> GeoResult {
        GeoResult {
            resolved_name: name.into(),
            latitude: -6.2615,
            longitude: 106.8106,
        }
    }

    fn card(regency: &str, resolved: &str, tables: &TranslationTables) -> WeatherCardView {
        render_weather_card(
            regency,
            "DKI JAKARTA",
            &location(resolved),
            &snapshot(),
            tables,
            &MapConfig::default(),
            "abc",
            false,
            OBSERVED,
        )
    }

    #[test]
    fn test_card_fields() {
        let view = card(
            "KOTA JAKARTA SELATAN",
            "Jakarta Selatan, Daerah Khusus Ibukota Jakarta, Indonesia",
            &TranslationTables::default(),
        );

        assert_eq!(view.title, "Kota Jakarta Selatan");
        assert_eq!(view.province, "Dki Jakarta");
        assert_eq!(view.condition, "Hujan Ringan");
        assert_eq!(view.temperature, "29.4°C");
        assert_eq!(view.humidity, "74%");
        assert_eq!(view.pressure, "1009 hPa");
        assert_eq!(view.wind, "3.6 m/s");
        assert_eq!(view.icon_url, "https://openweathermap.org/img/wn/10d@2x.png");
        assert_eq!(view.local_time, "12:30:15");
        assert_eq!(view.timezone, "Asia/Jakarta");
        assert!(!view.bookmarked);
        assert!(view.nearby_notice.is_none());
    }

    #[test]
    fn test_forecast_items() {
        let view = card("Kota Jakarta Selatan", "Jakarta Selatan", &TranslationTables::default());

        assert_eq!(view.forecast.len(), 2);
        assert_eq!(view.forecast[0].day_label, "Senin, 14 Okt");
        assert_eq!(view.forecast[0].temperature, "30°C");
        assert_eq!(view.forecast[0].condition, "Awan Mendung");
        assert_eq!(view.forecast[0].icon_url, "https://openweathermap.org/img/wn/04d.png");
        assert_eq!(view.forecast[1].day_label, "Selasa, 15 Okt");
    }

    #[test]
    fn test_map_view() {
        let view = card("Kota Jakarta Selatan", "Jakarta Selatan", &TranslationTables::default());

        assert_eq!(view.map.zoom, 10);
        assert_eq!(view.map.overlay_opacity, 0.5);
        assert!(view.map.overlay_tile_url.ends_with("appid=abc"));
        assert!(!view.map.overlay_tile_url.contains("{key}"));
        assert_eq!(view.map.marker.latitude, view.map.latitude);
        assert_eq!(view.map.marker.label, "Kota Jakarta Selatan");
    }

    #[test]
    fn test_condition_translation() {
        let conditions = HashMap::from([("hujan ringan".to_string(), "gerimis".to_string())]);
        let tables = TranslationTables::new(HashMap::new(), conditions);
        let view = card("Kota Bandung", "Bandung", &tables);
        assert_eq!(view.condition, "Gerimis");
    }

    #[test]
    fn test_nearby_notice() {
        let view = card("Kabupaten Kepulauan Seribu", "Jakarta Utara, Indonesia", &TranslationTables::default());
        let notice = view.nearby_notice.unwrap();
        assert!(notice.contains("Jakarta Utara"));
    }

    #[test]
    fn test_day_labels() {
        let sunday = NaiveDate::from_ymd_opt(2024, 10, 20).unwrap();
        assert_eq!(day_label(sunday), "Minggu, 20 Okt");
        let may = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        assert_eq!(day_label(may), "Kamis, 1 Mei");
    }

    #[test]
    fn test_error_view() {
        let err = AppError::LocationNotFound("x".into());
        assert_eq!(render_error(&err, true).message, err.user_message());
        assert_eq!(render_error(&err, false).message, "No internet connection.");

        let invalid = AppError::InvalidSelection("x".into());
        assert_eq!(render_error(&invalid, false).message, invalid.user_message());
    }

    #[test]
    fn test_placeholder() {
        assert!(PlaceholderView::default().message.contains("regency"));
    }
}
