//! Weather lookup for Indonesian regencies.
//!
//! Resolves a regency/province pair to coordinates via Nominatim, fetches
//! current conditions and the forecast from OpenWeatherMap, and reduces the
//! forecast to one entry per local calendar day.

pub mod cache;
pub mod clock;
pub mod forecast;
pub mod geocode;
pub mod key;
pub mod names;
pub mod provider;
pub mod types;

pub use cache::GeocodeCache;
pub use clock::{local_clock_at, local_clock_tick, timezone_name, zone_for_offset};
pub use forecast::{build_forecast_digest, FORECAST_DAYS};
pub use geocode::{build_query, resolve_location, select_candidate, Geocoder, NominatimGeocoder};
pub use key::{ApiKeySource, HttpKeySource, StaticKeySource};
pub use names::{clean_location_name, title_case};
pub use provider::{fetch_weather, OpenWeatherMapProvider, WeatherProvider};
pub use types::*;
