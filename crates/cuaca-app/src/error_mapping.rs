//! Maps adapter errors to cuaca_core::AppError for consistent user-facing messages.

use cuaca_core::AppError;
use cuaca_services::{BookmarkError, RegionError};
use cuaca_weather::WeatherError;

/// Conversion into the application error taxonomy.
///
/// A trait rather than `From` because both sides live in other crates.
pub trait IntoAppError {
    fn into_app_error(self) -> AppError;
}

impl IntoAppError for WeatherError {
    fn into_app_error(self) -> AppError {
        match self {
            WeatherError::LocationNotFound(query) => AppError::LocationNotFound(query),
            WeatherError::RateLimited { service } => AppError::RateLimited {
                service: service.to_string(),
            },
            WeatherError::LocationService(msg) => AppError::LocationService(msg),
            WeatherError::WeatherService(msg) => AppError::WeatherService(msg),
            WeatherError::KeyUnavailable(msg) => {
                AppError::WeatherService(format!("API key unavailable: {}", msg))
            }
        }
    }
}

impl IntoAppError for RegionError {
    fn into_app_error(self) -> AppError {
        AppError::RegionService(self.to_string())
    }
}

impl IntoAppError for BookmarkError {
    fn into_app_error(self) -> AppError {
        match self {
            BookmarkError::RateLimited => AppError::RateLimited {
                service: "bookmarks".to_string(),
            },
            BookmarkError::Service(msg) => AppError::BookmarkService(msg),
        }
    }
}

/// Network failures observed while the device is offline are reported as
/// [`AppError::Offline`]. Everything else passes through.
pub fn apply_connectivity(error: AppError, online: bool) -> AppError {
    if !online && error.is_network_failure() {
        tracing::debug!("Reporting {} as offline", error);
        AppError::Offline
    } else {
        error
    }
}
