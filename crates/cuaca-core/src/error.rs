//! Centralized error types for the Cuaca application.
//!
//! Every failure a user action can hit is expressed as an [`AppError`]. The
//! presentation layer only ever shows [`AppError::user_message`]; the `Display`
//! output keeps the full context for logs.

use thiserror::Error;

/// Top-level application error type.
///
/// All errors raised while handling a province/regency selection or a bookmark
/// action end up here. None of them are fatal: the user can re-select and retry.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Rate limited by {service}")]
    RateLimited { service: String },

    #[error("Location service error: {0}")]
    LocationService(String),

    #[error("Weather service error: {0}")]
    WeatherService(String),

    #[error("Bookmark service error: {0}")]
    BookmarkService(String),

    #[error("Region service error: {0}")]
    RegionService(String),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("No internet connection")]
    Offline,

    /// An operation ran before the session finished loading its key and tables.
    #[error("Session not initialized: {0}")]
    NotInitialized(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for the inline error panel.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::LocationNotFound(_) => "Location not found. Try another regency.",
            AppError::RateLimited { .. } => "Request limit reached. Wait a moment and try again.",
            AppError::LocationService(_) => "Failed to load the location. Please try again.",
            AppError::WeatherService(_) => "Failed to load the weather. Please try again.",
            AppError::BookmarkService(_) => "Bookmark request failed. Please try again.",
            AppError::RegionService(_) => "Failed to load region data. Please try again.",
            AppError::InvalidSelection(_) => "Invalid location. Select a province first.",
            AppError::Offline => "No internet connection.",
            AppError::NotInitialized(_) => "The app is still starting. Please try again.",
            AppError::Config(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }

    /// Whether the error came from a network round trip, which is when the
    /// connectivity signal is consulted.
    pub fn is_network_failure(&self) -> bool {
        matches!(
            self,
            AppError::LocationService(_)
                | AppError::WeatherService(_)
                | AppError::BookmarkService(_)
                | AppError::RegionService(_)
                | AppError::RateLimited { .. }
                | AppError::LocationNotFound(_)
        )
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "Configuration not found. Using defaults.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::MissingSetting(_) => "A required setting is missing. Check your settings.",
        }
    }
}
