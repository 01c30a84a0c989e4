//! Per-session state: API key, translation tables and the geocode cache.
//!
//! A `SessionContext` is created explicitly and handed to every operation that
//! needs it. Initialization loads the key first, then the tables. Anything
//! that needs either before that has finished fails with
//! [`AppError::NotInitialized`].

use std::sync::Arc;

use parking_lot::RwLock;

use cuaca_core::{AppError, TranslationConfig};
use cuaca_weather::{
    fetch_weather, resolve_location, ApiKeySource, GeoResult, GeocodeCache, Geocoder,
    WeatherProvider, WeatherSnapshot,
};

use crate::error_mapping::IntoAppError;
use crate::translations::TranslationTables;

#[derive(Default)]
pub struct SessionContext {
    api_key: RwLock<Option<String>>,
    translations: RwLock<Option<Arc<TranslationTables>>>,
    geocode_cache: GeocodeCache,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("initialized", &self.is_initialized())
            .field("cached_locations", &self.geocode_cache.len())
            .finish()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the API key, then the translation tables.
    ///
    /// On failure the session stays uninitialized.
    pub async fn initialize(
        &self,
        key_source: &dyn ApiKeySource,
        translations: &TranslationConfig,
    ) -> Result<(), AppError> {
        let key = key_source
            .fetch_key()
            .await
            .map_err(IntoAppError::into_app_error)?;
        let tables = TranslationTables::load(translations)?;

        self.install(key, tables);
        Ok(())
    }

    /// Install an already-loaded key and tables
    pub fn install(&self, api_key: String, tables: TranslationTables) {
        *self.api_key.write() = Some(api_key);
        *self.translations.write() = Some(Arc::new(tables));
        tracing::info!("Session initialized");
    }

    pub fn is_initialized(&self) -> bool {
        self.api_key.read().is_some() && self.translations.read().is_some()
    }

    pub fn api_key(&self) -> Result<String, AppError> {
        self.api_key
            .read()
            .clone()
            .ok_or_else(|| AppError::NotInitialized("API key not loaded".into()))
    }

    pub fn translations(&self) -> Result<Arc<TranslationTables>, AppError> {
        self.translations
            .read()
            .clone()
            .ok_or_else(|| AppError::NotInitialized("translation tables not loaded".into()))
    }

    pub fn geocode_cache(&self) -> &GeocodeCache {
        &self.geocode_cache
    }

    /// Resolve a cleaned city name within `province`, memoized for the session.
    ///
    /// When the province table has an entry for `province`, the translated
    /// name is used in the query.
    pub async fn resolve_location(
        &self,
        geocoder: &dyn Geocoder,
        city: &str,
        province: &str,
    ) -> Result<GeoResult, AppError> {
        let tables = self.translations()?;
        let province_term = tables.province(province).unwrap_or(province);

        resolve_location(geocoder, &self.geocode_cache, city, province_term)
            .await
            .map_err(IntoAppError::into_app_error)
    }

    pub async fn fetch_weather(
        &self,
        provider: &dyn WeatherProvider,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherSnapshot, AppError> {
        let api_key = self.api_key()?;
        fetch_weather(provider, &api_key, latitude, longitude)
            .await
            .map_err(IntoAppError::into_app_error)
    }
}
