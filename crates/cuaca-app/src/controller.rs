//! Province → regency → weather selection flow.
//!
//! The controller owns the selection state and drives the adapters. Nothing
//! is held across an `.await` except shared handles; state changes happen
//! under a short lock.
//!
//! Weather requests are tagged with a sequence number. A response whose number
//! is no longer the latest (the user picked another regency or province while
//! it was in flight) is dropped.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;

use cuaca_core::{AppError, MapConfig};
use cuaca_services::{Bookmark, BookmarkStore, Province, Regency, RegionDirectory};
use cuaca_weather::{clean_location_name, title_case, GeoResult, Geocoder, WeatherProvider, WeatherSnapshot};

use crate::connectivity::Connectivity;
use crate::error_mapping::{apply_connectivity, IntoAppError};
use crate::session::SessionContext;
use crate::ticker::ClockTicker;
use crate::translations::TranslationTables;
use crate::view::{render_error, render_weather_card, ErrorView, Panel, PlaceholderView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControllerState {
    Idle,
    ProvinceChosen,
    RegencyListReady,
    WeatherLoading,
    WeatherReady,
    WeatherError,
}

/// The collaborators the controller talks to
#[derive(Clone)]
pub struct Adapters {
    pub regions: Arc<dyn RegionDirectory>,
    pub geocoder: Arc<dyn Geocoder>,
    pub weather: Arc<dyn WeatherProvider>,
    pub bookmarks: Arc<dyn BookmarkStore>,
    pub connectivity: Arc<dyn Connectivity>,
}

/// A weather request issued by [`LocationWeatherController::select_regency`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherTicket {
    pub sequence: u64,
    pub province: Province,
    pub regency: Regency,
}

/// Whether a completed weather request was shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherOutcome {
    Applied,
    Stale,
}

#[derive(Debug, Clone)]
struct ReadyWeather {
    province: Province,
    regency: Regency,
    location: GeoResult,
    snapshot: WeatherSnapshot,
}

#[derive(Debug)]
struct Inner {
    state: ControllerState,
    provinces: Vec<Province>,
    province: Option<Province>,
    regencies: Vec<Regency>,
    regency: Option<Regency>,
    sequence: u64,
    ready: Option<ReadyWeather>,
    error: Option<ErrorView>,
    bookmarked: bool,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            state: ControllerState::Idle,
            provinces: Vec::new(),
            province: None,
            regencies: Vec::new(),
            regency: None,
            sequence: 0,
            ready: None,
            error: None,
            bookmarked: false,
        }
    }
}

impl Inner {
    /// Drop weather state and invalidate any in-flight request
    fn clear_weather(&mut self) {
        self.sequence += 1;
        self.ready = None;
        self.error = None;
        self.bookmarked = false;
    }
}

pub struct LocationWeatherController {
    session: Arc<SessionContext>,
    adapters: Adapters,
    map: MapConfig,
    inner: Mutex<Inner>,
    clock: ClockTicker,
}

impl LocationWeatherController {
    pub fn new(session: Arc<SessionContext>, adapters: Adapters, map: MapConfig) -> Self {
        Self {
            session,
            adapters,
            map,
            inner: Mutex::new(Inner::default()),
            clock: ClockTicker::new(),
        }
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn state(&self) -> ControllerState {
        self.inner.lock().state
    }

    pub fn provinces(&self) -> Vec<Province> {
        self.inner.lock().provinces.clone()
    }

    pub fn regencies(&self) -> Vec<Regency> {
        self.inner.lock().regencies.clone()
    }

    pub fn selected_province(&self) -> Option<Province> {
        self.inner.lock().province.clone()
    }

    pub fn selected_regency(&self) -> Option<Regency> {
        self.inner.lock().regency.clone()
    }

    /// Receiver for the local clock of the displayed card
    pub fn clock(&self) -> Option<watch::Receiver<String>> {
        self.clock.subscribe()
    }

    pub fn clock_running(&self) -> bool {
        self.clock.is_running()
    }

    /// Apply the offline override using the connectivity signal right now
    pub async fn present_error(&self, error: AppError) -> AppError {
        if !error.is_network_failure() {
            return error;
        }
        let online = self.adapters.connectivity.is_online().await;
        apply_connectivity(error, online)
    }

    // =========== Regions ===========

    pub async fn load_provinces(&self) -> Result<Vec<Province>, AppError> {
        let provinces = match self.adapters.regions.list_provinces().await {
            Ok(provinces) => provinces,
            Err(e) => return Err(self.present_error(e.into_app_error()).await),
        };

        self.inner.lock().provinces = provinces.clone();
        Ok(provinces)
    }

    /// Choose a province and load its regencies.
    ///
    /// Resets the regency list, any weather state and the clock first, so the
    /// reset holds even when the regency request fails.
    pub async fn select_province(&self, province_id: &str) -> Result<Vec<Regency>, AppError> {
        let province = {
            let mut inner = self.inner.lock();
            let province = inner
                .provinces
                .iter()
                .find(|p| p.id == province_id)
                .cloned()
                .ok_or_else(|| {
                    AppError::InvalidSelection(format!("unknown province {}", province_id))
                })?;

            inner.state = ControllerState::ProvinceChosen;
            inner.province = Some(province.clone());
            inner.regencies.clear();
            inner.regency = None;
            inner.clear_weather();
            province
        };
        self.clock.stop();
        tracing::info!("Province selected: {}", province.display_name);

        let regencies = match self.adapters.regions.list_regencies(&province.id).await {
            Ok(regencies) => regencies,
            Err(e) => return Err(self.present_error(e.into_app_error()).await),
        };

        let mut inner = self.inner.lock();
        if inner.province.as_ref().map(|p| p.id.as_str()) != Some(province.id.as_str()) {
            tracing::debug!("Discarding regencies for superseded province {}", province.id);
            return Ok(regencies);
        }
        inner.regencies = regencies.clone();
        inner.state = ControllerState::RegencyListReady;
        Ok(regencies)
    }

    // =========== Weather ===========

    /// Choose a regency and issue a weather request for it.
    ///
    /// Fails with `InvalidSelection` when no province is chosen or the id is
    /// not in the loaded regency list.
    pub fn select_regency(&self, regency_id: &str) -> Result<WeatherTicket, AppError> {
        let ticket = {
            let mut inner = self.inner.lock();
            let province = inner
                .province
                .clone()
                .ok_or_else(|| AppError::InvalidSelection("no province selected".into()))?;
            let regency = inner
                .regencies
                .iter()
                .find(|r| r.id == regency_id)
                .cloned()
                .ok_or_else(|| {
                    AppError::InvalidSelection(format!("unknown regency {}", regency_id))
                })?;

            inner.clear_weather();
            inner.state = ControllerState::WeatherLoading;
            inner.regency = Some(regency.clone());

            WeatherTicket {
                sequence: inner.sequence,
                province,
                regency,
            }
        };
        self.clock.stop();

        tracing::info!(
            "Regency selected: {} (request {})",
            ticket.regency.display_name,
            ticket.sequence
        );
        Ok(ticket)
    }

    /// Resolve and fetch weather for a ticket. Does not touch controller state.
    pub async fn fetch_for(
        &self,
        ticket: &WeatherTicket,
    ) -> Result<(GeoResult, WeatherSnapshot), AppError> {
        let city = clean_location_name(&ticket.regency.display_name);
        let location = self
            .session
            .resolve_location(self.adapters.geocoder.as_ref(), &city, &ticket.province.display_name)
            .await?;
        let snapshot = self
            .session
            .fetch_weather(self.adapters.weather.as_ref(), location.latitude, location.longitude)
            .await?;
        Ok((location, snapshot))
    }

    /// Apply a finished request if it is still the latest one.
    pub async fn complete(
        &self,
        ticket: WeatherTicket,
        result: Result<(GeoResult, WeatherSnapshot), AppError>,
    ) -> Result<WeatherOutcome, AppError> {
        let result = match result {
            Ok(ok) => Ok(ok),
            Err(e) => {
                // The probe can take the full timeout, skip it for superseded requests.
                if self.is_stale(&ticket) {
                    return Ok(WeatherOutcome::Stale);
                }
                let online = !e.is_network_failure() || self.adapters.connectivity.is_online().await;
                Err((render_error(&e, online), apply_connectivity(e, online)))
            }
        };

        let mut inner = self.inner.lock();
        if inner.sequence != ticket.sequence {
            tracing::debug!(
                "Discarding stale weather response {} (latest {})",
                ticket.sequence,
                inner.sequence
            );
            return Ok(WeatherOutcome::Stale);
        }

        match result {
            Ok((location, snapshot)) => {
                let clock = (
                    snapshot.current.observed_at_unix,
                    snapshot.current.timezone_offset_seconds,
                );
                inner.ready = Some(ReadyWeather {
                    province: ticket.province,
                    regency: ticket.regency,
                    location,
                    snapshot,
                });
                inner.state = ControllerState::WeatherReady;
                drop(inner);

                self.clock.start(clock.0, clock.1);
                Ok(WeatherOutcome::Applied)
            }
            Err((view, error)) => {
                tracing::warn!("Weather request {} failed: {}", ticket.sequence, error);
                inner.error = Some(view);
                inner.state = ControllerState::WeatherError;
                Err(error)
            }
        }
    }

    fn is_stale(&self, ticket: &WeatherTicket) -> bool {
        let latest = self.inner.lock().sequence;
        if latest != ticket.sequence {
            tracing::debug!(
                "Discarding stale weather response {} (latest {})",
                ticket.sequence,
                latest
            );
            return true;
        }
        false
    }

    /// [`select_regency`](Self::select_regency), fetch, then
    /// [`complete`](Self::complete).
    pub async fn load_weather(&self, regency_id: &str) -> Result<WeatherOutcome, AppError> {
        let ticket = self.select_regency(regency_id)?;
        let result = self.fetch_for(&ticket).await;
        self.complete(ticket, result).await
    }

    /// What the result panel shows right now
    pub fn panel(&self) -> Panel {
        let inner = self.inner.lock();
        match inner.state {
            ControllerState::Idle
            | ControllerState::ProvinceChosen
            | ControllerState::RegencyListReady => Panel::Placeholder(PlaceholderView::default()),
            ControllerState::WeatherLoading => Panel::Loading,
            ControllerState::WeatherError => match &inner.error {
                Some(view) => Panel::Error(view.clone()),
                None => Panel::Placeholder(PlaceholderView::default()),
            },
            ControllerState::WeatherReady => match &inner.ready {
                Some(ready) => {
                    let tables = self.session.translations().unwrap_or_else(|_| {
                        Arc::new(TranslationTables::default())
                    });
                    let api_key = self.session.api_key().unwrap_or_default();
                    Panel::Card(Box::new(render_weather_card(
                        &ready.regency.display_name,
                        &ready.province.display_name,
                        &ready.location,
                        &ready.snapshot,
                        &tables,
                        &self.map,
                        &api_key,
                        inner.bookmarked,
                        Utc::now().timestamp(),
                    )))
                }
                None => Panel::Placeholder(PlaceholderView::default()),
            },
        }
    }

    // =========== Bookmarks ===========

    pub async fn add_bookmark(&self, city: &str, province: &str) -> Result<Bookmark, AppError> {
        match self.adapters.bookmarks.add_bookmark(city, province).await {
            Ok(bookmark) => Ok(bookmark),
            Err(e) => Err(self.present_error(e.into_app_error()).await),
        }
    }

    pub async fn get_bookmarks(&self) -> Result<Vec<Bookmark>, AppError> {
        match self.adapters.bookmarks.get_bookmarks().await {
            Ok(bookmarks) => Ok(bookmarks),
            Err(e) => Err(self.present_error(e.into_app_error()).await),
        }
    }

    pub async fn delete_bookmark(&self, id: &str) -> Result<(), AppError> {
        match self.adapters.bookmarks.delete_bookmark(id).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.present_error(e.into_app_error()).await),
        }
    }

    /// Normalized `(city, province)` of the displayed card
    pub fn current_bookmark_target(&self) -> Result<(String, String), AppError> {
        let inner = self.inner.lock();
        let ready = inner
            .ready
            .as_ref()
            .filter(|_| inner.state == ControllerState::WeatherReady)
            .ok_or_else(|| AppError::InvalidSelection("no weather card shown".into()))?;

        Ok((
            title_case(&clean_location_name(&ready.regency.display_name)),
            title_case(ready.province.display_name.trim()),
        ))
    }

    pub async fn bookmark_current(&self) -> Result<Bookmark, AppError> {
        let (city, province) = self.current_bookmark_target()?;
        let bookmark = self.add_bookmark(&city, &province).await?;
        self.set_bookmarked(&city, true);
        Ok(bookmark)
    }

    /// Whether the displayed city is in the bookmark list
    pub async fn is_bookmarked(&self) -> Result<bool, AppError> {
        let (city, province) = self.current_bookmark_target()?;
        let found = find_bookmark(&self.get_bookmarks().await?, &city, &province).is_some();
        self.set_bookmarked(&city, found);
        Ok(found)
    }

    /// Remove the displayed city's bookmark if present, add it otherwise.
    /// Returns the new bookmarked state.
    pub async fn toggle_bookmark(&self) -> Result<bool, AppError> {
        let (city, province) = self.current_bookmark_target()?;
        let bookmarks = self.get_bookmarks().await?;

        let bookmarked = match find_bookmark(&bookmarks, &city, &province) {
            Some(existing) => {
                self.delete_bookmark(&existing.id).await?;
                false
            }
            None => {
                self.add_bookmark(&city, &province).await?;
                true
            }
        };
        self.set_bookmarked(&city, bookmarked);
        Ok(bookmarked)
    }

    /// Record the flag only if the same city is still displayed
    fn set_bookmarked(&self, city: &str, bookmarked: bool) {
        let mut inner = self.inner.lock();
        let still_shown = inner
            .ready
            .as_ref()
            .is_some_and(|r| title_case(&clean_location_name(&r.regency.display_name)) == city);
        if still_shown {
            inner.bookmarked = bookmarked;
        }
    }
}

fn find_bookmark<'a>(bookmarks: &'a [Bookmark], city: &str, province: &str) -> Option<&'a Bookmark> {
    bookmarks.iter().find(|b| {
        b.city.eq_ignore_ascii_case(city) && b.province.eq_ignore_ascii_case(province)
    })
}
