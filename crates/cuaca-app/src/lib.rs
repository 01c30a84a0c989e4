//! Application layer: session state, the location/weather controller and the
//! render model the presentation layer draws from.

pub mod connectivity;
pub mod controller;
pub mod error_mapping;
pub mod session;
pub mod setup;
pub mod ticker;
pub mod translations;
pub mod view;

pub use connectivity::{Connectivity, FixedConnectivity, TcpProbe};
pub use controller::{
    Adapters, ControllerState, LocationWeatherController, WeatherOutcome, WeatherTicket,
};
pub use error_mapping::{apply_connectivity, IntoAppError};
pub use session::SessionContext;
pub use setup::{adapters_from_config, key_source_from_config};
pub use ticker::ClockTicker;
pub use translations::TranslationTables;
pub use view::{
    render_error, render_weather_card, ErrorView, ForecastItemView, MapMarker, MapView, Panel,
    PlaceholderView, WeatherCardView,
};
