//! Weather data providers.
//!
//! Each client turns a location into a text report (and sometimes an image)
//! from one upstream service. All of them talk HTTP through
//! [`AsyncHttpClient`](crate::provider::AsyncHttpClient).

mod climacell;
mod gfs;
mod nws;
mod openweathermap;
mod wunderground;

use thiserror::Error;

use crate::compose::ComposeError;
use crate::composite::CompositeError;
use crate::geocode::GeocodeError;
use crate::provider::ProviderError;

pub use climacell::{
    weather_title, ClimaCellClient, ConditionsReport, Observation, CLIMACELL_API_URL,
};
pub use gfs::{model_cycle, GfsClient, Region, FRAME_COUNT, FRAME_DELAY_MS, GFS_BASE_URL};
pub use nws::{fahrenheit, inches_hg, NwsAlert, NwsClient, NwsReport, NWS_API_URL};
pub use openweathermap::{OwmClient, PRECIPITATION_OPACITY, OWM_API_URL};
pub use wunderground::{
    ConditionsSummary, Forecast, ForecastPeriod, Report, WundergroundClient, WUNDERGROUND_API_URL,
};

/// Errors fetching or rendering weather data.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    #[error(transparent)]
    Composite(#[from] CompositeError),

    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error("no weather stations found near {0}")]
    NoStations(String),

    #[error("no station near {0} has a current observation")]
    NoObservation(String),

    #[error("no data returned for {0}")]
    Empty(String),

    #[error("unknown region '{0}'; try one of: {known}", known = Region::NAMES.join(", "))]
    UnknownRegion(String),

    #[error("failed to encode animation: {0}")]
    Encode(String),
}
