//! Weather Underground conditions and forecasts.

use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::geocode::{GeocodeError, LocationQuery};
use crate::provider::{AsyncHttpClient, ProviderError};

use super::WeatherError;

/// Weather Underground API root; the key is appended as a path segment.
pub const WUNDERGROUND_API_URL: &str = "https://api.wunderground.com/api";

const MISSING_PRECIPITATION: &str = "-999.00";

/// Accepts strings, numbers or null, since the API mixes them freely.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ObservationLocation {
    pub full: String,
    pub city: String,
    pub state: String,
}

/// The `current_observation` block.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ConditionsSummary {
    pub observation_location: ObservationLocation,
    pub station_id: String,
    pub observation_time: String,
    pub weather: String,
    pub temperature_string: String,
    pub feelslike_string: String,
    pub relative_humidity: String,
    pub wind_string: String,
    #[serde(deserialize_with = "lenient_string")]
    pub wind_mph: String,
    pub dewpoint_string: String,
    #[serde(deserialize_with = "lenient_string")]
    pub precip_1hr_in: String,
    #[serde(deserialize_with = "lenient_string")]
    pub precip_today_in: String,
}

impl ConditionsSummary {
    /// Precipitation in the last hour, with the API's missing marker as zero.
    pub fn precipitation_last_hour(&self) -> &str {
        match self.precip_1hr_in.as_str() {
            MISSING_PRECIPITATION | "" => "0",
            value => value,
        }
    }
}

impl fmt::Display for ConditionsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "From {}", self.observation_location.full)?;
        writeln!(f, "{} it was {}", self.observation_time, self.weather)?;
        writeln!(
            f,
            "Temperature was {}; felt like {}",
            self.temperature_string, self.feelslike_string
        )?;
        writeln!(
            f,
            "with relative humidity {}, Wind {}, and {}\" of precipitation in the last hour.",
            self.relative_humidity,
            self.wind_string,
            self.precipitation_last_hour()
        )?;
        writeln!(f, "Dewpoint {}", self.dewpoint_string)
    }
}

/// One half-day of the text forecast.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ForecastPeriod {
    pub period: i32,
    pub title: String,
    pub fcttext: String,
    #[serde(deserialize_with = "lenient_string")]
    pub pop: String,
}

impl fmt::Display for ForecastPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "*{}*: {}", self.title, self.fcttext)
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct ApiConditions {
    current_observation: Option<ConditionsSummary>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct ApiForecast {
    forecast: ApiForecastBody,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct ApiForecastBody {
    txt_forecast: ApiTextForecast,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct ApiTextForecast {
    date: String,
    forecastday: Vec<ForecastPeriod>,
}

/// Multi-day text forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub issued: String,
    pub periods: Vec<ForecastPeriod>,
}

impl Forecast {
    pub fn today(&self) -> Option<&ForecastPeriod> {
        self.periods.first()
    }
}

impl fmt::Display for Forecast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for period in &self.periods {
            writeln!(f, "{}", period)?;
        }
        Ok(())
    }
}

/// Current conditions plus today's outlook.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub conditions: ConditionsSummary,
    pub forecast: Forecast,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.conditions)?;
        if let Some(today) = self.forecast.today() {
            writeln!(f, "{}", today.fcttext)?;
            write!(f, "{}% chance of precipitation", today.pop)?;
        }
        Ok(())
    }
}

/// Client for the Weather Underground JSON API.
pub struct WundergroundClient<C: AsyncHttpClient> {
    http_client: C,
    api_key: String,
    base_url: String,
}

impl<C: AsyncHttpClient> WundergroundClient<C> {
    pub fn new(http_client: C, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            base_url: WUNDERGROUND_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The `q/...` location segment, without extension.
    fn location_path(query: &LocationQuery) -> Result<String, GeocodeError> {
        match query {
            LocationQuery::Zip(zip) => Ok(format!("q/{}", zip)),
            LocationQuery::CityState { city, state } => {
                Ok(format!("q/{}/{}", state, city.replace(' ', "_")))
            }
            LocationQuery::Place(place) => Err(GeocodeError::InvalidQuery(place.clone())),
        }
    }

    fn url(&self, feature: &str, query: &LocationQuery) -> Result<String, GeocodeError> {
        Ok(format!(
            "{}/{}/{}/{}.json",
            self.base_url,
            self.api_key,
            feature,
            Self::location_path(query)?
        ))
    }

    pub async fn conditions(
        &self,
        query: &LocationQuery,
    ) -> Result<ConditionsSummary, WeatherError> {
        let url = self.url("conditions", query)?;
        debug!(query = %query, "Fetching Wunderground conditions");

        let body = self.http_client.get(&url).await?;
        let response: ApiConditions = serde_json::from_slice(&body).map_err(ProviderError::from)?;
        response
            .current_observation
            .ok_or_else(|| WeatherError::Empty(format!("Wunderground conditions for {}", query)))
    }

    pub async fn forecast(&self, query: &LocationQuery) -> Result<Forecast, WeatherError> {
        let url = self.url("features/forecast", query)?;
        debug!(query = %query, "Fetching Wunderground forecast");

        let body = self.http_client.get(&url).await?;
        let response: ApiForecast = serde_json::from_slice(&body).map_err(ProviderError::from)?;
        let text = response.forecast.txt_forecast;
        if text.forecastday.is_empty() {
            return Err(WeatherError::Empty(format!("Wunderground forecast for {}", query)));
        }
        Ok(Forecast {
            issued: text.date,
            periods: text.forecastday,
        })
    }

    /// Conditions and forecast, fetched together.
    pub async fn report(&self, query: &LocationQuery) -> Result<Report, WeatherError> {
        let (conditions, forecast) =
            tokio::try_join!(self.conditions(query), self.forecast(query))?;
        Ok(Report {
            conditions,
            forecast,
        })
    }
}
