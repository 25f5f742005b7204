//! US National Weather Service observations and alerts.
//!
//! A ZIP code is resolved to coordinates through the local [`ZipTable`], then
//! to the list of nearby observation stations. Stations are tried in order
//! until one has a current observation.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::coord::Coordinates;
use crate::geocode::{GeocodeError, ZipTable};
use crate::provider::{AsyncHttpClient, ProviderError};

use super::WeatherError;

/// NWS API root.
pub const NWS_API_URL: &str = "https://api.weather.gov";

const PASCALS_PER_INCH_HG: f64 = 3386.38866;

/// Converts Celsius to Fahrenheit.
pub fn fahrenheit(celsius: f64) -> f64 {
    celsius * 1.8 + 32.0
}

/// Converts pascals to inches of mercury.
pub fn inches_hg(pascals: f64) -> f64 {
    pascals / PASCALS_PER_INCH_HG
}

#[derive(Deserialize, Debug)]
struct ApiStationList {
    #[serde(default)]
    features: Vec<ApiStationFeature>,
}

#[derive(Deserialize, Debug)]
struct ApiStationFeature {
    properties: ApiStationListProperties,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ApiStationListProperties {
    station_identifier: String,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize, Debug)]
struct ApiStation {
    properties: ApiStationProperties,
}

#[derive(Deserialize, Debug)]
struct ApiStationProperties {
    #[serde(default)]
    county: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
struct ApiValue {
    value: Option<f64>,
    #[serde(default)]
    unit_code: String,
}

impl ApiValue {
    /// Unit code without the `wmoUnit:` namespace.
    fn code(&self) -> &str {
        self.unit_code
            .rsplit_once(':')
            .map_or(self.unit_code.as_str(), |(_, unit)| unit)
    }

    /// Temperature in °F. Values without a unit code are Celsius, the API's
    /// default; unrecognised units yield `None`.
    fn in_fahrenheit(&self) -> Option<f64> {
        let value = self.value?;
        match self.code() {
            "degC" | "" => Some(fahrenheit(value)),
            "degF" => Some(value),
            "K" => Some(fahrenheit(value - 273.15)),
            _ => None,
        }
    }

    /// Pressure in inHg. Values without a unit code are pascals.
    fn in_inches_hg(&self) -> Option<f64> {
        let value = self.value?;
        match self.code() {
            "Pa" | "" => Some(inches_hg(value)),
            "hPa" => Some(inches_hg(value * 100.0)),
            "inHg" | "[in_i'Hg]" => Some(value),
            _ => None,
        }
    }

    fn unit(&self) -> &str {
        match self.code() {
            "km_h-1" => "km/h",
            "m_s-1" => "m/s",
            "percent" => "%",
            "degC" => "°C",
            other => other,
        }
    }
}

#[derive(Deserialize, Debug)]
struct ApiObservation {
    properties: ApiObservationProperties,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ApiObservationProperties {
    timestamp: Option<String>,
    #[serde(default)]
    text_description: String,
    #[serde(default)]
    temperature: ApiValue,
    #[serde(default)]
    heat_index: ApiValue,
    #[serde(default)]
    barometric_pressure: ApiValue,
    #[serde(default)]
    wind_speed: ApiValue,
    #[serde(default)]
    wind_gust: ApiValue,
    #[serde(default)]
    precipitation_last_hour: ApiValue,
    #[serde(default)]
    relative_humidity: ApiValue,
}

#[derive(Deserialize, Debug)]
struct ApiAlertList {
    #[serde(default)]
    features: Vec<ApiAlert>,
}

#[derive(Deserialize, Debug)]
struct ApiAlert {
    properties: NwsAlert,
}

/// An active weather alert.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct NwsAlert {
    pub headline: Option<String>,
    pub event: String,
    pub severity: String,
    pub certainty: String,
    pub urgency: String,
    pub description: String,
    pub instruction: Option<String>,
}

impl fmt::Display for NwsAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "**{}**", self.headline.as_deref().unwrap_or(&self.event))?;
        writeln!(f, "Severity: {}", self.severity)?;
        writeln!(f, "Certainty: {}", self.certainty)?;
        writeln!(f, "Urgency: {}", self.urgency)?;
        writeln!(f, "{}", self.description)?;
        writeln!(f, "{}", self.instruction.as_deref().unwrap_or_default())
    }
}

/// Current conditions at the nearest reporting station.
#[derive(Debug, Clone)]
pub struct NwsReport {
    pub name: String,
    pub station: String,
    pub timestamp: String,
    pub conditions: String,
    temperature: ApiValue,
    heat_index: ApiValue,
    relative_humidity: ApiValue,
    barometric_pressure: ApiValue,
    wind_speed: ApiValue,
    wind_gust: ApiValue,
    precipitation_last_hour: ApiValue,
    pub alerts: Vec<NwsAlert>,
}

fn or_na(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.*}", precision, v))
}

impl NwsReport {
    pub fn temperature_f(&self) -> Option<f64> {
        self.temperature.in_fahrenheit()
    }

    pub fn heat_index_f(&self) -> Option<f64> {
        self.heat_index.in_fahrenheit()
    }

    pub fn pressure_in_hg(&self) -> Option<f64> {
        self.barometric_pressure.in_inches_hg()
    }
}

impl fmt::Display for NwsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Current Weather For {}", self.name)?;
        writeln!(f, "Observatory: {}", self.station)?;
        writeln!(f, "Time of Observation: {}", self.timestamp)?;
        writeln!(f, "Conditions: {}", self.conditions)?;
        writeln!(f, "Temperature: {} F", or_na(self.temperature_f(), 1))?;
        writeln!(
            f,
            "Relative humidity: {}%",
            or_na(self.relative_humidity.value, 2)
        )?;
        writeln!(
            f,
            "Heat index: {} F",
            or_na(self.heat_index_f(), 1)
        )?;
        writeln!(
            f,
            "Barometric pressure: {} in Hg",
            or_na(self.pressure_in_hg(), 2)
        )?;
        writeln!(
            f,
            "Wind speed: {} {}",
            or_na(self.wind_speed.value, 1),
            self.wind_speed.unit()
        )?;
        writeln!(
            f,
            "Wind gust: {} {}",
            or_na(self.wind_gust.value, 1),
            self.wind_gust.unit()
        )?;
        writeln!(
            f,
            "Precipitation in the last hour: {} {}",
            or_na(self.precipitation_last_hour.value, 1),
            self.precipitation_last_hour.unit()
        )?;
        for alert in &self.alerts {
            write!(f, "{}", alert)?;
        }
        Ok(())
    }
}

/// Client for api.weather.gov.
pub struct NwsClient<C: AsyncHttpClient> {
    http_client: C,
    zips: Arc<ZipTable>,
    base_url: String,
}

impl<C: AsyncHttpClient> NwsClient<C> {
    pub fn new(http_client: C, zips: Arc<ZipTable>) -> Self {
        Self {
            http_client,
            zips,
            base_url: NWS_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Builds the current-conditions report for a ZIP code.
    pub async fn report(&self, zip: &str) -> Result<NwsReport, WeatherError> {
        let coordinates = self
            .zips
            .lookup(zip)
            .ok_or_else(|| GeocodeError::NotFound(zip.to_string()))?;

        let stations = self.stations(&coordinates).await?;
        if stations.is_empty() {
            return Err(WeatherError::NoStations(zip.to_string()));
        }

        for station in &stations {
            let id = &station.station_identifier;
            let observation = match self.current_observation(id).await {
                Ok(observation) => observation,
                Err(e) => {
                    warn!(station = %id, error = %e, "Observation fetch failed");
                    continue;
                }
            };
            let Some(timestamp) = observation.timestamp.clone().filter(|t| !t.is_empty()) else {
                debug!(station = %id, "Station has no current observation");
                continue;
            };

            let alerts = self.alerts(id).await.unwrap_or_else(|e| {
                warn!(station = %id, error = %e, "Alert fetch failed");
                Vec::new()
            });

            let p = observation;
            return Ok(NwsReport {
                name: zip.to_string(),
                station: station.name.clone(),
                timestamp,
                conditions: p.text_description,
                temperature: p.temperature,
                heat_index: p.heat_index,
                relative_humidity: p.relative_humidity,
                barometric_pressure: p.barometric_pressure,
                wind_speed: p.wind_speed,
                wind_gust: p.wind_gust,
                precipitation_last_hour: p.precipitation_last_hour,
                alerts,
            });
        }

        Err(WeatherError::NoObservation(zip.to_string()))
    }

    /// Station list near the point, retrying with coarser coordinates.
    ///
    /// The points endpoint redirects or rejects over-precise coordinates, so
    /// 2, 1 and then 0 decimal places are tried in turn.
    async fn stations(
        &self,
        coordinates: &Coordinates,
    ) -> Result<Vec<ApiStationListProperties>, WeatherError> {
        let mut last_error = None;
        for precision in [2usize, 1, 0] {
            let url = format!(
                "{}/points/{:.*},{:.*}/stations",
                self.base_url,
                precision,
                coordinates.latitude,
                precision,
                coordinates.longitude
            );
            match self.http_client.get(&url).await {
                Ok(body) => {
                    let list: ApiStationList =
                        serde_json::from_slice(&body).map_err(ProviderError::from)?;
                    return Ok(list.features.into_iter().map(|f| f.properties).collect());
                }
                Err(e) => {
                    debug!(url = %url, error = %e, "Station lookup failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error
            .map(WeatherError::from)
            .unwrap_or_else(|| WeatherError::NoStations(coordinates.to_string())))
    }

    async fn current_observation(
        &self,
        station: &str,
    ) -> Result<ApiObservationProperties, WeatherError> {
        let url = format!("{}/stations/{}/observations/current", self.base_url, station);
        let body = self.http_client.get(&url).await?;
        let observation: ApiObservation =
            serde_json::from_slice(&body).map_err(ProviderError::from)?;
        Ok(observation.properties)
    }

    /// Active alerts for the station's county zone.
    async fn alerts(&self, station: &str) -> Result<Vec<NwsAlert>, WeatherError> {
        let url = format!("{}/stations/{}", self.base_url, station);
        let body = self.http_client.get(&url).await?;
        let station: ApiStation = serde_json::from_slice(&body).map_err(ProviderError::from)?;

        let Some(zone) = station
            .properties
            .county
            .as_deref()
            .and_then(|county| county.rsplit('/').next())
            .filter(|zone| !zone.is_empty())
            .map(str::to_string)
        else {
            return Ok(Vec::new());
        };

        let url = format!("{}/alerts/active/zone/{}", self.base_url, zone);
        let body = self.http_client.get(&url).await?;
        let list: ApiAlertList = serde_json::from_slice(&body).map_err(ProviderError::from)?;
        Ok(list.features.into_iter().map(|a| a.properties).collect())
    }
}
