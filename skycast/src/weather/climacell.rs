//! ClimaCell nowcast conditions.

use std::fmt;

use serde::Deserialize;
use tracing::debug;

use crate::coord::Coordinates;
use crate::provider::{AsyncHttpClient, ProviderError, TileLayer};

use super::WeatherError;

/// ClimaCell v3 API root.
pub const CLIMACELL_API_URL: &str = "https://api.climacell.co/v3";

const NOWCAST_FIELDS: &[&str] = &[
    "baro_pressure",
    "cloud_base",
    "cloud_ceiling",
    "cloud_cover",
    "dewpoint",
    "feels_like",
    "humidity",
    "precipitation",
    "precipitation_type",
    "sunrise",
    "sunset",
    "surface_shortwave_radiation",
    "visibility",
    "weather_code",
    "wind_direction",
    "wind_gust",
    "temp",
];

/// Human title for a ClimaCell weather code; unknown codes pass through.
pub fn weather_title(code: &str) -> &str {
    match code {
        "freezing_rain_heavy" => "Heavy Freezing Rain",
        "freezing_rain" => "Freezing Rain",
        "freezing_rain_light" => "Light Freezing Rain",
        "freezing_drizzle" => "Freezing Drizzle",
        "ice_pellets_heavy" => "Heavy Ice Pellets",
        "ice_pellets" => "Ice Pellets",
        "ice_pellets_light" => "Light Ice Pellets",
        "snow_heavy" => "Heavy Snow",
        "snow" => "Snow",
        "snow_light" => "Light Snow",
        "flurries" => "Flurries",
        "tstorm" => "Thunderstorm",
        "rain_heavy" => "Downpour",
        "rain" => "Rain",
        "rain_light" => "Light Rain",
        "drizzle" => "Drizzle",
        "fog_light" => "Light Fog",
        "fog" => "Fog",
        "cloudy" => "Cloudy",
        "mostly_cloudy" => "Mostly Cloudy",
        "partly_cloudy" => "Partly Cloudy",
        "mostly_clear" => "Mostly Clear",
        "clear" => "Clear",
        other => other,
    }
}

/// A numeric reading with its unit.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Measure {
    pub value: Option<f64>,
    pub units: String,
}

impl Measure {
    fn show(&self) -> String {
        self.value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Code {
    pub value: String,
}

/// One nowcast time step.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Observation {
    pub lat: f64,
    pub lon: f64,
    pub temp: Measure,
    pub feels_like: Measure,
    pub dewpoint: Measure,
    pub wind_gust: Measure,
    pub wind_direction: Measure,
    pub baro_pressure: Measure,
    pub visibility: Measure,
    pub precipitation: Measure,
    pub precipitation_type: Code,
    pub cloud_cover: Measure,
    pub cloud_base: Measure,
    pub cloud_ceiling: Measure,
    pub humidity: Measure,
    pub weather_code: Code,
}

impl Observation {
    pub fn title(&self) -> &str {
        weather_title(&self.weather_code.value)
    }

    fn is_precipitating(&self) -> bool {
        self.precipitation.value.is_some_and(|v| v != 0.0)
    }
}

/// Markdown table of current conditions for a named place.
#[derive(Debug, Clone)]
pub struct ConditionsReport {
    pub place: String,
    pub observation: Observation,
}

impl fmt::Display for ConditionsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.observation;
        writeln!(
            f,
            "| Current Conditions | {} | Location  | {} |",
            o.title(),
            self.place
        )?;
        writeln!(f, "| :--- | ---: | :--- | ---: |")?;
        writeln!(f, "| Latitude | {} | Longitude | {} |", o.lat, o.lon)?;
        writeln!(
            f,
            "| Temperature | {} °{} | Feels Like | {} °{} |",
            o.temp.show(),
            o.temp.units,
            o.feels_like.show(),
            o.feels_like.units
        )?;
        if o.is_precipitating() {
            writeln!(
                f,
                "| Precipitation | {} {} | Type of Precipitation | {} |",
                o.precipitation.show(),
                o.precipitation.units,
                o.precipitation_type.value
            )?;
        }
        writeln!(
            f,
            "| Wind Gust | {} {} | Barometric Pressure | {} {} |",
            o.wind_gust.show(),
            o.wind_gust.units,
            o.baro_pressure.show(),
            o.baro_pressure.units
        )?;
        writeln!(
            f,
            "| Humidity | {}{} | Cloud Cover | {}{} |",
            o.humidity.show(),
            o.humidity.units,
            o.cloud_cover.show(),
            o.cloud_cover.units
        )
    }
}

/// Client for the ClimaCell nowcast endpoint.
pub struct ClimaCellClient<C: AsyncHttpClient> {
    http_client: C,
    api_key: String,
    base_url: String,
}

impl<C: AsyncHttpClient> ClimaCellClient<C> {
    pub fn new(http_client: C, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            base_url: CLIMACELL_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Layers of the conditions image: OSM base with precipitation on top.
    pub fn overlay_layers() -> Vec<TileLayer> {
        vec![
            TileLayer::OpenStreetMap,
            TileLayer::ClimaCell("precipitation".to_string()),
        ]
    }

    fn nowcast_url(&self, coordinates: &Coordinates) -> String {
        format!(
            "{}/weather/nowcast?apikey={}&start_time=now&timestep=5&unit_system=us&lat={:.4}&lon={:.4}&fields={}",
            self.base_url,
            self.api_key,
            coordinates.latitude,
            coordinates.longitude,
            NOWCAST_FIELDS.join("%2C")
        )
    }

    /// Current conditions (the first nowcast step) at `coordinates`.
    pub async fn current(&self, coordinates: &Coordinates) -> Result<Observation, WeatherError> {
        let url = self.nowcast_url(coordinates);
        debug!(location = %coordinates, "Fetching ClimaCell nowcast");

        let body = self.http_client.get(&url).await?;
        let steps: Vec<Observation> = serde_json::from_slice(&body).map_err(ProviderError::from)?;
        steps
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::Empty(format!("ClimaCell nowcast at {}", coordinates)))
    }

    /// Conditions report for a named place.
    pub async fn conditions(
        &self,
        place: &str,
        coordinates: &Coordinates,
    ) -> Result<ConditionsReport, WeatherError> {
        Ok(ConditionsReport {
            place: place.to_string(),
            observation: self.current(coordinates).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockAsyncHttpClient;

    const NOWCAST: &str = r#"[{
        "lat": 30.2711, "lon": -97.7437,
        "temp": {"value": 88.5, "units": "F"},
        "feels_like": {"value": 95, "units": "F"},
        "precipitation": {"value": 0, "units": "in/hr"},
        "precipitation_type": {"value": "none"},
        "wind_gust": {"value": 12.1, "units": "mph"},
        "baro_pressure": {"value": 29.9, "units": "inHg"},
        "humidity": {"value": 60, "units": "%"},
        "cloud_cover": {"value": 40, "units": "%"},
        "cloud_ceiling": {"value": null, "units": "ft"},
        "weather_code": {"value": "partly_cloudy"},
        "observation_time": {"value": "2024-05-01T15:50:00.000Z"}
    }, {
        "lat": 30.2711, "lon": -97.7437,
        "weather_code": {"value": "rain"}
    }]"#;

    #[test]
    fn test_weather_titles() {
        assert_eq!(weather_title("rain_heavy"), "Downpour");
        assert_eq!(weather_title("tstorm"), "Thunderstorm");
        assert_eq!(weather_title("volcanic_ash"), "volcanic_ash");
    }

    #[tokio::test]
    async fn test_current_uses_first_step() {
        let client = MockAsyncHttpClient::new(Ok(NOWCAST.as_bytes().to_vec()));
        let climacell = ClimaCellClient::new(client.clone(), "key");

        let observation = climacell
            .current(&Coordinates::new(30.2711, -97.7437))
            .await
            .unwrap();
        assert_eq!(observation.title(), "Partly Cloudy");
        assert_eq!(observation.cloud_ceiling.value, None);

        let url = &client.requested()[0];
        assert!(url.starts_with("https://api.climacell.co/v3/weather/nowcast?apikey=key&"));
        assert!(url.contains("unit_system=us"));
        assert!(url.contains("lat=30.2711&lon=-97.7437"));
        assert!(url.contains("fields=baro_pressure%2Ccloud_base"));
    }

    #[tokio::test]
    async fn test_empty_nowcast() {
        let client = MockAsyncHttpClient::new(Ok(b"[]".to_vec()));
        let climacell = ClimaCellClient::new(client, "key");
        let result = climacell.current(&Coordinates::new(0.0, 0.0)).await;
        assert!(matches!(result, Err(WeatherError::Empty(_))));
    }

    #[tokio::test]
    async fn test_report_table() {
        let client = MockAsyncHttpClient::new(Ok(NOWCAST.as_bytes().to_vec()));
        let climacell = ClimaCellClient::new(client, "key");
        let report = climacell
            .conditions("Austin, Texas", &Coordinates::new(30.2711, -97.7437))
            .await
            .unwrap()
            .to_string();

        assert!(report.starts_with(
            "| Current Conditions | Partly Cloudy | Location  | Austin, Texas |\n| :--- | ---: | :--- | ---: |\n"
        ));
        assert!(report.contains("| Temperature | 88.5 °F | Feels Like | 95 °F |"));
        assert!(!report.contains("Precipitation |"));
        assert!(report.contains("| Humidity | 60% | Cloud Cover | 40% |"));
    }

    #[test]
    fn test_precipitation_row_when_raining() {
        let report = ConditionsReport {
            place: "Austin".into(),
            observation: Observation {
                precipitation: Measure {
                    value: Some(0.2),
                    units: "in/hr".into(),
                },
                precipitation_type: Code {
                    value: "rain".into(),
                },
                ..Default::default()
            },
        };
        assert!(report
            .to_string()
            .contains("| Precipitation | 0.2 in/hr | Type of Precipitation | rain |"));
    }

    #[test]
    fn test_overlay_layers() {
        let layers = ClimaCellClient::<MockAsyncHttpClient>::overlay_layers();
        assert_eq!(layers[0], TileLayer::OpenStreetMap);
        assert_eq!(layers[1].to_string(), "climacell:precipitation");
    }
}
