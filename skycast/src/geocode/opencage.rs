//! OpenCage forward geocoding.

use serde::Deserialize;
use tracing::debug;

use crate::coord::Coordinates;
use crate::provider::{AsyncHttpClient, ProviderError};

use super::{GeocodeError, Geocoder, LocationQuery, Place};

/// OpenCage geocoding endpoint.
pub const OPENCAGE_URL: &str = "https://api.opencagedata.com/geocode/v1/json";

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    components: Components,
    geometry: Geometry,
}

#[derive(Debug, Default, Deserialize)]
struct Components {
    #[serde(default)]
    city: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    country_code: String,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    lat: f64,
    lng: f64,
}

impl Components {
    /// Short human name for the place.
    fn display_name(&self) -> String {
        let code = self.country_code.to_ascii_uppercase();
        match (self.city.is_empty(), self.state.is_empty()) {
            (false, false) => format!("{}, {}", self.city, self.state),
            (false, true) if code.is_empty() || code == "US" => self.city.clone(),
            (false, true) => format!("{}, {}", self.city, code),
            (true, true) => self.country.clone(),
            (true, false) if self.country.is_empty() => self.state.clone(),
            (true, false) => format!("{}, {}", self.state, code),
        }
    }
}

/// Geocoder backed by the OpenCage API.
pub struct OpenCageGeocoder<C: AsyncHttpClient> {
    http_client: C,
    api_key: String,
    base_url: String,
}

impl<C: AsyncHttpClient> OpenCageGeocoder<C> {
    pub fn new(http_client: C, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            base_url: OPENCAGE_URL.to_string(),
        }
    }

    /// Points the geocoder at another server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_url(&self, query: &str) -> Result<String, GeocodeError> {
        let params = [("key", self.api_key.as_str()), ("q", query)];
        reqwest::Url::parse_with_params(&self.base_url, &params)
            .map(String::from)
            .map_err(|e| GeocodeError::Provider(ProviderError::HttpError(e.to_string())))
    }
}

impl<C: AsyncHttpClient> Geocoder for OpenCageGeocoder<C> {
    async fn geocode(&self, query: &LocationQuery) -> Result<Place, GeocodeError> {
        let text = query.to_string();
        let url = self.build_url(&text)?;
        debug!(query = %text, "Geocoding");

        let body = self.http_client.get(&url).await?;
        let response: GeocodeResponse = serde_json::from_slice(&body).map_err(ProviderError::from)?;

        let first = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NotFound(text.clone()))?;

        Ok(Place {
            coordinates: Coordinates::new(first.geometry.lat, first.geometry.lng),
            name: first.components.display_name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockAsyncHttpClient;

    const AUSTIN: &str = r#"{
        "results": [{
            "components": {
                "city": "Austin",
                "state": "Texas",
                "country": "United States of America",
                "country_code": "us",
                "_type": "city"
            },
            "confidence": 5,
            "geometry": {"lat": 30.2711286, "lng": -97.7436995}
        }],
        "status": {"code": 200, "message": "OK"}
    }"#;

    fn components(city: &str, state: &str, country: &str, code: &str) -> Components {
        Components {
            city: city.into(),
            state: state.into(),
            country: country.into(),
            country_code: code.into(),
        }
    }

    #[test]
    fn test_display_name_rules() {
        assert_eq!(components("Austin", "Texas", "USA", "us").display_name(), "Austin, Texas");
        assert_eq!(components("Austin", "", "USA", "us").display_name(), "Austin");
        assert_eq!(components("Austin", "", "", "").display_name(), "Austin");
        assert_eq!(components("Paris", "", "France", "fr").display_name(), "Paris, FR");
        assert_eq!(components("", "", "France", "fr").display_name(), "France");
        assert_eq!(components("", "Bavaria", "", "").display_name(), "Bavaria");
        assert_eq!(components("", "Bavaria", "Germany", "de").display_name(), "Bavaria, DE");
    }

    #[tokio::test]
    async fn test_geocode_first_result() {
        let client = MockAsyncHttpClient::new(Ok(AUSTIN.as_bytes().to_vec()));
        let geocoder = OpenCageGeocoder::new(client.clone(), "k");

        let place = geocoder
            .geocode(&LocationQuery::parse("austin").unwrap())
            .await
            .unwrap();

        assert_eq!(place.name, "Austin, Texas");
        assert!((place.coordinates.latitude - 30.2711286).abs() < 1e-9);
        assert_eq!(
            client.requested(),
            vec!["https://api.opencagedata.com/geocode/v1/json?key=k&q=austin"]
        );
    }

    #[tokio::test]
    async fn test_query_is_url_encoded() {
        let client = MockAsyncHttpClient::new(Ok(AUSTIN.as_bytes().to_vec()));
        let geocoder = OpenCageGeocoder::new(client.clone(), "k");

        geocoder
            .geocode(&LocationQuery::parse("San Antonio, TX").unwrap())
            .await
            .unwrap();

        assert!(client.requested()[0].ends_with("q=San+Antonio%2C+TX"));
    }

    #[tokio::test]
    async fn test_no_results_is_not_found() {
        let client = MockAsyncHttpClient::new(Ok(br#"{"results": []}"#.to_vec()));
        let geocoder = OpenCageGeocoder::new(client, "k");

        let result = geocoder
            .geocode(&LocationQuery::parse("nowhere").unwrap())
            .await;
        assert!(matches!(result, Err(GeocodeError::NotFound(q)) if q == "nowhere"));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let client = MockAsyncHttpClient::new(Ok(b"not json".to_vec()));
        let geocoder = OpenCageGeocoder::new(client, "k");

        let result = geocoder
            .geocode(&LocationQuery::parse("austin").unwrap())
            .await;
        assert!(matches!(
            result,
            Err(GeocodeError::Provider(ProviderError::Decode(_)))
        ));
    }
}
