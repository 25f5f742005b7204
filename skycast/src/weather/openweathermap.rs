//! OpenWeatherMap satellite and precipitation mosaics.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::compose::{blend, encode_png, tint, Opacity, PRECIPITATION_GREEN};
use crate::composite::{CompositeBuilder, LayerCanvases};
use crate::coord::Coordinates;
use crate::geocode::{GeocodeError, Geocoder, LocationQuery, Place};
use crate::grid::GridLayout;
use crate::provider::{AsyncHttpClient, OwmLayer, ProviderError, TileLayer};

use super::WeatherError;

/// OpenWeatherMap API root.
pub const OWM_API_URL: &str = "https://api.openweathermap.org";

/// Strength of the green precipitation overlay on the satellite mosaic.
pub const PRECIPITATION_OPACITY: f32 = 0.9;

#[derive(Deserialize, Debug)]
struct ApiWeather {
    coord: ApiCoord,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize, Debug)]
struct ApiCoord {
    lat: f64,
    lon: f64,
}

/// ZIP lookups and 3×3 imagery from OpenWeatherMap.
pub struct OwmClient<C: AsyncHttpClient> {
    http_client: C,
    api_key: String,
    base_url: String,
    composites: Arc<CompositeBuilder<C>>,
}

impl<C: AsyncHttpClient> OwmClient<C> {
    pub fn new(
        http_client: C,
        api_key: impl Into<String>,
        composites: Arc<CompositeBuilder<C>>,
    ) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            base_url: OWM_API_URL.to_string(),
            composites,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Cloudless satellite mosaic centred on `coordinates`, as PNG.
    pub async fn satellite(
        &self,
        coordinates: &Coordinates,
        zoom: u8,
    ) -> Result<Vec<u8>, WeatherError> {
        Ok(self
            .composites
            .build_mosaic(coordinates, zoom, &[TileLayer::Satellite], Opacity::OPAQUE)
            .await?)
    }

    /// Satellite mosaic with precipitation drawn over it in green, as PNG.
    pub async fn precipitation(
        &self,
        coordinates: &Coordinates,
        zoom: u8,
    ) -> Result<Vec<u8>, WeatherError> {
        let layers = [
            TileLayer::Satellite,
            TileLayer::OpenWeatherMap(OwmLayer::Precipitation),
        ];
        let LayerCanvases { canvases, .. } = self
            .composites
            .render_layers(coordinates, zoom, &layers, GridLayout::ThreeByThree)
            .await?;

        let mut canvases = canvases.into_iter();
        let (Some(mut base), Some(rain)) = (canvases.next(), canvases.next()) else {
            return Err(WeatherError::Empty(format!("precipitation mosaic at {}", coordinates)));
        };
        let opacity = Opacity::new(PRECIPITATION_OPACITY)?;
        blend(&mut base, &tint(&rain, PRECIPITATION_GREEN), opacity)?;
        Ok(encode_png(&base)?)
    }
}

impl<C: AsyncHttpClient> Geocoder for OwmClient<C> {
    async fn geocode(&self, query: &LocationQuery) -> Result<Place, GeocodeError> {
        let LocationQuery::Zip(zip) = query else {
            return Err(GeocodeError::ZipRequired(query.to_string()));
        };

        let url = format!(
            "{}/data/2.5/weather?zip={},us&appid={}",
            self.base_url, zip, self.api_key
        );
        debug!(zip = %zip, "Looking up ZIP with OpenWeatherMap");

        let body = self.http_client.get(&url).await?;
        let weather: ApiWeather = serde_json::from_slice(&body).map_err(ProviderError::from)?;
        let name = if weather.name.is_empty() {
            zip.clone()
        } else {
            weather.name
        };
        Ok(Place {
            coordinates: Coordinates::new(weather.coord.lat, weather.coord.lon),
            name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use crate::fetch::TileFetcher;
    use crate::provider::{MockAsyncHttpClient, TileServers};
    use image::{ImageFormat, Rgba, RgbaImage};

    const WEATHER: &str = r#"{"coord":{"lon":-97.74,"lat":30.27},"name":"Austin","cod":200}"#;

    fn png_tile(colour: [u8; 4]) -> Vec<u8> {
        encode_png(&RgbaImage::from_pixel(256, 256, Rgba(colour))).unwrap()
    }

    fn owm(client: MockAsyncHttpClient) -> OwmClient<MockAsyncHttpClient> {
        let servers = TileServers::new(&Credentials {
            openweathermap: Some("owm-key".into()),
            ..Default::default()
        });
        let composites = Arc::new(CompositeBuilder::new(TileFetcher::new(client.clone(), servers)));
        OwmClient::new(client, "owm-key", composites)
    }

    #[tokio::test]
    async fn test_zip_lookup() {
        let client = MockAsyncHttpClient::new(Ok(WEATHER.as_bytes().to_vec()));
        let place = owm(client.clone())
            .geocode(&LocationQuery::Zip("78701".into()))
            .await
            .unwrap();

        assert_eq!(place.coordinates, Coordinates::new(30.27, -97.74));
        assert_eq!(place.name, "Austin");
        assert_eq!(
            client.requested()[0],
            "https://api.openweathermap.org/data/2.5/weather?zip=78701,us&appid=owm-key"
        );
    }

    #[tokio::test]
    async fn test_only_zip_codes() {
        let client = MockAsyncHttpClient::new(Ok(WEATHER.as_bytes().to_vec()));
        let query = LocationQuery::parse("Austin, TX").unwrap();
        let result = owm(client.clone()).geocode(&query).await;
        assert!(matches!(result, Err(GeocodeError::ZipRequired(_))));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_satellite_mosaic() {
        let client = MockAsyncHttpClient::new(Ok(png_tile([40, 50, 60, 255])));
        let png = owm(client.clone())
            .satellite(&Coordinates::new(30.27, -97.74), 7)
            .await
            .unwrap();

        let image = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
        assert_eq!((image.width(), image.height()), (768, 768));
        assert_eq!(client.call_count(), 9);
        assert!(client.requested().iter().all(|url| url.contains("sat.owm.io")));
    }

    #[tokio::test]
    async fn test_precipitation_is_green() {
        let client = MockAsyncHttpClient::new(Ok(png_tile([0, 0, 0, 255])))
            .route("precipitation_new", Ok(png_tile([120, 120, 255, 255])));
        let png = owm(client.clone())
            .precipitation(&Coordinates::new(30.27, -97.74), 7)
            .await
            .unwrap();

        let image = image::load_from_memory_with_format(&png, ImageFormat::Png)
            .unwrap()
            .to_rgba8();
        assert_eq!(image.dimensions(), (768, 768));
        assert_eq!(client.call_count(), 18);

        let rained = image.get_pixel(0, 0);
        assert_eq!(rained[0], 0);
        assert!(rained[1] > 200);
        assert_eq!(rained[2], 0);
    }
}
