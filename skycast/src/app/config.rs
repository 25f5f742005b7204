//! Application configuration for SkycastApp.
//!
//! `AppConfig` is the resolved form of the config file: addresses parsed,
//! templates applied to the tile servers, and credentials merged from the
//! environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::compose::Opacity;
use crate::composite::CompositeBuilder;
use crate::config::{
    ConfigError, ConfigFile, Credentials, ENV_CLIMACELL_KEY, ENV_OPENWEATHERMAP_KEY,
};
use crate::coord::MAX_ZOOM;
use crate::fetch::{FetchConfig, TileFetcher};
use crate::geocode::ZipTable;
use crate::provider::{AsyncHttpClient, TileLayer, TileServers};
use crate::server::{ServiceSettings, WeatherService};

/// Shallowest zoom that still fits a 3×3 mosaic.
pub const MIN_ZOOM: u8 = 2;

/// Application configuration combining all component configs.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind: SocketAddr,
    /// Base URL of image links in replies.
    pub public_url: String,
    pub credentials: Credentials,
    pub zoom: u8,
    pub opacity: Opacity,
    pub fetch: FetchConfig,
    pub servers: TileServers,
    pub zip_csv: PathBuf,
    /// Generated images kept in memory for serving.
    pub image_capacity: usize,
}

impl AppConfig {
    /// Create application config from the configuration file.
    ///
    /// Credentials from the process environment take precedence over the file.
    pub fn from_config_file(config: &ConfigFile) -> Result<Self, ConfigError> {
        Self::from_config_with_env(config, |var| std::env::var(var).ok())
    }

    /// Like [`from_config_file`](Self::from_config_file), reading credential
    /// overrides through `lookup` instead of the process environment.
    pub fn from_config_with_env<F>(config: &ConfigFile, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = config
            .server
            .bind
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("server.bind", &config.server.bind, e.to_string()))?;

        let mut credentials = config.keys.clone();
        credentials.overlay_env(lookup);

        let tiles = &config.tiles;
        let servers = TileServers::new(&credentials)
            .with_osm(tiles.osm_url.clone())
            .with_climacell(tiles.climacell_url.clone())
            .with_openweathermap(tiles.openweathermap_url.clone())
            .with_satellite(tiles.satellite_url.clone());

        Ok(Self {
            bind,
            public_url: config.server.public_url.clone(),
            credentials,
            zoom: tiles.zoom,
            opacity: tiles.opacity,
            fetch: FetchConfig::default()
                .with_timeout(tiles.timeout())
                .with_max_attempts(tiles.max_attempts),
            servers,
            zip_csv: config.data.zip_csv.clone(),
            image_capacity: config.server.image_capacity,
        })
    }

    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    pub fn with_public_url(mut self, public_url: impl Into<String>) -> Self {
        self.public_url = public_url.into();
        self
    }

    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn with_opacity(mut self, opacity: Opacity) -> Self {
        self.opacity = opacity;
        self
    }

    /// Checks settings that cannot be verified field by field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&self.zoom) {
            return Err(ConfigError::invalid(
                "tiles.zoom",
                &self.zoom.to_string(),
                format!("must be between {} and {}", MIN_ZOOM, MAX_ZOOM),
            ));
        }
        if !(self.public_url.starts_with("http://") || self.public_url.starts_with("https://")) {
            return Err(ConfigError::invalid(
                "server.public_url",
                &self.public_url,
                "must be an http(s) URL",
            ));
        }
        Ok(())
    }

    /// Fails if any of `layers` needs a key that is not configured.
    pub fn validate_layers(&self, layers: &[TileLayer]) -> Result<(), ConfigError> {
        for layer in layers {
            match layer {
                TileLayer::ClimaCell(_) if self.credentials.climacell.is_none() => {
                    return Err(ConfigError::MissingKey {
                        key: "keys.climacell",
                        env: ENV_CLIMACELL_KEY,
                    });
                }
                TileLayer::OpenWeatherMap(_) | TileLayer::Satellite
                    if self.credentials.openweathermap.is_none() =>
                {
                    return Err(ConfigError::MissingKey {
                        key: "keys.openweathermap",
                        env: ENV_OPENWEATHERMAP_KEY,
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Composite builder over `http_client` with the configured servers.
    pub fn composite_builder<C: AsyncHttpClient>(&self, http_client: C) -> CompositeBuilder<C> {
        let fetcher =
            TileFetcher::new(http_client, self.servers.clone()).with_config(self.fetch.clone());
        CompositeBuilder::new(fetcher)
    }

    /// The command service with every client this configuration enables.
    pub fn weather_service<C: AsyncHttpClient + Clone>(
        &self,
        http_client: C,
        zips: Arc<ZipTable>,
    ) -> WeatherService<C> {
        let composites = Arc::new(self.composite_builder(http_client.clone()));
        let settings = ServiceSettings {
            public_url: self.public_url.clone(),
            zoom: self.zoom,
            opacity: self.opacity,
            image_capacity: self.image_capacity,
        };
        WeatherService::new(http_client, &self.credentials, settings, zips, composites)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_IMAGE_CAPACITY;
    use crate::provider::OwmLayer;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn config() -> AppConfig {
        AppConfig::from_config_with_env(&ConfigFile::default(), no_env).unwrap()
    }

    #[test]
    fn test_defaults() {
        let app = config();
        assert_eq!(app.bind, "0.0.0.0:8111".parse().unwrap());
        assert_eq!(app.zoom, 7);
        assert_eq!(app.fetch.max_attempts, 1);
        assert_eq!(app.image_capacity, DEFAULT_IMAGE_CAPACITY);
        assert_eq!(app.credentials, Credentials::default());
        assert!(app.validate().is_ok());
    }

    #[test]
    fn test_env_credentials_override_file() {
        let mut file = ConfigFile::default();
        file.keys.climacell = Some("from-file".into());
        file.keys.opencage = Some("geo-file".into());
        let env: HashMap<&str, &str> = [("WEATHER_KEY", "from-env")].into_iter().collect();

        let app =
            AppConfig::from_config_with_env(&file, |var| env.get(var).map(|v| v.to_string()))
                .unwrap();

        assert_eq!(app.credentials.climacell.as_deref(), Some("from-env"));
        assert_eq!(app.credentials.opencage.as_deref(), Some("geo-file"));
        assert_eq!(app.credentials.openweathermap, None);
    }

    #[test]
    fn test_bad_bind() {
        let mut file = ConfigFile::default();
        file.server.bind = "nowhere".into();
        let err = AppConfig::from_config_with_env(&file, no_env).unwrap_err();
        assert!(err.to_string().contains("server.bind"));
    }

    #[test]
    fn test_zoom_range() {
        assert!(config().with_zoom(1).validate().is_err());
        assert!(config().with_zoom(2).validate().is_ok());
        assert!(config().with_zoom(20).validate().is_err());
    }

    #[test]
    fn test_public_url_scheme() {
        let err = config().with_public_url("ftp://x/").validate().unwrap_err();
        assert!(err.to_string().contains("server.public_url"));
    }

    #[test]
    fn test_missing_layer_key_names_env_var() {
        let mut app = config();
        app.credentials = Credentials::default();

        assert!(app.validate_layers(&[TileLayer::OpenStreetMap]).is_ok());
        let err = app
            .validate_layers(&[
                TileLayer::OpenStreetMap,
                TileLayer::climacell("temp").unwrap(),
            ])
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingKey {
                key: "keys.climacell",
                env: "WEATHER_KEY"
            }
        ));

        let err = app
            .validate_layers(&[TileLayer::OpenWeatherMap(OwmLayer::Clouds)])
            .unwrap_err();
        assert!(err.to_string().contains("OWM_API_KEY"));
    }
}
