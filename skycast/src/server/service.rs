//! Command execution.
//!
//! [`WeatherService`] owns one client per upstream service and turns each
//! [`Command`] into the text the chat integration shows. Clients whose key is
//! not configured are absent; their commands reply that they are unavailable.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::compose::Opacity;
use crate::composite::CompositeBuilder;
use crate::config::Credentials;
use crate::geocode::{GeocodeError, Geocoder, LocationQuery, OpenCageGeocoder, Place, ZipTable};
use crate::provider::AsyncHttpClient;
use crate::weather::{
    ClimaCellClient, GfsClient, NwsClient, OwmClient, Region, WeatherError, WundergroundClient,
};

use super::command::{Command, HELP_TEXT};
use super::store::{ImageKind, ImageStore};

/// Errors replied to the caller as text.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Weather(#[from] WeatherError),

    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    #[error("`{command}` is unavailable: no {key} API key is configured")]
    Unavailable {
        command: &'static str,
        key: &'static str,
    },
}

/// Reply settings shared by all commands.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Base URL that image links are built on.
    pub public_url: String,
    pub zoom: u8,
    pub opacity: Opacity,
    /// Generated images kept for serving; the oldest is dropped past this.
    pub image_capacity: usize,
}

/// What a handled command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    /// A stored image; `id` can be requested back.
    Image { id: String, text: Option<String> },
}

/// Upstream clients plus the image store.
pub struct WeatherService<C: AsyncHttpClient> {
    settings: ServiceSettings,
    images: ImageStore,
    zips: Arc<ZipTable>,
    composites: Arc<CompositeBuilder<C>>,
    nws: NwsClient<C>,
    gfs: GfsClient<C>,
    climacell: Option<ClimaCellClient<C>>,
    opencage: Option<OpenCageGeocoder<C>>,
    owm: Option<OwmClient<C>>,
    wunderground: Option<WundergroundClient<C>>,
}

impl<C: AsyncHttpClient + Clone> WeatherService<C> {
    pub fn new(
        http_client: C,
        credentials: &Credentials,
        settings: ServiceSettings,
        zips: Arc<ZipTable>,
        composites: Arc<CompositeBuilder<C>>,
    ) -> Self {
        let client = || http_client.clone();
        Self {
            nws: NwsClient::new(client(), Arc::clone(&zips)),
            gfs: GfsClient::new(client()),
            climacell: credentials
                .climacell
                .as_ref()
                .map(|key| ClimaCellClient::new(client(), key.clone())),
            opencage: credentials
                .opencage
                .as_ref()
                .map(|key| OpenCageGeocoder::new(client(), key.clone())),
            owm: credentials
                .openweathermap
                .as_ref()
                .map(|key| OwmClient::new(client(), key.clone(), Arc::clone(&composites))),
            wunderground: credentials
                .wunderground
                .as_ref()
                .map(|key| WundergroundClient::new(client(), key.clone())),
            images: ImageStore::with_capacity(settings.image_capacity),
            settings,
            zips,
            composites,
        }
    }
}

impl<C: AsyncHttpClient> WeatherService<C> {
    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Link for a stored image.
    pub fn image_link(&self, id: &str) -> String {
        format!("{}?zip={}", self.settings.public_url, id)
    }

    /// Runs a command and renders the reply, errors included, as text.
    pub async fn respond(&self, command: Command) -> String {
        match self.execute(command).await {
            Ok(Reply::Text(text)) => text,
            Ok(Reply::Image { id, text }) => {
                let link = self.image_link(&id);
                match text {
                    Some(text) => format!("{}\n{}", text, link),
                    None => link,
                }
            }
            Err(e) => {
                warn!(error = %e, "Command failed");
                e.to_string()
            }
        }
    }

    /// Runs a command. [`Command::Image`] is served directly by the router.
    pub async fn execute(&self, command: Command) -> Result<Reply, ServerError> {
        info!(command = ?command, "Handling command");
        match command {
            Command::Help | Command::Image(_) => Ok(Reply::Text(HELP_TEXT.to_string())),
            Command::Nws(query) => self.nws(&query).await,
            Command::Weather(query) => self.weather(&query).await,
            Command::Forecast(query) => self.forecast(&query).await,
            Command::Conditions(query) => self.conditions(&query).await,
            Command::Precip(query) => self.precipitation(&query).await,
            Command::Satellite(query) => self.satellite(&query).await,
            Command::Map(region) => self.map(&region).await,
        }
    }

    async fn nws(&self, query: &str) -> Result<Reply, ServerError> {
        let LocationQuery::Zip(zip) = LocationQuery::parse(query)? else {
            return Err(GeocodeError::ZipRequired(query.to_string()).into());
        };
        let report = self.nws.report(&zip).await?;
        Ok(Reply::Text(report.to_string()))
    }

    fn wunderground(&self, command: &'static str) -> Result<&WundergroundClient<C>, ServerError> {
        self.wunderground.as_ref().ok_or(ServerError::Unavailable {
            command,
            key: "Weather Underground",
        })
    }

    async fn weather(&self, query: &str) -> Result<Reply, ServerError> {
        let client = self.wunderground("weather")?;
        let report = client.report(&LocationQuery::parse(query)?).await?;
        Ok(Reply::Text(report.to_string()))
    }

    async fn forecast(&self, query: &str) -> Result<Reply, ServerError> {
        let client = self.wunderground("forecast")?;
        let forecast = client.forecast(&LocationQuery::parse(query)?).await?;
        Ok(Reply::Text(forecast.to_string().trim_end().to_string()))
    }

    /// OpenCage when configured, otherwise the local ZIP table.
    async fn locate(&self, query: &LocationQuery) -> Result<Place, ServerError> {
        match &self.opencage {
            Some(geocoder) => Ok(geocoder.geocode(query).await?),
            None if query.is_zip() => Ok(self.zips.geocode(query).await?),
            None => Err(ServerError::Unavailable {
                command: "conditions",
                key: "OpenCage",
            }),
        }
    }

    async fn conditions(&self, query: &str) -> Result<Reply, ServerError> {
        let climacell = self.climacell.as_ref().ok_or(ServerError::Unavailable {
            command: "conditions",
            key: "ClimaCell",
        })?;
        let place = self.locate(&LocationQuery::parse(query)?).await?;

        let layers = ClimaCellClient::<C>::overlay_layers();
        let (report, png) = tokio::try_join!(
            climacell.conditions(&place.name, &place.coordinates),
            async {
                Ok::<_, WeatherError>(
                    self.composites
                        .build(
                            &place.coordinates,
                            self.settings.zoom,
                            &layers,
                            self.settings.opacity,
                        )
                        .await?,
                )
            }
        )?;

        let id = self
            .images
            .insert(&format!("conditions {}", place.name), ImageKind::Png, png);
        Ok(Reply::Image {
            id,
            text: Some(report.to_string()),
        })
    }

    fn owm(&self, command: &'static str) -> Result<&OwmClient<C>, ServerError> {
        self.owm.as_ref().ok_or(ServerError::Unavailable {
            command,
            key: "OpenWeatherMap",
        })
    }

    async fn satellite(&self, query: &str) -> Result<Reply, ServerError> {
        let owm = self.owm("satellite")?;
        let place = owm.geocode(&LocationQuery::parse(query)?).await?;
        let png = owm.satellite(&place.coordinates, self.settings.zoom).await?;
        let id = self
            .images
            .insert(&format!("satellite {}", query), ImageKind::Png, png);
        Ok(Reply::Image { id, text: None })
    }

    async fn precipitation(&self, query: &str) -> Result<Reply, ServerError> {
        let owm = self.owm("precip")?;
        let place = owm.geocode(&LocationQuery::parse(query)?).await?;
        let png = owm
            .precipitation(&place.coordinates, self.settings.zoom)
            .await?;
        let id = self
            .images
            .insert(&format!("composite {}", query), ImageKind::Png, png);
        Ok(Reply::Image { id, text: None })
    }

    async fn map(&self, region: &str) -> Result<Reply, ServerError> {
        let region: Region = region.parse()?;
        let gif = self.gfs.animation(region, Utc::now()).await?;
        let id = self
            .images
            .insert(&format!("map {}", region), ImageKind::Gif, gif);
        Ok(Reply::Image { id, text: None })
    }
}
