//! Concurrent tile fetching
//!
//! [`TileFetcher`] downloads every tile of a [`TileSet`] for one layer at the
//! same time and decodes the bodies as PNG. The join is all-or-nothing: the
//! first failure is returned and the requests still in flight are dropped.

use std::time::Duration;

use futures::future::try_join_all;
use image::ImageFormat;
use tracing::{debug, warn};

use crate::compose::TileImage;
use crate::grid::{PlacedTile, TileSet};
use crate::provider::{AsyncHttpClient, ProviderError, TileLayer, TileServers};

/// Default per-request timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Default attempts per tile (no retry).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;

/// Configuration for tile fetching.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Deadline for each individual tile request.
    pub timeout: Duration,
    /// Attempts per tile. Only transient failures are retried.
    pub max_attempts: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl FetchConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }
}

/// Fetches and decodes tile images.
pub struct TileFetcher<C: AsyncHttpClient> {
    http_client: C,
    servers: TileServers,
    config: FetchConfig,
}

impl<C: AsyncHttpClient> TileFetcher<C> {
    pub fn new(http_client: C, servers: TileServers) -> Self {
        Self {
            http_client,
            servers,
            config: FetchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: FetchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn servers(&self) -> &TileServers {
        &self.servers
    }

    /// Fetches every tile of `tiles` for `layer`.
    ///
    /// Images come back in the tile set's row-major order, each tagged with
    /// its grid position. URLs are all built before any request is sent, so a
    /// missing API key fails without touching the network.
    pub async fn fetch(
        &self,
        tiles: &TileSet,
        layer: &TileLayer,
    ) -> Result<Vec<TileImage>, ProviderError> {
        let requests = tiles
            .tiles()
            .iter()
            .map(|placed| Ok((*placed, self.servers.url(layer, &placed.tile)?)))
            .collect::<Result<Vec<(PlacedTile, String)>, ProviderError>>()?;

        try_join_all(
            requests
                .into_iter()
                .map(|(placed, url)| self.fetch_tile(placed, url, layer)),
        )
        .await
    }

    async fn fetch_tile(
        &self,
        placed: PlacedTile,
        url: String,
        layer: &TileLayer,
    ) -> Result<TileImage, ProviderError> {
        debug!(
            layer = layer.name(),
            tile = %placed.tile,
            col = placed.position.col,
            row = placed.position.row,
            url = %url,
            "Fetching tile"
        );

        let body = self.get_with_retry(&url).await.inspect_err(|e| {
            warn!(layer = layer.name(), tile = %placed.tile, error = %e, "Tile fetch failed");
        })?;

        let image = decode_png(&body).inspect_err(|e| {
            warn!(layer = layer.name(), tile = %placed.tile, error = %e, "Tile decode failed");
        })?;

        Ok(TileImage::new(placed.position, image))
    }

    async fn get_with_retry(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let mut attempt = 1;
        loop {
            match self.get_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < self.config.max_attempts => {
                    debug!(url, attempt, error = %e, "Retrying tile request");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_once(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        match tokio::time::timeout(self.config.timeout, self.http_client.get(url)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                url: url.to_string(),
                after: self.config.timeout,
            }),
        }
    }
}

/// Decodes a response body as PNG, whatever the server claimed it was.
pub fn decode_png(body: &[u8]) -> Result<image::RgbaImage, ProviderError> {
    image::load_from_memory_with_format(body, ImageFormat::Png)
        .map(|image| image.to_rgba8())
        .map_err(|e| ProviderError::Decode(e.to_string()))
}
