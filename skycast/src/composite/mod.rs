//! Location to finished overlay image.
//!
//! [`CompositeBuilder`] ties the pipeline together: project the coordinates,
//! pick the tile neighbourhood, fetch every layer concurrently, assemble each
//! layer on its own canvas, then blend the layers bottom to top.

use std::time::Instant;

use futures::future::try_join_all;
use image::RgbaImage;
use thiserror::Error;
use tracing::{debug, info};

use crate::compose::{blend, encode_png, ComposeError, Compositor, Opacity};
use crate::coord::{locate, CoordError, Coordinates};
use crate::fetch::TileFetcher;
use crate::grid::{GridError, GridLayout, TileSet};
use crate::provider::{AsyncHttpClient, ProviderError, TileLayer};

/// Errors building a composite image.
#[derive(Debug, Error)]
pub enum CompositeError {
    #[error("invalid location: {0}")]
    Coord(#[from] CoordError),

    #[error("cannot build tile grid: {0}")]
    Grid(#[from] GridError),

    #[error("tile fetch failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("compositing failed: {0}")]
    Compose(#[from] ComposeError),

    #[error("no layers requested")]
    NoLayers,
}

/// One canvas per requested layer, in request order.
#[derive(Debug, Clone)]
pub struct LayerCanvases {
    pub tiles: TileSet,
    pub canvases: Vec<RgbaImage>,
}

/// Builds composited map images around a location.
pub struct CompositeBuilder<C: AsyncHttpClient> {
    fetcher: TileFetcher<C>,
    compositor: Compositor,
}

impl<C: AsyncHttpClient> CompositeBuilder<C> {
    pub fn new(fetcher: TileFetcher<C>) -> Self {
        Self {
            fetcher,
            compositor: Compositor,
        }
    }

    pub fn fetcher(&self) -> &TileFetcher<C> {
        &self.fetcher
    }

    /// Builds the 2×2 overlay around `coordinates` and returns PNG bytes.
    ///
    /// `layers[0]` is the base; each following layer is blended over the
    /// result at `opacity`. Any failed tile aborts the whole image.
    pub async fn build(
        &self,
        coordinates: &Coordinates,
        zoom: u8,
        layers: &[TileLayer],
        opacity: Opacity,
    ) -> Result<Vec<u8>, CompositeError> {
        let image = self
            .render(coordinates, zoom, layers, opacity, GridLayout::TwoByTwo)
            .await?;
        Ok(encode_png(&image)?)
    }

    /// Builds the 3×3 mosaic centred on `coordinates` and returns PNG bytes.
    pub async fn build_mosaic(
        &self,
        coordinates: &Coordinates,
        zoom: u8,
        layers: &[TileLayer],
        opacity: Opacity,
    ) -> Result<Vec<u8>, CompositeError> {
        let image = self
            .render(coordinates, zoom, layers, opacity, GridLayout::ThreeByThree)
            .await?;
        Ok(encode_png(&image)?)
    }

    /// Renders and blends all layers, returning the canvas unencoded.
    pub async fn render(
        &self,
        coordinates: &Coordinates,
        zoom: u8,
        layers: &[TileLayer],
        opacity: Opacity,
        layout: GridLayout,
    ) -> Result<RgbaImage, CompositeError> {
        let start = Instant::now();
        let LayerCanvases { tiles, canvases } =
            self.render_layers(coordinates, zoom, layers, layout).await?;

        let mut canvases = canvases.into_iter();
        let mut result = canvases.next().ok_or(CompositeError::NoLayers)?;
        for layer in canvases {
            blend(&mut result, &layer, opacity)?;
        }

        info!(
            location = %coordinates,
            zoom,
            quadrant = %tiles.quadrant(),
            layers = layers.len(),
            tiles = tiles.len() * layers.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Composite built"
        );
        Ok(result)
    }

    /// Fetches and assembles each layer on its own canvas without blending.
    ///
    /// All layers are fetched at once; the first failing tile fails the call.
    pub async fn render_layers(
        &self,
        coordinates: &Coordinates,
        zoom: u8,
        layers: &[TileLayer],
        layout: GridLayout,
    ) -> Result<LayerCanvases, CompositeError> {
        if layers.is_empty() {
            return Err(CompositeError::NoLayers);
        }

        let point = locate(coordinates, zoom)?;
        let tiles = TileSet::around(&point, layout)?;
        debug!(
            location = %coordinates,
            tile = %point.tile,
            offset_x = point.offset_x,
            offset_y = point.offset_y,
            quadrant = %tiles.quadrant(),
            "Located point"
        );

        let grid = &tiles;
        let canvases = try_join_all(layers.iter().map(|layer| async move {
            let images = self.fetcher.fetch(grid, layer).await?;
            let canvas = self.compositor.assemble(&images, layout)?;
            Ok::<_, CompositeError>(canvas)
        }))
        .await?;

        Ok(LayerCanvases { tiles, canvases })
    }
}
