//! Grid assembly and PNG output.

use std::io::Cursor;

use image::{imageops, ImageFormat, RgbaImage};

use crate::coord::TILE_SIZE;
use crate::grid::{GridLayout, GridPosition};

use super::error::ComposeError;

/// A decoded tile tagged with the grid cell it belongs in.
#[derive(Debug, Clone)]
pub struct TileImage {
    pub position: GridPosition,
    pub image: RgbaImage,
}

impl TileImage {
    pub fn new(position: GridPosition, image: RgbaImage) -> Self {
        Self { position, image }
    }
}

/// Pastes tiles onto a transparent canvas.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compositor;

impl Compositor {
    /// Assembles `tiles` into one canvas sized for `layout`.
    ///
    /// Each tile is pasted at `position × 256` with no scaling. Cells with no
    /// tile stay transparent.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::TileSize`] for a tile that is not 256×256 and
    /// [`ComposeError::OutOfGrid`] for a position outside the layout.
    pub fn assemble(
        &self,
        tiles: &[TileImage],
        layout: GridLayout,
    ) -> Result<RgbaImage, ComposeError> {
        let side = layout.side();
        let mut canvas = RgbaImage::new(layout.canvas_size(), layout.canvas_size());

        for tile in tiles {
            let GridPosition { col, row } = tile.position;
            if col >= side || row >= side {
                return Err(ComposeError::OutOfGrid { col, row, side });
            }
            let (width, height) = tile.image.dimensions();
            if width != TILE_SIZE || height != TILE_SIZE {
                return Err(ComposeError::TileSize {
                    col,
                    row,
                    width,
                    height,
                });
            }
            let (x, y) = tile.position.pixel_origin();
            imageops::replace(&mut canvas, &tile.image, i64::from(x), i64::from(y));
        }

        Ok(canvas)
    }
}

/// Encodes a canvas as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ComposeError> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}
