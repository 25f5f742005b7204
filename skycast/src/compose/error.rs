//! Error types for compositing operations.

use std::fmt;

/// Errors that can occur while building or encoding a canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeError {
    /// A tile is not 256×256.
    TileSize {
        col: u32,
        row: u32,
        width: u32,
        height: u32,
    },
    /// A tile is tagged with a cell outside the grid.
    OutOfGrid { col: u32, row: u32, side: u32 },
    /// Two layers to be blended differ in size.
    SizeMismatch {
        base: (u32, u32),
        layer: (u32, u32),
    },
    /// Opacity outside `0.0..=1.0`.
    InvalidOpacity(String),
    /// Encoding the finished canvas failed.
    EncodingFailed(String),
}

impl fmt::Display for ComposeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComposeError::TileSize {
                col,
                row,
                width,
                height,
            } => write!(
                f,
                "Tile at ({}, {}) is {}×{}, expected 256×256",
                col, row, width, height
            ),
            ComposeError::OutOfGrid { col, row, side } => {
                write!(f, "Tile at ({}, {}) is outside the {}×{} grid", col, row, side, side)
            }
            ComposeError::SizeMismatch { base, layer } => write!(
                f,
                "Cannot blend {}×{} layer onto {}×{} base",
                layer.0, layer.1, base.0, base.1
            ),
            ComposeError::InvalidOpacity(value) => {
                write!(f, "Invalid opacity {}: must be between 0.0 and 1.0", value)
            }
            ComposeError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
        }
    }
}

impl std::error::Error for ComposeError {}

impl From<image::ImageError> for ComposeError {
    fn from(err: image::ImageError) -> Self {
        ComposeError::EncodingFailed(err.to_string())
    }
}
