//! Quadrant selection within a single tile.

use std::fmt;

use crate::coord::TILE_SIZE;

/// Pixel offset splitting a tile into halves along each axis.
pub const QUADRANT_THRESHOLD: f64 = (TILE_SIZE / 2) as f64;

/// Quarter of a tile that contains the point of interest.
///
/// The split is half-open on both axes: an offset of exactly 128 belongs to
/// the right (x) or bottom (y) half, so every finite offset maps to exactly
/// one quadrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Quadrant {
    /// All quadrants in grid order.
    pub const ALL: [Quadrant; 4] = [
        Quadrant::TopLeft,
        Quadrant::TopRight,
        Quadrant::BottomLeft,
        Quadrant::BottomRight,
    ];

    /// Classifies a pixel offset in `[0, 256)`.
    pub fn of(offset_x: f64, offset_y: f64) -> Self {
        let right = offset_x >= QUADRANT_THRESHOLD;
        let bottom = offset_y >= QUADRANT_THRESHOLD;
        match (right, bottom) {
            (false, false) => Quadrant::TopLeft,
            (true, false) => Quadrant::TopRight,
            (false, true) => Quadrant::BottomLeft,
            (true, true) => Quadrant::BottomRight,
        }
    }

    /// Grid cell of a 2×2 layout where the tile containing the point goes.
    ///
    /// The anchor sits diagonally opposite its quadrant so that the three
    /// neighbours are added on the side the point leans towards, leaving the
    /// point inside the central 256×256 window of the canvas.
    pub fn anchor_cell(&self) -> (u32, u32) {
        match self {
            Quadrant::TopLeft => (1, 1),
            Quadrant::TopRight => (0, 1),
            Quadrant::BottomLeft => (1, 0),
            Quadrant::BottomRight => (0, 0),
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quadrant::TopLeft => "top-left",
            Quadrant::TopRight => "top-right",
            Quadrant::BottomLeft => "bottom-left",
            Quadrant::BottomRight => "bottom-right",
        };
        f.write_str(name)
    }
}
