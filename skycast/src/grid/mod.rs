//! Quadrant selection and tile neighbourhoods.
//!
//! Given a projected [`TilePoint`](crate::coord::TilePoint), picks the
//! neighbouring tiles needed to place the point inside a composited 2×2
//! (or 3×3) canvas, each tagged with its grid cell.

mod quadrant;
mod tileset;

pub use quadrant::{Quadrant, QUADRANT_THRESHOLD};
pub use tileset::{GridError, GridLayout, GridPosition, PlacedTile, TileSet};
