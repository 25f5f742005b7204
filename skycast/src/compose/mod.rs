//! Tile compositing
//!
//! Assembles fetched tiles into a single canvas, blends weather layers over a
//! base map and encodes the result as PNG.

mod blend;
mod canvas;
mod error;

pub use blend::{blend, tint, Opacity, PRECIPITATION_GREEN};
pub use canvas::{encode_png, Compositor, TileImage};
pub use error::ComposeError;
