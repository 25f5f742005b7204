//! Coordinate conversion module
//!
//! Projects geographic coordinates (latitude/longitude) onto the Web Mercator
//! slippy-map grid used by every tile server we composite from.
//!
//! [`project`] is the raw closed-form projection and performs no validation:
//! at the poles `tan`/`sec` are undefined and it yields non-finite values.
//! Callers must either validate first or go through [`locate`], which does.

mod types;

pub use types::{
    CoordError, Coordinates, TileCoord, TilePoint, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON,
    MIN_ZOOM, TILE_SIZE,
};

use std::f64::consts::PI;

/// Largest pixel offset that still lies inside a tile.
const MAX_OFFSET: f64 = TILE_SIZE as f64 - 1e-9;

/// Projects a point to fractional tile coordinates at `zoom`.
///
/// `x = (lon + 180) / 360 * 2^zoom`,
/// `y = (1 - ln(tan φ + sec φ) / π) / 2 * 2^zoom`.
///
/// The latitude must lie strictly inside (-90, 90); this is not checked.
#[inline]
pub fn project(lat: f64, lon: f64, zoom: u8) -> (f64, f64) {
    let n = 2.0_f64.powi(zoom as i32);
    let lat_rad = lat * PI / 180.0;

    let x = (lon + 180.0) / 360.0 * n;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n;

    (x, y)
}

/// Converts geographic coordinates to the tile containing them plus the
/// pixel offset of the point inside that tile.
///
/// # Arguments
///
/// * `coordinates` - Latitude in ±85.05112878, longitude in ±180
/// * `zoom` - Zoom level (0 to 19)
///
/// Longitude 180 is the same meridian as -180 and wraps to column 0.
pub fn locate(coordinates: &Coordinates, zoom: u8) -> Result<TilePoint, CoordError> {
    coordinates.validate()?;
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = 1i64 << zoom;
    let (x, y) = project(coordinates.latitude, coordinates.longitude, zoom);

    let floor_x = x.floor();
    let tile_x = (floor_x as i64).rem_euclid(n) as u32;
    let offset_x = ((x - floor_x) * TILE_SIZE as f64).clamp(0.0, MAX_OFFSET);

    // Rounding at the latitude limits can land a hair outside the grid.
    let tile_y = (y.floor() as i64).clamp(0, n - 1) as u32;
    let offset_y = ((y - tile_y as f64) * TILE_SIZE as f64).clamp(0.0, MAX_OFFSET);

    Ok(TilePoint {
        tile: TileCoord::new(tile_x, tile_y, zoom),
        offset_x,
        offset_y,
    })
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoord) -> (f64, f64) {
    let n = 2.0_f64.powi(tile.zoom as i32);

    let lon = tile.x as f64 / n * 360.0 - 180.0;

    let y = tile.y as f64 / n;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    (lat, lon)
}
