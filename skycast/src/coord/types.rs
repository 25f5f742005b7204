//! Coordinate type definitions

use std::fmt;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Zoom levels accepted by the public tile servers we talk to
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 19;

/// Edge length of a slippy-map tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// A geocoded point of interest, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Checks that the point can be projected onto the Web Mercator grid.
    pub fn validate(&self) -> Result<(), CoordError> {
        if !(MIN_LAT..=MAX_LAT).contains(&self.latitude) {
            return Err(CoordError::InvalidLatitude(self.latitude));
        }
        if !(MIN_LON..=MAX_LON).contains(&self.longitude) {
            return Err(CoordError::InvalidLongitude(self.longitude));
        }
        Ok(())
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.latitude, self.longitude)
    }
}

/// Integer tile address in the slippy-map scheme (`{z}/{x}/{y}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// X coordinate (east-west), 0 at the antimeridian
    pub x: u32,
    /// Y coordinate (north-south), 0 at north
    pub y: u32,
    /// Zoom level
    pub zoom: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// Number of tiles along one axis at this tile's zoom level.
    #[inline]
    pub fn tiles_per_axis(&self) -> u32 {
        1u32 << self.zoom
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// A projected point: the tile that contains it plus the sub-tile offset.
///
/// Offsets are pixel-scaled, in `[0, 256)`, and are only used to pick a
/// quadrant when building the neighbourhood around the point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilePoint {
    pub tile: TileCoord,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl TilePoint {
    #[inline]
    pub fn zoom(&self) -> u8 {
        self.tile.zoom
    }
}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Latitude is outside valid range (-85.05112878 to 85.05112878)
    InvalidLatitude(f64),
    /// Longitude is outside valid range (-180.0 to 180.0)
    InvalidLongitude(f64),
    /// Zoom level is outside valid range (0 to 19)
    InvalidZoom(u8),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidLatitude(lat) => {
                write!(
                    f,
                    "Invalid latitude: {} (must be between {} and {})",
                    lat, MIN_LAT, MAX_LAT
                )
            }
            CoordError::InvalidLongitude(lon) => {
                write!(
                    f,
                    "Invalid longitude: {} (must be between {} and {})",
                    lon, MIN_LON, MAX_LON
                )
            }
            CoordError::InvalidZoom(zoom) => {
                write!(
                    f,
                    "Invalid zoom level: {} (must be between {} and {})",
                    zoom, MIN_ZOOM, MAX_ZOOM
                )
            }
        }
    }
}

impl std::error::Error for CoordError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_austin() {
        assert!(Coordinates::new(30.2711, -97.7437).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_pole() {
        let err = Coordinates::new(90.0, 0.0).validate().unwrap_err();
        assert_eq!(err, CoordError::InvalidLatitude(90.0));
    }

    #[test]
    fn test_validate_rejects_longitude() {
        let err = Coordinates::new(0.0, -180.5).validate().unwrap_err();
        assert_eq!(err, CoordError::InvalidLongitude(-180.5));
    }

    #[test]
    fn test_tile_display_is_zxy() {
        assert_eq!(TileCoord::new(29, 52, 7).to_string(), "7/29/52");
    }

    #[test]
    fn test_tiles_per_axis() {
        assert_eq!(TileCoord::new(0, 0, 0).tiles_per_axis(), 1);
        assert_eq!(TileCoord::new(0, 0, 7).tiles_per_axis(), 128);
    }

    #[test]
    fn test_coord_error_display() {
        let err = CoordError::InvalidZoom(25);
        assert_eq!(
            err.to_string(),
            "Invalid zoom level: 25 (must be between 0 and 19)"
        );
    }
}
