//! Tile command - show how a point maps onto the tile grid.

use skycast::coord::{locate, tile_to_lat_lon, Coordinates};
use skycast::grid::{GridLayout, TileSet};

use crate::error::CliError;

/// Arguments for the tile command.
pub struct TileArgs {
    pub lat: f64,
    pub lon: f64,
    pub zoom: u8,
    pub mosaic: bool,
}

/// Run the tile command.
pub fn run(args: TileArgs) -> Result<(), CliError> {
    print!("{}", describe(&args)?);
    Ok(())
}

/// The report printed by [`run`].
pub fn describe(args: &TileArgs) -> Result<String, CliError> {
    let coordinates = Coordinates::new(args.lat, args.lon);
    let point = locate(&coordinates, args.zoom).map_err(|e| CliError::Config(e.to_string()))?;
    let layout = if args.mosaic {
        GridLayout::ThreeByThree
    } else {
        GridLayout::TwoByTwo
    };
    let tiles = TileSet::around(&point, layout).map_err(|e| CliError::Config(e.to_string()))?;
    let (corner_lat, corner_lon) = tile_to_lat_lon(&point.tile);
    let (px, py) = tiles.point_pixel();

    let mut out = format!(
        "Location:  {}\n\
         Tile:      {} (NW corner {:.4},{:.4})\n\
         Offset:    {:.1}, {:.1}\n\
         Quadrant:  {}\n\
         Canvas:    point at {:.1}, {:.1}\n\
         Tiles:\n",
        coordinates,
        point.tile,
        corner_lat,
        corner_lon,
        point.offset_x,
        point.offset_y,
        tiles.quadrant(),
        px,
        py
    );
    for placed in tiles.tiles() {
        out.push_str(&format!(
            "  ({}, {})  {}\n",
            placed.position.col, placed.position.row, placed.tile
        ));
    }
    Ok(out)
}
