//! Tile neighbourhoods arranged on a square grid.

use thiserror::Error;

use crate::coord::{TileCoord, TilePoint, TILE_SIZE};

use super::quadrant::Quadrant;

/// Shape of the composited canvas in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridLayout {
    /// 2×2 tiles, 512×512 pixels; the canonical weather overlay.
    TwoByTwo,
    /// 3×3 tiles, 768×768 pixels; the satellite mosaic.
    ThreeByThree,
}

impl GridLayout {
    /// Number of tiles along one side.
    pub fn side(&self) -> u32 {
        match self {
            GridLayout::TwoByTwo => 2,
            GridLayout::ThreeByThree => 3,
        }
    }

    /// Total number of tiles in the layout.
    pub fn len(&self) -> usize {
        (self.side() * self.side()) as usize
    }

    /// Canvas edge length in pixels.
    pub fn canvas_size(&self) -> u32 {
        self.side() * TILE_SIZE
    }
}

/// Column/row of a tile inside the composited grid, `(0, 0)` top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPosition {
    pub col: u32,
    pub row: u32,
}

impl GridPosition {
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }

    /// Top-left pixel of this cell on the canvas.
    pub fn pixel_origin(&self) -> (u32, u32) {
        (self.col * TILE_SIZE, self.row * TILE_SIZE)
    }
}

/// A tile tagged with the grid cell it will be pasted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlacedTile {
    pub tile: TileCoord,
    pub position: GridPosition,
}

/// Errors building a tile neighbourhood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// The world at this zoom is narrower than the requested grid.
    #[error("zoom level {zoom} has fewer than {side} tiles per axis")]
    ZoomTooShallow { zoom: u8, side: u32 },
}

/// The tiles around a point of interest, in row-major grid order.
///
/// All tiles share the point's zoom level. Columns wrap around the
/// antimeridian; rows are shifted inward at the poles so the grid never
/// leaves the world, which keeps the point on the canvas but off-centre.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSet {
    layout: GridLayout,
    point: TilePoint,
    quadrant: Quadrant,
    anchor: GridPosition,
    tiles: Vec<PlacedTile>,
}

impl TileSet {
    /// Builds the neighbourhood for `point` in the given layout.
    ///
    /// For a 2×2 grid the point's quadrant decides which cell holds the
    /// anchor tile (see [`Quadrant::anchor_cell`]). A 3×3 grid always puts
    /// the anchor in the centre cell.
    pub fn around(point: &TilePoint, layout: GridLayout) -> Result<Self, GridError> {
        let zoom = point.zoom();
        let side = layout.side();
        let n = 1i64 << zoom;
        if n < side as i64 {
            return Err(GridError::ZoomTooShallow { zoom, side });
        }

        let quadrant = Quadrant::of(point.offset_x, point.offset_y);
        let (anchor_col, anchor_row) = match layout {
            GridLayout::TwoByTwo => quadrant.anchor_cell(),
            GridLayout::ThreeByThree => (1, 1),
        };

        let anchor_x = point.tile.x as i64;
        let anchor_y = point.tile.y as i64;
        let origin_x = anchor_x - anchor_col as i64;
        let origin_y = (anchor_y - anchor_row as i64).clamp(0, n - side as i64);

        let mut tiles = Vec::with_capacity(layout.len());
        for row in 0..side {
            for col in 0..side {
                let x = (origin_x + col as i64).rem_euclid(n) as u32;
                let y = (origin_y + row as i64) as u32;
                tiles.push(PlacedTile {
                    tile: TileCoord::new(x, y, zoom),
                    position: GridPosition::new(col, row),
                });
            }
        }

        Ok(Self {
            layout,
            point: *point,
            quadrant,
            anchor: GridPosition::new(anchor_col, (anchor_y - origin_y) as u32),
            tiles,
        })
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    pub fn quadrant(&self) -> Quadrant {
        self.quadrant
    }

    /// Grid cell holding the tile that contains the point.
    pub fn anchor(&self) -> GridPosition {
        self.anchor
    }

    pub fn tiles(&self) -> &[PlacedTile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tile_at(&self, position: GridPosition) -> Option<&PlacedTile> {
        self.tiles.iter().find(|t| t.position == position)
    }

    /// Pixel on the composited canvas where the point of interest lands.
    pub fn point_pixel(&self) -> (f64, f64) {
        let (x, y) = self.anchor.pixel_origin();
        (x as f64 + self.point.offset_x, y as f64 + self.point.offset_y)
    }
}

impl<'a> IntoIterator for &'a TileSet {
    type Item = &'a PlacedTile;
    type IntoIter = std::slice::Iter<'a, PlacedTile>;

    fn into_iter(self) -> Self::IntoIter {
        self.tiles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{locate, Coordinates};
    use proptest::prelude::*;

    fn point(x: u32, y: u32, zoom: u8, offset_x: f64, offset_y: f64) -> TilePoint {
        TilePoint {
            tile: TileCoord::new(x, y, zoom),
            offset_x,
            offset_y,
        }
    }

    fn coords(set: &TileSet) -> Vec<(u32, u32)> {
        set.tiles().iter().map(|t| (t.tile.x, t.tile.y)).collect()
    }

    #[test]
    fn test_austin_fixture() {
        let austin = locate(&Coordinates::new(30.2711, -97.7437), 7).unwrap();
        let set = TileSet::around(&austin, GridLayout::TwoByTwo).unwrap();

        assert_eq!(set.quadrant(), Quadrant::BottomLeft);
        assert_eq!(set.anchor(), GridPosition::new(1, 0));
        assert_eq!(coords(&set), vec![(28, 52), (29, 52), (28, 53), (29, 53)]);

        let (px, py) = set.point_pixel();
        assert!((px - 319.15).abs() < 0.01);
        assert!((py - 178.73).abs() < 0.01);
    }

    #[test]
    fn test_each_quadrant_places_anchor_opposite() {
        let cases = [
            (10.0, 10.0, vec![(9, 9), (10, 9), (9, 10), (10, 10)]),
            (200.0, 10.0, vec![(10, 9), (11, 9), (10, 10), (11, 10)]),
            (10.0, 200.0, vec![(9, 10), (10, 10), (9, 11), (10, 11)]),
            (200.0, 200.0, vec![(10, 10), (11, 10), (10, 11), (11, 11)]),
        ];
        for (ox, oy, expected) in cases {
            let set = TileSet::around(&point(10, 10, 5, ox, oy), GridLayout::TwoByTwo).unwrap();
            assert_eq!(coords(&set), expected, "offset ({}, {})", ox, oy);
        }
    }

    #[test]
    fn test_positions_are_row_major() {
        let set = TileSet::around(&point(10, 10, 5, 0.0, 0.0), GridLayout::TwoByTwo).unwrap();
        let positions: Vec<_> = set
            .tiles()
            .iter()
            .map(|t| (t.position.col, t.position.row))
            .collect();
        assert_eq!(positions, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn test_top_edge_shifts_grid_down() {
        let set = TileSet::around(&point(3, 0, 4, 10.0, 10.0), GridLayout::TwoByTwo).unwrap();
        assert_eq!(coords(&set), vec![(2, 0), (3, 0), (2, 1), (3, 1)]);
        assert_eq!(set.anchor(), GridPosition::new(1, 0));
    }

    #[test]
    fn test_bottom_edge_shifts_grid_up() {
        let set = TileSet::around(&point(3, 15, 4, 10.0, 200.0), GridLayout::TwoByTwo).unwrap();
        assert_eq!(coords(&set), vec![(2, 14), (3, 14), (2, 15), (3, 15)]);
        assert_eq!(set.anchor(), GridPosition::new(1, 1));
    }

    #[test]
    fn test_columns_wrap_at_antimeridian() {
        let set = TileSet::around(&point(0, 5, 4, 10.0, 200.0), GridLayout::TwoByTwo).unwrap();
        assert_eq!(coords(&set), vec![(15, 5), (0, 5), (15, 6), (0, 6)]);

        let set = TileSet::around(&point(15, 5, 4, 200.0, 200.0), GridLayout::TwoByTwo).unwrap();
        assert_eq!(coords(&set), vec![(15, 5), (0, 5), (15, 6), (0, 6)]);
    }

    #[test]
    fn test_three_by_three_is_centred() {
        let set =
            TileSet::around(&point(10, 20, 6, 200.0, 10.0), GridLayout::ThreeByThree).unwrap();
        assert_eq!(set.len(), 9);
        assert_eq!(set.anchor(), GridPosition::new(1, 1));
        assert_eq!(set.tiles()[0].tile, TileCoord::new(9, 19, 6));
        assert_eq!(set.tiles()[8].tile, TileCoord::new(11, 21, 6));
        assert_eq!(
            set.tile_at(GridPosition::new(1, 1)).unwrap().tile,
            TileCoord::new(10, 20, 6)
        );
    }

    #[test]
    fn test_zoom_too_shallow() {
        let err = TileSet::around(&point(0, 0, 0, 10.0, 10.0), GridLayout::TwoByTwo).unwrap_err();
        assert_eq!(err, GridError::ZoomTooShallow { zoom: 0, side: 2 });

        let err =
            TileSet::around(&point(0, 0, 1, 10.0, 10.0), GridLayout::ThreeByThree).unwrap_err();
        assert_eq!(err, GridError::ZoomTooShallow { zoom: 1, side: 3 });
    }

    #[test]
    fn test_canvas_sizes() {
        assert_eq!(GridLayout::TwoByTwo.canvas_size(), 512);
        assert_eq!(GridLayout::ThreeByThree.canvas_size(), 768);
    }

    proptest! {
        #[test]
        fn test_two_by_two_invariants(
            lat in -85.0..85.0_f64,
            lon in -180.0..180.0_f64,
            zoom in 1u8..=19
        ) {
            let p = locate(&Coordinates::new(lat, lon), zoom)?;
            let set = TileSet::around(&p, GridLayout::TwoByTwo)?;
            let n = 1u32 << zoom;

            prop_assert_eq!(set.len(), 4);
            for placed in &set {
                prop_assert_eq!(placed.tile.zoom, zoom);
                prop_assert!(placed.tile.y < n);
                let dx = (placed.tile.x + n - p.tile.x) % n;
                prop_assert!(dx == 0 || dx == 1 || dx == n - 1, "dx {}", dx);
                prop_assert!(placed.tile.y.abs_diff(p.tile.y) <= 1);
            }

            let anchor = set.tile_at(set.anchor()).unwrap();
            prop_assert_eq!(anchor.tile, p.tile);

            let (px, py) = set.point_pixel();
            prop_assert!((0.0..512.0).contains(&px) && (0.0..512.0).contains(&py));
            if p.tile.y > 0 && p.tile.y < n - 1 {
                prop_assert!((128.0..384.0).contains(&px), "px {}", px);
                prop_assert!((128.0..384.0).contains(&py), "py {}", py);
            }
        }

        #[test]
        fn test_three_by_three_covers_anchor(
            lat in -85.0..85.0_f64,
            lon in -180.0..180.0_f64,
            zoom in 2u8..=19
        ) {
            let p = locate(&Coordinates::new(lat, lon), zoom)?;
            let set = TileSet::around(&p, GridLayout::ThreeByThree)?;

            prop_assert_eq!(set.len(), 9);
            prop_assert_eq!(set.tile_at(set.anchor()).unwrap().tile, p.tile);
            let unique: std::collections::HashSet<_> = set.tiles().iter().map(|t| t.tile).collect();
            prop_assert_eq!(unique.len(), 9);
        }
    }
}
