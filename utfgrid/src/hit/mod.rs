//! Pixel to grid-cell hit testing.
//!
//! Converts a world pixel position into the tile that owns it and the
//! cell inside that tile's grid, then resolves the cell to a feature:
//!
//! ```text
//! pixel ──► tile (x, y) ──► wrap ──► cache lookup ──► cell (gx, gy)
//!                                                        │
//!                     feature ◄── data[key] ◄── keys[decode(char)]
//! ```
//!
//! Every "no answer" case (tile not loaded yet, cell outside the grid,
//! index past `keys`, key without a record) resolves to no feature. Hit
//! testing never fails and never blocks.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::cache::TileCache;
use crate::coord::{world_tiles, PixelPoint, TileCoord};
use crate::grid::{Feature, TileGrid};

/// Read-only access to decoded tiles.
///
/// Implemented by [`TileCache`]; tests can use a plain map.
pub trait GridLookup {
    fn grid(&self, coord: &TileCoord) -> Option<Arc<TileGrid>>;
}

impl GridLookup for TileCache {
    fn grid(&self, coord: &TileCoord) -> Option<Arc<TileGrid>> {
        self.lookup(coord)
    }
}

impl GridLookup for HashMap<TileCoord, Arc<TileGrid>> {
    fn grid(&self, coord: &TileCoord) -> Option<Arc<TileGrid>> {
        self.get(coord).cloned()
    }
}

/// Viewer state a hit test needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    /// Current zoom level.
    pub zoom: u8,
    /// Rendered tile size in pixels.
    pub tile_size: u32,
    /// Pixel footprint of one grid cell.
    pub resolution: u32,
    /// World size in pixels at `zoom` (the CRS scale).
    pub world_size: f64,
    /// Whether tile rows wrap like columns do.
    pub wrap_vertical: bool,
}

impl View {
    /// Tiles spanning the world at this zoom.
    pub fn world_tiles(&self) -> i64 {
        world_tiles(self.world_size, self.tile_size)
    }
}

/// Tile and cell a pixel falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellLocation {
    /// Owning tile, already wrapped into the world.
    pub tile: TileCoord,
    /// Grid column.
    pub gx: i64,
    /// Grid row.
    pub gy: i64,
}

/// Locates the tile and grid cell under a world pixel.
pub fn locate(pixel: PixelPoint, view: &View) -> CellLocation {
    let tile_size = view.tile_size.max(1) as f64;
    let resolution = view.resolution.max(1) as f64;

    let x = (pixel.x / tile_size).floor();
    let y = (pixel.y / tile_size).floor();
    let gx = ((pixel.x - x * tile_size) / resolution).floor() as i64;
    let gy = ((pixel.y - y * tile_size) / resolution).floor() as i64;

    let tile = TileCoord::new(x as i64, y as i64, view.zoom)
        .wrap(view.world_tiles(), view.wrap_vertical);

    CellLocation { tile, gx, gy }
}

/// Outcome of a hit test.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HitResult {
    /// Key of the owning tile, `None` if the tile is not loaded.
    pub tile_key: Option<String>,
    /// Character code read from the grid, `None` if no cell was read.
    pub char_code: Option<u32>,
    /// Feature under the pointer.
    pub feature: Option<Feature>,
}

impl HitResult {
    /// Result for a tile that has not finished loading.
    pub fn no_data() -> Self {
        Self::default()
    }

    /// `"{tile_key}:{char_code}"` identifying the cell's feature slot.
    pub fn cell_key(&self) -> Option<String> {
        match (&self.tile_key, self.char_code) {
            (Some(tile), Some(code)) => Some(format!("{}:{}", tile, code)),
            _ => None,
        }
    }
}

/// Resolves the feature under a world pixel.
pub fn resolve<L: GridLookup + ?Sized>(pixel: PixelPoint, view: &View, tiles: &L) -> HitResult {
    let location = locate(pixel, view);
    let Some(grid) = tiles.grid(&location.tile) else {
        trace!(tile = %location.tile, "Hit test on tile without data");
        return HitResult::no_data();
    };

    let tile_key = location.tile.key();
    let Some(char_code) = grid.char_code(location.gx, location.gy) else {
        trace!(
            tile = %tile_key,
            gx = location.gx,
            gy = location.gy,
            "Hit test outside grid bounds"
        );
        return HitResult {
            tile_key: Some(tile_key),
            char_code: None,
            feature: None,
        };
    };

    let feature = grid.feature_for_char_code(char_code).cloned();
    HitResult {
        tile_key: Some(tile_key),
        char_code: Some(char_code),
        feature,
    }
}

/// Resolves a feature directly from a tile key and character code.
///
/// Returns `None` if the key is malformed, the tile is not loaded, or the
/// code does not point at a record.
pub fn feature_for_char_code<L: GridLookup + ?Sized>(
    tiles: &L,
    tile_key: &str,
    char_code: u32,
) -> Option<Feature> {
    let coord: TileCoord = tile_key.parse().ok()?;
    tiles.grid(&coord)?.feature_for_char_code(char_code).cloned()
}
