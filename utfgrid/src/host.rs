//! Interface to the map viewer the layer is attached to.
//!
//! The layer never owns projection or zoom state; it asks the host. Tile
//! lifecycle goes the other way: the host pushes tile creation and
//! removal into [`crate::layer::UtfGridLayer`].

use parking_lot::Mutex;

use crate::coord::{project_web_mercator, world_size, GeoPoint, PixelPoint};
use crate::interaction::{Cursor, CursorSurface};

/// Capabilities the layer needs from a map viewer.
pub trait MapHost: CursorSurface {
    /// Projects a geographic point to world pixels at `zoom`.
    fn project(&self, geo: GeoPoint, zoom: u8) -> PixelPoint;

    /// Current zoom level.
    fn zoom(&self) -> u8;

    /// World size in pixels at `zoom`.
    fn crs_scale(&self, zoom: u8) -> f64;
}

/// Headless host using spherical Web Mercator, as slippy maps do.
#[derive(Debug)]
pub struct WebMercatorHost {
    zoom: u8,
    tile_size: u32,
    cursor: Mutex<Cursor>,
}

impl WebMercatorHost {
    pub fn new(zoom: u8, tile_size: u32) -> Self {
        Self {
            zoom,
            tile_size,
            cursor: Mutex::new(Cursor::Default),
        }
    }

    pub fn set_zoom(&mut self, zoom: u8) {
        self.zoom = zoom;
    }

    /// Last cursor the layer asked for.
    pub fn cursor(&self) -> Cursor {
        *self.cursor.lock()
    }
}

impl CursorSurface for WebMercatorHost {
    fn set_cursor(&self, cursor: Cursor) {
        *self.cursor.lock() = cursor;
    }
}

impl MapHost for WebMercatorHost {
    fn project(&self, geo: GeoPoint, zoom: u8) -> PixelPoint {
        project_web_mercator(geo, zoom, self.tile_size)
    }

    fn zoom(&self) -> u8 {
        self.zoom
    }

    fn crs_scale(&self, zoom: u8) -> f64 {
        world_size(zoom, self.tile_size)
    }
}
