//! Tile coordinates and pixel-space helpers.
//!
//! Tiles are addressed with the viewer's XYZ scheme:
//! - X: column, increasing eastward
//! - Y: row, increasing southward
//! - Z: zoom level
//!
//! The cache key for a tile is `"{x}:{y}:{z}"`, the same key format the
//! host viewer uses for its own tile bookkeeping.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Maximum latitude representable in Web Mercator.
pub const MAX_LAT: f64 = 85.05112878;

/// Minimum latitude representable in Web Mercator.
pub const MIN_LAT: f64 = -85.05112878;

/// Errors from coordinate parsing and conversion.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CoordError {
    /// Tile key did not have the `x:y:z` shape.
    #[error("invalid tile key '{0}' (expected x:y:z)")]
    InvalidKey(String),

    /// Latitude outside the Web Mercator range.
    #[error("invalid latitude {0} (outside the Web Mercator range)")]
    InvalidLatitude(f64),
}

/// Tile address `{x, y, z}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// Column.
    pub x: i64,
    /// Row.
    pub y: i64,
    /// Zoom level.
    pub z: u8,
}

impl TileCoord {
    /// Creates a tile coordinate.
    pub fn new(x: i64, y: i64, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Stable string key used by the cache and in emitted events.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Wraps the coordinate into the world at this zoom.
    ///
    /// `x` always wraps modulo `world_tiles`; `y` wraps only when
    /// `wrap_vertical` is set. Negative indices wrap from the far edge.
    pub fn wrap(self, world_tiles: i64, wrap_vertical: bool) -> Self {
        let n = world_tiles.max(1);
        Self {
            x: self.x.rem_euclid(n),
            y: if wrap_vertical {
                self.y.rem_euclid(n)
            } else {
                self.y
            },
            z: self.z,
        }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.x, self.y, self.z)
    }
}

impl FromStr for TileCoord {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoordError::InvalidKey(s.to_string());
        let mut parts = s.split(':');
        let x = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        let y = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        let z = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self { x, y, z })
    }
}

/// Geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Point in the viewer's world pixel space at a given zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// World size in pixels at `zoom` for square tiles of `tile_size` pixels.
#[inline]
pub fn world_size(zoom: u8, tile_size: u32) -> f64 {
    tile_size as f64 * 2.0_f64.powi(zoom as i32)
}

/// Number of tiles spanning the world for a given world size.
///
/// Never returns less than 1.
#[inline]
pub fn world_tiles(world_size: f64, tile_size: u32) -> i64 {
    if tile_size == 0 || !world_size.is_finite() {
        return 1;
    }
    ((world_size / tile_size as f64).round() as i64).max(1)
}

/// Projects a geographic point into Web Mercator world pixels.
///
/// Latitude is clamped to the Mercator range so polar input stays finite.
pub fn project_web_mercator(geo: GeoPoint, zoom: u8, tile_size: u32) -> PixelPoint {
    let size = world_size(zoom, tile_size);
    let lat = geo.lat.clamp(MIN_LAT, MAX_LAT);

    let x = (geo.lon + 180.0) / 360.0 * size;
    let lat_rad = lat * PI / 180.0;
    let y = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * size;

    PixelPoint { x, y }
}

/// Returns the tile containing a geographic point.
pub fn tile_for_geo(geo: GeoPoint, zoom: u8) -> Result<TileCoord, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&geo.lat) {
        return Err(CoordError::InvalidLatitude(geo.lat));
    }
    let pixel = project_web_mercator(geo, zoom, 1);
    let n = 2_i64.pow(zoom as u32);
    let tile = TileCoord::new(pixel.x.floor() as i64, pixel.y.floor() as i64, zoom);
    Ok(tile.wrap(n, false))
}
