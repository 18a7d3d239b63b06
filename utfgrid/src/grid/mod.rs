//! UTFGrid tile payloads.
//!
//! A payload pairs a character grid with a feature table:
//!
//! ```text
//! {
//!   "grid": ["   !", "  !!", ...],   equal-length rows, one char per cell
//!   "keys": ["", "road-12", ...],    index-addressable feature keys
//!   "data": { "road-12": {...} }     key -> feature record
//! }
//! ```
//!
//! Each grid character decodes (see [`crate::codec`]) to an index into
//! `keys`; the key is then looked up in `data`. A key with no entry in
//! `data` marks an empty cell.

mod index;

pub use index::FeatureIndex;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::codec;

/// Errors raised while decoding a tile payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GridError {
    /// Payload was not valid UTFGrid JSON.
    #[error("invalid UTFGrid payload: {0}")]
    Parse(String),
}

/// Identifier of a feature, taken from its `id` field.
///
/// Numeric and string ids are both carried as their textual form so that
/// `1` and `"1"` index the same feature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId(String);

impl FeatureId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeatureId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Immutable feature record shared with event consumers.
///
/// Cloning is cheap: the record itself is reference counted.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature(Arc<Value>);

impl Feature {
    pub fn new(value: Value) -> Self {
        Self(Arc::new(value))
    }

    /// The feature's `id` field, if present and scalar.
    pub fn id(&self) -> Option<FeatureId> {
        self.0.get("id").and_then(FeatureId::from_value)
    }

    /// The raw record.
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Returns true if both handles point at the same record.
    pub fn ptr_eq(&self, other: &Feature) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Debug, Deserialize)]
struct RawTileGrid {
    grid: Vec<String>,
    keys: Vec<String>,
    #[serde(default)]
    data: HashMap<String, Value>,
}

/// Decoded payload for one tile.
#[derive(Debug, Clone)]
pub struct TileGrid {
    /// Rows of UTF-16 code units; each unit is one cell's character code.
    rows: Vec<Vec<u16>>,
    width: usize,
    keys: Vec<String>,
    data: HashMap<String, Feature>,
}

impl TileGrid {
    /// Builds a grid from already-decoded parts.
    pub fn new(grid: Vec<String>, keys: Vec<String>, data: HashMap<String, Value>) -> Self {
        let rows: Vec<Vec<u16>> = grid.iter().map(|row| row.encode_utf16().collect()).collect();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);

        if rows.iter().any(|r| r.len() != width) {
            warn!(
                rows = rows.len(),
                width, "UTFGrid rows have unequal lengths; short rows read as empty"
            );
        }

        let data = data
            .into_iter()
            .map(|(key, value)| (key, Feature::new(value)))
            .collect();

        Self {
            rows,
            width,
            keys,
            data,
        }
    }

    /// Parses a JSON payload.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, GridError> {
        let raw: RawTileGrid =
            serde_json::from_slice(bytes).map_err(|e| GridError::Parse(e.to_string()))?;
        Ok(Self::new(raw.grid, raw.keys, raw.data))
    }

    /// Number of cells per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Number of feature records carried by the payload.
    pub fn feature_count(&self) -> usize {
        self.data.len()
    }

    /// Iterates over `(key, feature)` pairs in no particular order.
    pub fn features(&self) -> impl Iterator<Item = (&str, &Feature)> {
        self.data.iter().map(|(k, f)| (k.as_str(), f))
    }

    /// Character code of the cell at column `gx`, row `gy`.
    ///
    /// Returns `None` for cells outside the grid.
    pub fn char_code(&self, gx: i64, gy: i64) -> Option<u32> {
        let row = self.rows.get(usize::try_from(gy).ok()?)?;
        row.get(usize::try_from(gx).ok()?).map(|&c| c as u32)
    }

    /// Feature key a character code points at.
    ///
    /// `None` when the decoded index is past the end of `keys`.
    pub fn key_for_char_code(&self, char_code: u32) -> Option<&str> {
        let index = usize::try_from(codec::decode(char_code)).ok()?;
        self.keys.get(index).map(String::as_str)
    }

    /// Feature a character code resolves to, if any.
    pub fn feature_for_char_code(&self, char_code: u32) -> Option<&Feature> {
        self.key_for_char_code(char_code)
            .and_then(|key| self.data.get(key))
    }

    /// Feature under the cell at column `gx`, row `gy`.
    pub fn feature_at(&self, gx: i64, gy: i64) -> Option<&Feature> {
        self.char_code(gx, gy)
            .and_then(|code| self.feature_for_char_code(code))
    }
}
