//! Feature id index across loaded tiles.
//!
//! Tracks which tiles carry a record for each feature id, so a host can
//! find every tile a feature spans (e.g. to highlight it) without scanning
//! the cache.

use std::collections::{BTreeSet, HashMap};

use super::{FeatureId, TileGrid};

/// Maps feature ids to the keys of the tiles that contain them.
#[derive(Debug, Default)]
pub struct FeatureIndex {
    tiles_by_feature: HashMap<FeatureId, BTreeSet<String>>,
}

impl FeatureIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every identified feature carried by a loaded tile.
    pub fn insert_tile(&mut self, tile_key: &str, grid: &TileGrid) {
        for (_, feature) in grid.features() {
            if let Some(id) = feature.id() {
                self.tiles_by_feature
                    .entry(id)
                    .or_default()
                    .insert(tile_key.to_string());
            }
        }
    }

    /// Tile keys containing the feature, in sorted order.
    pub fn tiles_for(&self, id: &FeatureId) -> Vec<String> {
        self.tiles_by_feature
            .get(id)
            .map(|tiles| tiles.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of distinct feature ids indexed.
    pub fn len(&self) -> usize {
        self.tiles_by_feature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles_by_feature.is_empty()
    }

    pub fn clear(&mut self) {
        self.tiles_by_feature.clear();
    }
}
