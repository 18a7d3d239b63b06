//! Events delivered to the host application.

use std::fmt;

use crate::cache::TileError;
use crate::coord::GeoPoint;
use crate::grid::{Feature, FeatureId};
use crate::hit::HitResult;

/// Payload of pointer events.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureEvent {
    /// Pointer position.
    pub geo: GeoPoint,
    /// Feature under the pointer (for `mouseout`, the feature left).
    pub feature: Option<Feature>,
    /// Key of the tile the feature came from.
    pub tile_key: Option<String>,
    /// `"{tile_key}:{char_code}"` of the cell.
    pub cell_key: Option<String>,
}

impl FeatureEvent {
    /// Builds an event from a hit test result.
    pub fn from_hit(geo: GeoPoint, hit: &HitResult) -> Self {
        Self {
            geo,
            feature: hit.feature.clone(),
            tile_key: hit.tile_key.clone(),
            cell_key: hit.cell_key(),
        }
    }

    /// Id of the carried feature.
    pub fn id(&self) -> Option<FeatureId> {
        self.feature.as_ref().and_then(Feature::id)
    }
}

/// Everything the layer reports to its host.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerEvent {
    MouseOver(FeatureEvent),
    MouseMove(FeatureEvent),
    MouseOut(FeatureEvent),
    Click(FeatureEvent),
    /// A tile failed to load.
    Error(TileError),
}

impl LayerEvent {
    /// Event name as used by map viewers.
    pub fn name(&self) -> &'static str {
        match self {
            LayerEvent::MouseOver(_) => "mouseover",
            LayerEvent::MouseMove(_) => "mousemove",
            LayerEvent::MouseOut(_) => "mouseout",
            LayerEvent::Click(_) => "click",
            LayerEvent::Error(_) => "error",
        }
    }

    /// Pointer payload, if this is a pointer event.
    pub fn feature_event(&self) -> Option<&FeatureEvent> {
        match self {
            LayerEvent::MouseOver(e)
            | LayerEvent::MouseMove(e)
            | LayerEvent::MouseOut(e)
            | LayerEvent::Click(e) => Some(e),
            LayerEvent::Error(_) => None,
        }
    }
}

impl fmt::Display for LayerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerEvent::Error(e) => write!(f, "error: {}", e),
            _ => {
                let id = self
                    .feature_event()
                    .and_then(FeatureEvent::id)
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string());
                write!(f, "{} {}", self.name(), id)
            }
        }
    }
}
