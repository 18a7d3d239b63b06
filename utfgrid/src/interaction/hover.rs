//! Hover tracking and event classification.

use tracing::trace;

use super::events::{FeatureEvent, LayerEvent};
use crate::coord::GeoPoint;
use crate::grid::Feature;
use crate::hit::HitResult;

/// Grid cell currently under the pointer.
///
/// Equality on this, not on feature identity, decides whether a move
/// stays on the same target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HoverTarget {
    pub tile_key: String,
    pub char_code: u32,
}

impl HoverTarget {
    /// Target for a hit that resolved to a feature. Feature-less cells
    /// have no target.
    pub fn from_hit(hit: &HitResult) -> Option<Self> {
        hit.feature.as_ref()?;
        Some(Self {
            tile_key: hit.tile_key.clone()?,
            char_code: hit.char_code?,
        })
    }

    pub fn cell_key(&self) -> String {
        format!("{}:{}", self.tile_key, self.char_code)
    }
}

/// Hover session state.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum HoverState {
    #[default]
    Idle,
    Hovering {
        target: HoverTarget,
        feature: Feature,
    },
}

impl HoverState {
    pub fn new() -> Self {
        Self::Idle
    }

    pub fn target(&self) -> Option<&HoverTarget> {
        match self {
            HoverState::Idle => None,
            HoverState::Hovering { target, .. } => Some(target),
        }
    }

    pub fn is_hovering(&self) -> bool {
        matches!(self, HoverState::Hovering { .. })
    }

    /// Classifies a resolved pointer move and advances the state.
    ///
    /// Returns the events to emit, in order.
    pub fn on_move(&mut self, hit: &HitResult, geo: GeoPoint) -> Vec<LayerEvent> {
        let next = HoverTarget::from_hit(hit);

        if next.is_some() && next.as_ref() == self.target() {
            return vec![LayerEvent::MouseMove(FeatureEvent::from_hit(geo, hit))];
        }

        let mut events = Vec::with_capacity(2);
        let previous = std::mem::take(self);
        if let HoverState::Hovering { target, feature } = previous {
            trace!(cell = %target.cell_key(), "Pointer left feature");
            events.push(LayerEvent::MouseOut(FeatureEvent {
                geo,
                feature: Some(feature),
                cell_key: Some(target.cell_key()),
                tile_key: Some(target.tile_key),
            }));
        }

        if let (Some(target), Some(feature)) = (next, hit.feature.clone()) {
            trace!(cell = %target.cell_key(), "Pointer entered feature");
            events.push(LayerEvent::MouseOver(FeatureEvent::from_hit(geo, hit)));
            *self = HoverState::Hovering { target, feature };
        }

        events
    }

    /// Click events ignore hover state.
    pub fn on_click(&self, hit: &HitResult, geo: GeoPoint) -> LayerEvent {
        LayerEvent::Click(FeatureEvent::from_hit(geo, hit))
    }

    /// Forgets the hovered target without emitting anything.
    pub fn reset(&mut self) {
        *self = HoverState::Idle;
    }
}
