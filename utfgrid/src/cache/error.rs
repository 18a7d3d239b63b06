//! Tile loading errors.

use thiserror::Error;

use crate::grid::GridError;
use crate::provider::ProviderError;

/// Errors surfaced for a single tile.
///
/// None of these are fatal: the tile simply has no interaction data and the
/// layer reports the failure as an `error` event.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TileError {
    /// Network or HTTP failure fetching the payload.
    #[error("failed to fetch tile {tile} from {url}: {source}")]
    Fetch {
        tile: String,
        url: String,
        #[source]
        source: ProviderError,
    },

    /// Payload arrived but is not valid UTFGrid JSON.
    #[error("failed to decode tile {tile}: {source}")]
    Parse {
        tile: String,
        #[source]
        source: GridError,
    },

    /// The fetch task died before producing a result.
    #[error("fetch task for tile {tile} failed: {reason}")]
    Task { tile: String, reason: String },

    /// The fetch was cancelled. Never reported as an error event.
    #[error("tile fetch cancelled")]
    Cancelled,
}

impl TileError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TileError::Cancelled)
    }
}
