//! Handles to in-flight tile fetches.

use std::sync::{Arc, Weak};

use tokio::sync::watch;
use tracing::debug;

use super::entry::Attempt;
use super::error::TileError;
use crate::coord::TileCoord;

/// Observable status of a tile fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    /// Fetch in flight.
    Pending,
    /// Payload stored in the cache.
    Loaded,
    /// Fetch or decode failed.
    Failed(TileError),
    /// Fetch was cancelled (or the cache was invalidated).
    Cancelled,
}

impl FetchStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, FetchStatus::Pending)
    }

    fn into_result(self) -> Result<(), TileError> {
        match self {
            FetchStatus::Loaded => Ok(()),
            FetchStatus::Failed(e) => Err(e),
            FetchStatus::Pending | FetchStatus::Cancelled => Err(TileError::Cancelled),
        }
    }
}

/// Handle returned by [`TileCache::request`](super::TileCache::request).
///
/// Several handles may share one underlying fetch. Cancelling any of them
/// cancels that fetch; a handle for an already-resolved tile cannot cancel
/// anything.
///
/// Handles do not keep the attempt alive. Once the cache drops it, waiting
/// handles resolve as cancelled.
#[derive(Debug, Clone)]
pub struct FetchHandle {
    coord: TileCoord,
    status: watch::Receiver<FetchStatus>,
    attempt: Option<Weak<Attempt>>,
}

impl FetchHandle {
    pub(crate) fn pending(coord: TileCoord, attempt: &Arc<Attempt>) -> Self {
        Self {
            coord,
            status: attempt.subscribe(),
            attempt: Some(Arc::downgrade(attempt)),
        }
    }

    /// Handle for a tile already in the cache.
    pub(crate) fn ready(coord: TileCoord) -> Self {
        let (_, status) = watch::channel(FetchStatus::Loaded);
        Self {
            coord,
            status,
            attempt: None,
        }
    }

    pub fn coord(&self) -> TileCoord {
        self.coord
    }

    /// Current status, without waiting.
    pub fn status(&self) -> FetchStatus {
        self.status.borrow().clone()
    }

    pub fn is_finished(&self) -> bool {
        !self.status.borrow().is_pending()
    }

    /// Cancels the fetch if it is still pending.
    ///
    /// Completed work is never discarded: on a loaded tile this does nothing.
    pub fn cancel(&self) {
        if let Some(attempt) = self.attempt.as_ref().and_then(Weak::upgrade) {
            if attempt.cancel() {
                debug!(tile = %self.coord, attempt = attempt.id, "Tile fetch cancelled");
            }
        }
    }

    /// Waits until the fetch finishes.
    ///
    /// The result is only published once the cache owner applies the
    /// completion, so some task must be driving
    /// [`TileCache::next_update`](super::TileCache::next_update) or
    /// [`TileCache::apply_ready`](super::TileCache::apply_ready).
    /// Resolves as [`TileError::Cancelled`] if the attempt is dropped first.
    pub async fn wait(&mut self) -> Result<(), TileError> {
        let status = match self.status.wait_for(|s| !s.is_pending()).await {
            Ok(status) => status.clone(),
            Err(_) => FetchStatus::Cancelled,
        };
        status.into_result()
    }
}
