//! Cache entries and fetch attempts.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::error::TileError;
use super::handle::FetchStatus;
use crate::grid::TileGrid;

/// Public view of an entry's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Fetch in flight.
    Pending,
    /// Payload decoded and stored.
    Resolved,
    /// Last fetch failed; the next request retries.
    Failed,
}

/// One fetch attempt for one tile.
///
/// Shared between the cache entry and every handle issued for it.
#[derive(Debug)]
pub(crate) struct Attempt {
    pub(crate) id: u64,
    cancellation: CancellationToken,
    status: watch::Sender<FetchStatus>,
}

impl Attempt {
    pub(crate) fn new(id: u64) -> Arc<Self> {
        let (status, _) = watch::channel(FetchStatus::Pending);
        Arc::new(Self {
            id,
            cancellation: CancellationToken::new(),
            status,
        })
    }

    pub(crate) fn token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<FetchStatus> {
        self.status.subscribe()
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Cancels the attempt if it has not finished.
    ///
    /// Returns true if this call performed the cancellation.
    pub(crate) fn cancel(&self) -> bool {
        let cancelled = self.status.send_if_modified(|status| {
            if status.is_pending() {
                *status = FetchStatus::Cancelled;
                true
            } else {
                false
            }
        });
        if cancelled {
            self.cancellation.cancel();
        }
        cancelled
    }

    /// Publishes the final status to all handles.
    pub(crate) fn finish(&self, status: FetchStatus) {
        self.status.send_replace(status);
    }
}

/// Cache slot for one tile coordinate.
#[derive(Debug)]
pub(crate) enum CacheEntry {
    Pending(Arc<Attempt>),
    Resolved(Arc<TileGrid>),
    Failed(TileError),
}

impl CacheEntry {
    /// Lifecycle state; a cancelled pending attempt counts as absent.
    pub(crate) fn state(&self) -> Option<EntryState> {
        match self {
            CacheEntry::Pending(attempt) if attempt.is_cancelled() => None,
            CacheEntry::Pending(_) => Some(EntryState::Pending),
            CacheEntry::Resolved(_) => Some(EntryState::Resolved),
            CacheEntry::Failed(_) => Some(EntryState::Failed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_pending_attempt() {
        let attempt = Attempt::new(1);
        let rx = attempt.subscribe();

        assert!(attempt.cancel());
        assert!(attempt.is_cancelled());
        assert_eq!(*rx.borrow(), FetchStatus::Cancelled);

        // Second cancel is a no-op.
        assert!(!attempt.cancel());
    }

    #[test]
    fn test_cancel_after_finish_is_noop() {
        let attempt = Attempt::new(1);
        attempt.finish(FetchStatus::Loaded);

        assert!(!attempt.cancel());
        assert!(!attempt.is_cancelled());
        assert_eq!(*attempt.subscribe().borrow(), FetchStatus::Loaded);
    }

    #[test]
    fn test_cancelled_pending_entry_reads_as_absent() {
        let attempt = Attempt::new(1);
        let entry = CacheEntry::Pending(Arc::clone(&attempt));
        assert_eq!(entry.state(), Some(EntryState::Pending));

        attempt.cancel();
        assert_eq!(entry.state(), None);
    }
}
