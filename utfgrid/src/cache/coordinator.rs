//! The tile cache proper.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::entry::{Attempt, CacheEntry, EntryState};
use super::error::TileError;
use super::handle::{FetchHandle, FetchStatus};
use crate::coord::TileCoord;
use crate::grid::TileGrid;
use crate::provider::{ProviderError, TileSource};

/// Result of one fetch task, marshaled back to the dispatch thread.
struct Completion {
    coord: TileCoord,
    attempt: u64,
    result: Result<TileGrid, TileError>,
}

/// What applying a completion did to the cache.
#[derive(Debug, Clone)]
pub enum CacheUpdate {
    /// Tile decoded and stored.
    Loaded {
        coord: TileCoord,
        grid: Arc<TileGrid>,
    },
    /// Fetch failed; the entry is marked failed.
    Failed { coord: TileCoord, error: TileError },
    /// Completion belonged to a cancelled or superseded attempt.
    Discarded { coord: TileCoord },
}

impl CacheUpdate {
    pub fn coord(&self) -> TileCoord {
        match self {
            CacheUpdate::Loaded { coord, .. }
            | CacheUpdate::Failed { coord, .. }
            | CacheUpdate::Discarded { coord } => *coord,
        }
    }
}

/// Lifetime counters, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Fetch tasks spawned.
    pub fetches_started: u64,
    /// Completions committed as loaded.
    pub loaded: u64,
    /// Completions committed as failed.
    pub failed: u64,
    /// Completions dropped because their attempt was stale.
    pub discarded: u64,
    /// Pending fetches cancelled by eviction or invalidation.
    pub cancelled: u64,
}

/// Per-layer cache of decoded UTFGrid tiles.
///
/// All methods take `&mut self` and are meant to be called from a single
/// dispatch thread; only the network fetches run concurrently.
pub struct TileCache {
    source: Arc<dyn TileSource>,
    runtime: Handle,
    entries: HashMap<TileCoord, CacheEntry>,
    next_attempt: u64,
    in_flight: usize,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    stats: CacheStats,
}

impl TileCache {
    /// Creates an empty cache that spawns fetches on `runtime`.
    pub fn new(source: Arc<dyn TileSource>, runtime: Handle) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            source,
            runtime,
            entries: HashMap::new(),
            next_attempt: 0,
            in_flight: 0,
            completions_tx,
            completions_rx,
            stats: CacheStats::default(),
        }
    }

    /// The source tiles are fetched from.
    pub fn source(&self) -> &Arc<dyn TileSource> {
        &self.source
    }

    /// Requests a tile, starting a fetch only if none is usable.
    ///
    /// - Resolved: returns a finished handle, no network access.
    /// - Pending: returns a handle sharing the in-flight fetch.
    /// - Absent, failed, or cancelled: starts a new fetch attempt.
    pub fn request(&mut self, coord: TileCoord) -> FetchHandle {
        match self.entries.get(&coord) {
            Some(CacheEntry::Resolved(_)) => {
                trace!(tile = %coord, "Tile already cached");
                return FetchHandle::ready(coord);
            }
            Some(CacheEntry::Pending(attempt)) if !attempt.is_cancelled() => {
                trace!(tile = %coord, attempt = attempt.id, "Joining in-flight tile fetch");
                return FetchHandle::pending(coord, attempt);
            }
            _ => {}
        }
        self.start_fetch(coord)
    }

    fn start_fetch(&mut self, coord: TileCoord) -> FetchHandle {
        self.next_attempt += 1;
        let attempt = Attempt::new(self.next_attempt);
        let handle = FetchHandle::pending(coord, &attempt);

        let source = Arc::clone(&self.source);
        let completions = self.completions_tx.clone();
        let cancellation = attempt.token();
        let attempt_id = attempt.id;
        let url = source.tile_url(coord);

        debug!(tile = %coord, attempt = attempt_id, url = %url, "Fetching tile");

        // The fetch runs in its own task so a panic still yields a completion.
        self.runtime.spawn(async move {
            let fetch = tokio::spawn(fetch_tile(source, coord, url, cancellation));
            let result = match fetch.await {
                Ok(result) => result,
                Err(e) if e.is_cancelled() => Err(TileError::Cancelled),
                Err(e) => Err(TileError::Task {
                    tile: coord.key(),
                    reason: e.to_string(),
                }),
            };
            // A closed channel means the cache itself is gone.
            let _ = completions.send(Completion {
                coord,
                attempt: attempt_id,
                result,
            });
        });

        self.in_flight += 1;
        self.stats.fetches_started += 1;
        self.entries.insert(coord, CacheEntry::Pending(attempt));
        handle
    }

    /// Cancels a pending fetch and forgets the entry.
    ///
    /// Called when the host evicts a tile. Resolved and failed entries are
    /// left alone. Returns true if a fetch was cancelled.
    pub fn cancel(&mut self, coord: TileCoord) -> bool {
        let attempt = match self.entries.get(&coord) {
            Some(CacheEntry::Pending(attempt)) => Arc::clone(attempt),
            _ => return false,
        };
        self.entries.remove(&coord);
        if attempt.cancel() {
            self.stats.cancelled += 1;
            debug!(tile = %coord, attempt = attempt.id, "Pending tile fetch cancelled");
            true
        } else {
            false
        }
    }

    /// Drops every entry and cancels every pending fetch.
    ///
    /// Used when the tile source changes; later lookups must refetch.
    pub fn invalidate_all(&mut self) {
        let mut cancelled = 0;
        for entry in self.entries.values() {
            if let CacheEntry::Pending(attempt) = entry {
                if attempt.cancel() {
                    cancelled += 1;
                }
            }
        }
        let dropped = self.entries.len();
        self.entries.clear();
        self.stats.cancelled += cancelled;
        info!(dropped, cancelled, "Tile cache invalidated");
    }

    /// Decoded grid for a tile, only if resolved. Never blocks.
    pub fn lookup(&self, coord: &TileCoord) -> Option<Arc<TileGrid>> {
        match self.entries.get(coord) {
            Some(CacheEntry::Resolved(grid)) => Some(Arc::clone(grid)),
            _ => None,
        }
    }

    /// Lifecycle state of a tile's entry, `None` if absent.
    pub fn state(&self, coord: &TileCoord) -> Option<EntryState> {
        self.entries.get(coord).and_then(CacheEntry::state)
    }

    /// The error recorded for a failed tile.
    pub fn failure(&self, coord: &TileCoord) -> Option<&TileError> {
        match self.entries.get(coord) {
            Some(CacheEntry::Failed(error)) => Some(error),
            _ => None,
        }
    }

    /// Number of live entries (cancelled attempts excluded).
    pub fn len(&self) -> usize {
        self.entries.values().filter(|e| e.state().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of fetches currently pending.
    pub fn pending_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.state() == Some(EntryState::Pending))
            .count()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Applies every completion that has already arrived. Never blocks.
    pub fn apply_ready(&mut self) -> Vec<CacheUpdate> {
        let mut updates = Vec::new();
        while let Ok(completion) = self.completions_rx.try_recv() {
            updates.push(self.apply(completion));
        }
        updates
    }

    /// Waits for the next completion and applies it.
    ///
    /// Returns `None` when no fetch is outstanding.
    pub async fn next_update(&mut self) -> Option<CacheUpdate> {
        if self.in_flight == 0 {
            return None;
        }
        let completion = self.completions_rx.recv().await?;
        Some(self.apply(completion))
    }

    fn apply(&mut self, completion: Completion) -> CacheUpdate {
        self.in_flight = self.in_flight.saturating_sub(1);
        let Completion {
            coord,
            attempt,
            result,
        } = completion;

        let current = match self.entries.get(&coord) {
            Some(CacheEntry::Pending(pending)) if pending.id == attempt => {
                Some(Arc::clone(pending))
            }
            _ => None,
        };

        let pending = match current {
            Some(pending) if !pending.is_cancelled() => pending,
            Some(pending) => {
                self.entries.remove(&coord);
                pending.finish(FetchStatus::Cancelled);
                return self.discard(coord, attempt);
            }
            None => return self.discard(coord, attempt),
        };

        match result {
            Ok(grid) => {
                let grid = Arc::new(grid);
                debug!(
                    tile = %coord,
                    attempt,
                    width = grid.width(),
                    height = grid.height(),
                    features = grid.feature_count(),
                    "Tile loaded"
                );
                self.entries
                    .insert(coord, CacheEntry::Resolved(Arc::clone(&grid)));
                pending.finish(FetchStatus::Loaded);
                self.stats.loaded += 1;
                CacheUpdate::Loaded { coord, grid }
            }
            Err(TileError::Cancelled) => {
                self.entries.remove(&coord);
                pending.finish(FetchStatus::Cancelled);
                self.discard(coord, attempt)
            }
            Err(error) => {
                warn!(tile = %coord, attempt, error = %error, "Tile fetch failed");
                self.entries
                    .insert(coord, CacheEntry::Failed(error.clone()));
                pending.finish(FetchStatus::Failed(error.clone()));
                self.stats.failed += 1;
                CacheUpdate::Failed { coord, error }
            }
        }
    }

    fn discard(&mut self, coord: TileCoord, attempt: u64) -> CacheUpdate {
        debug!(tile = %coord, attempt, "Discarding completion of stale fetch");
        self.stats.discarded += 1;
        CacheUpdate::Discarded { coord }
    }
}

impl Drop for TileCache {
    fn drop(&mut self) {
        for (coord, entry) in &self.entries {
            if let CacheEntry::Pending(attempt) = entry {
                if attempt.cancel() {
                    trace!(tile = %coord, attempt = attempt.id, "Pending fetch cancelled on drop");
                }
            }
        }
    }
}

/// Fetches and decodes one tile.
async fn fetch_tile(
    source: Arc<dyn TileSource>,
    coord: TileCoord,
    url: String,
    cancellation: CancellationToken,
) -> Result<TileGrid, TileError> {
    match source.fetch(coord, cancellation).await {
        Ok(bytes) => TileGrid::from_slice(&bytes).map_err(|e| TileError::Parse {
            tile: coord.key(),
            source: e,
        }),
        Err(ProviderError::Cancelled) => Err(TileError::Cancelled),
        Err(e) => Err(TileError::Fetch {
            tile: coord.key(),
            url,
            source: e,
        }),
    }
}
