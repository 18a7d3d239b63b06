//! Tile cache and fetch coordinator.
//!
//! Owns one entry per tile coordinate and drives each tile through its
//! fetch lifecycle:
//!
//! ```text
//!            request()                 completion (ok)
//!   (absent) ---------> Pending ----------------------> Resolved
//!      ^                  |  \
//!      |    cancel()      |   \  completion (error)
//!      +------------------+    +--------------------> Failed --request()--> Pending
//! ```
//!
//! # Dispatch model
//!
//! Fetches run as tokio tasks, but they never touch the cache. Each task
//! sends its result over a channel and the owner of the cache applies it
//! with [`TileCache::apply_ready`] or [`TileCache::next_update`] on the
//! dispatch thread. A result is committed only if its attempt id still
//! matches the pending entry and the attempt was not cancelled, so a late
//! response can never overwrite a newer fetch or an invalidated cache.

mod coordinator;
mod entry;
mod error;
mod handle;

pub use coordinator::{CacheStats, CacheUpdate, TileCache};
pub use entry::EntryState;
pub use error::TileError;
pub use handle::{FetchHandle, FetchStatus};
