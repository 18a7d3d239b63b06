//! UTFGrid interaction layer for tiled maps.
//!
//! Answers "which feature is under the pointer?" for a slippy map by
//! fetching the UTFGrid payload that accompanies each map tile, decoding
//! the grid cell under the pointer and emitting hover and click events.
//!
//! # Modules
//!
//! - [`codec`]: UTFGrid character encoding
//! - [`coord`]: tile coordinates, projection and world wrap
//! - [`grid`]: decoded tile payloads and the feature index
//! - [`provider`]: URL templates and the HTTP tile source
//! - [`cache`]: per-tile fetch lifecycle with cancellation
//! - [`hit`]: pixel to grid-cell hit testing
//! - [`interaction`]: throttling, hover tracking and events
//! - [`host`]: the map viewer interface
//! - [`layer`]: the facade wiring everything to a host
//! - [`config`]: layer options and the INI config file
//! - [`logging`]: tracing subscriber setup for binaries

pub mod cache;
pub mod codec;
pub mod config;
pub mod coord;
pub mod grid;
pub mod hit;
pub mod host;
pub mod interaction;
pub mod layer;
pub mod logging;
pub mod provider;

#[cfg(test)]
mod testing;

pub use layer::{EventReceiver, LayerError, UtfGridLayer};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
