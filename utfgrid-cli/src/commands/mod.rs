//! CLI command implementations.

pub mod codec;
pub mod common;
pub mod config;
pub mod probe;
pub mod tile;
