//! Tile payload sources.
//!
//! This module provides the transport side of the layer: URL templating,
//! an HTTP client abstraction, and the [`TileSource`] trait the cache
//! fetches through.
//!
//! ```ignore
//! use utfgrid::provider::{AsyncReqwestClient, UrlTemplate, UrlTileSource};
//!
//! let client = AsyncReqwestClient::new()?;
//! let template = UrlTemplate::new("https://{s}.tiles.example.com/{z}/{x}/{y}.grid.json")?;
//! let source = UrlTileSource::new(template, client);
//! ```

mod http;
mod source;
mod template;
mod types;

pub use http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_TIMEOUT_SECS};
pub use source::{TileSource, UrlTileSource};
pub use template::{UrlTemplate, DEFAULT_SUBDOMAINS};
pub use types::{BoxFuture, ProviderError};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
