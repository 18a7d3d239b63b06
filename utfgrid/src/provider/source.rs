//! Tile source capability consumed by the cache.

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::http::AsyncHttpClient;
use super::template::UrlTemplate;
use super::types::{BoxFuture, ProviderError};
use crate::coord::TileCoord;

/// Where tile payloads come from.
///
/// The cache depends only on this trait; hosts can plug in anything from a
/// plain HTTP endpoint to an in-memory fixture.
pub trait TileSource: Send + Sync + 'static {
    /// URL (or other locator) for a tile, used in logs and error events.
    fn tile_url(&self, coord: TileCoord) -> String;

    /// Replaces the URL template future fetches use.
    fn set_template(&self, template: UrlTemplate);

    /// Fetches the raw payload for a tile.
    ///
    /// Must return [`ProviderError::Cancelled`] once `cancellation` fires.
    fn fetch(
        &self,
        coord: TileCoord,
        cancellation: CancellationToken,
    ) -> BoxFuture<'_, Result<Vec<u8>, ProviderError>>;
}

/// Tile source that expands a URL template and fetches over HTTP.
pub struct UrlTileSource<C: AsyncHttpClient> {
    template: RwLock<UrlTemplate>,
    http_client: C,
}

impl<C: AsyncHttpClient> UrlTileSource<C> {
    pub fn new(template: UrlTemplate, http_client: C) -> Self {
        Self {
            template: RwLock::new(template),
            http_client,
        }
    }

    /// Current template.
    pub fn template(&self) -> UrlTemplate {
        self.template.read().clone()
    }
}

impl<C: AsyncHttpClient> TileSource for UrlTileSource<C> {
    fn tile_url(&self, coord: TileCoord) -> String {
        self.template.read().url_for(coord)
    }

    fn set_template(&self, template: UrlTemplate) {
        debug!(template = %template, "Tile URL template replaced");
        *self.template.write() = template;
    }

    fn fetch(
        &self,
        coord: TileCoord,
        cancellation: CancellationToken,
    ) -> BoxFuture<'_, Result<Vec<u8>, ProviderError>> {
        let url = self.tile_url(coord);
        Box::pin(async move { self.http_client.get(&url, cancellation).await })
    }
}
