//! The interaction layer facade.
//!
//! [`UtfGridLayer`] wires the tile cache, hit tester and hover state
//! machine to a [`MapHost`]. The host drives it from a single dispatch
//! thread:
//!
//! - tile lifecycle: [`on_tile_created`](UtfGridLayer::on_tile_created),
//!   [`on_tile_removed`](UtfGridLayer::on_tile_removed)
//! - pointer input: [`pointer_move`](UtfGridLayer::pointer_move),
//!   [`pointer_click`](UtfGridLayer::pointer_click) and the box-zoom hooks
//! - timers: [`tick`](UtfGridLayer::tick) at the returned deadline
//! - fetch completions: [`apply_ready`](UtfGridLayer::apply_ready) or
//!   [`next_update`](UtfGridLayer::next_update)
//!
//! Events are delivered on the channel returned by [`UtfGridLayer::new`].

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::cache::{CacheUpdate, FetchHandle, TileCache};
use crate::config::{ConfigError, LayerConfig};
use crate::coord::{GeoPoint, TileCoord};
use crate::grid::{Feature, FeatureId, FeatureIndex};
use crate::hit::{self, HitResult, View};
use crate::host::MapHost;
use crate::interaction::{
    cursor_strategy, BoxZoomGate, Cursor, CursorStrategy, HoverState, LayerEvent, MoveThrottle,
};
use crate::provider::{ProviderError, TileSource, UrlTemplate};

/// Errors from layer setup and reconfiguration.
#[derive(Debug, Error)]
pub enum LayerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Template(#[from] ProviderError),
}

/// Receiving end of the layer's event stream.
pub type EventReceiver = mpsc::UnboundedReceiver<LayerEvent>;

/// UTFGrid interaction layer attached to a map host.
pub struct UtfGridLayer<H: MapHost> {
    config: LayerConfig,
    host: H,
    cache: TileCache,
    index: FeatureIndex,
    hover: HoverState,
    throttle: MoveThrottle<GeoPoint>,
    gate: BoxZoomGate,
    cursor: Box<dyn CursorStrategy>,
    events: mpsc::UnboundedSender<LayerEvent>,
    attached: bool,
}

impl<H: MapHost> UtfGridLayer<H> {
    /// Creates a detached layer. Fetches are spawned on `runtime`.
    pub fn new(
        config: LayerConfig,
        source: Arc<dyn TileSource>,
        host: H,
        runtime: Handle,
    ) -> Result<(Self, EventReceiver), LayerError> {
        config.validate()?;
        let (events, receiver) = mpsc::unbounded_channel();

        let layer = Self {
            cursor: cursor_strategy(config.pointer_cursor),
            throttle: MoveThrottle::new(config.mouse_interval),
            gate: BoxZoomGate::new(config.box_zoom_resume_delay),
            cache: TileCache::new(source, runtime),
            index: FeatureIndex::new(),
            hover: HoverState::new(),
            config,
            host,
            events,
            attached: false,
        };
        Ok((layer, receiver))
    }

    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host access, e.g. to change zoom in a headless host.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    pub fn hover(&self) -> &HoverState {
        &self.hover
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Starts handling pointer input.
    pub fn attach(&mut self) {
        if self.attached {
            return;
        }
        self.attached = true;
        self.gate.reset();
        info!(resolution = self.config.resolution, "UTFGrid layer attached");
    }

    /// Stops handling pointer input and clears hover state.
    ///
    /// Cached tiles are kept.
    pub fn detach(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;
        self.reset_pointer();
        info!("UTFGrid layer detached");
    }

    /// Points the layer at a new tile URL template.
    ///
    /// Pending fetches are cancelled, cached tiles and the feature index
    /// are dropped, and hover state is reset without emitting events.
    pub fn set_url(&mut self, template: &str) -> Result<(), LayerError> {
        let template = UrlTemplate::with_subdomains(template, self.config.subdomains.clone())?;
        info!(template = %template, "UTFGrid source changed");

        self.cache.source().set_template(template);
        self.cache.invalidate_all();
        self.index.clear();
        self.reset_pointer();
        Ok(())
    }

    fn reset_pointer(&mut self) {
        self.hover.reset();
        self.throttle.cancel();
        self.gate.reset();
        self.cursor.apply(&self.host, Cursor::Default);
    }

    // ========================================================================
    // Tile lifecycle
    // ========================================================================

    /// The host created a tile and needs its grid.
    pub fn on_tile_created(&mut self, coord: TileCoord) -> FetchHandle {
        self.cache.request(coord)
    }

    /// The host removed a tile; abandon its fetch if still running.
    ///
    /// Resolved grids stay cached, along with their feature index entries,
    /// so panning back to a tile needs no refetch. Only
    /// [`set_url`](Self::set_url) clears them.
    pub fn on_tile_removed(&mut self, coord: TileCoord) {
        if self.cache.cancel(coord) {
            debug!(tile = %coord, "Tile removed before load, fetch cancelled");
        }
    }

    /// Applies every fetch completion that has arrived. Never blocks.
    pub fn apply_ready(&mut self) -> Vec<CacheUpdate> {
        let updates = self.cache.apply_ready();
        for update in &updates {
            self.on_cache_update(update);
        }
        updates
    }

    /// Waits for the next fetch completion and applies it.
    ///
    /// Returns `None` when nothing is in flight.
    pub async fn next_update(&mut self) -> Option<CacheUpdate> {
        let update = self.cache.next_update().await?;
        self.on_cache_update(&update);
        Some(update)
    }

    fn on_cache_update(&mut self, update: &CacheUpdate) {
        match update {
            CacheUpdate::Loaded { coord, grid } => {
                self.index.insert_tile(&coord.key(), grid);
            }
            CacheUpdate::Failed { error, .. } => {
                self.emit(LayerEvent::Error(error.clone()));
            }
            CacheUpdate::Discarded { .. } => {}
        }
    }

    // ========================================================================
    // Pointer input
    // ========================================================================

    /// Pointer moved to `geo`. Throttled.
    pub fn pointer_move(&mut self, geo: GeoPoint, now: Instant) {
        if !self.accepts_input(now) {
            return;
        }
        if let Some(geo) = self.throttle.offer(geo, now) {
            self.process_move(geo);
        }
    }

    /// Pointer clicked at `geo`. Never throttled.
    pub fn pointer_click(&mut self, geo: GeoPoint, now: Instant) {
        if !self.accepts_input(now) {
            return;
        }
        let hit = self.hit_test(geo);
        let event = self.hover.on_click(&hit, geo);
        self.emit(event);
    }

    /// A box-zoom drag started: ignore pointer input until it ends.
    pub fn box_zoom_start(&mut self) {
        self.gate.suspend();
        self.throttle.cancel();
    }

    /// The box-zoom drag ended at `now`.
    pub fn box_zoom_end(&mut self, now: Instant) {
        self.gate.resume_after(now);
    }

    /// Runs timer work due at `now`: the trailing throttled move.
    ///
    /// Returns when the host should call `tick` next, if ever.
    pub fn tick(&mut self, now: Instant) -> Option<Instant> {
        if self.accepts_input(now) {
            if let Some(geo) = self.throttle.poll(now) {
                self.process_move(geo);
            }
        }
        self.deadline()
    }

    /// Earliest pending timer deadline.
    pub fn deadline(&self) -> Option<Instant> {
        match (self.throttle.deadline(), self.gate.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn accepts_input(&mut self, now: Instant) -> bool {
        self.attached && self.gate.is_open(now)
    }

    fn process_move(&mut self, geo: GeoPoint) {
        let hit = self.hit_test(geo);
        for event in self.hover.on_move(&hit, geo) {
            match &event {
                LayerEvent::MouseOver(_) => self.cursor.apply(&self.host, Cursor::Pointer),
                LayerEvent::MouseOut(_) => self.cursor.apply(&self.host, Cursor::Default),
                _ => {}
            }
            self.emit(event);
        }
    }

    fn emit(&self, event: LayerEvent) {
        trace!(event = %event, "Layer event");
        if self.events.send(event).is_err() {
            trace!("Event receiver dropped");
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Current hit-test view from the host.
    pub fn view(&self) -> View {
        let zoom = self.host.zoom();
        View {
            zoom,
            tile_size: self.config.tile_size,
            resolution: self.config.resolution,
            world_size: self.host.crs_scale(zoom),
            wrap_vertical: self.config.wrap_vertical,
        }
    }

    /// Resolves the feature under a geographic point, without events.
    pub fn hit_test(&self, geo: GeoPoint) -> HitResult {
        let view = self.view();
        let pixel = self.host.project(geo, view.zoom);
        hit::resolve(pixel, &view, &self.cache)
    }

    /// Feature for a tile key and grid character code.
    pub fn feature_for_char_code(&self, tile_key: &str, char_code: u32) -> Option<Feature> {
        hit::feature_for_char_code(&self.cache, tile_key, char_code)
    }

    /// Keys of loaded tiles containing a feature.
    pub fn tiles_for_feature(&self, id: &FeatureId) -> Vec<String> {
        self.index.tiles_for(id)
    }
}
