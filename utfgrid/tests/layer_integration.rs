//! Integration tests for the UTFGrid layer.
//!
//! These tests drive the public API end to end:
//! - host tile lifecycle → URL template → HTTP client → tile cache
//! - pointer input → hit test → hover events and cursor changes
//! - eviction and source changes racing in-flight fetches
//!
//! Run with: `cargo test --test layer_integration`

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures::future::join_all;
use serde_json::json;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use utfgrid::cache::{CacheUpdate, FetchStatus, TileError};
use utfgrid::config::LayerConfig;
use utfgrid::coord::{world_size, GeoPoint, PixelPoint, TileCoord};
use utfgrid::grid::FeatureId;
use utfgrid::host::MapHost;
use utfgrid::interaction::{Cursor, CursorSurface, LayerEvent};
use utfgrid::provider::{
    AsyncHttpClient, BoxFuture, ProviderError, TileSource, UrlTemplate, UrlTileSource,
};
use utfgrid::{EventReceiver, UtfGridLayer};

// ============================================================================
// Helper Types
// ============================================================================

#[derive(Default)]
struct FakeHttpState {
    bodies: Mutex<HashMap<String, Vec<u8>>>,
    requested: Mutex<Vec<String>>,
}

/// HTTP client serving canned bodies, gated by a semaphore.
///
/// Unknown URLs answer 404. Cancellation is honoured while waiting at the
/// gate, the way a real client drops an in-flight request.
#[derive(Clone)]
struct FakeHttp {
    state: Arc<FakeHttpState>,
    gate: Arc<Semaphore>,
}

impl FakeHttp {
    fn open() -> Self {
        Self::with_permits(Semaphore::MAX_PERMITS)
    }

    fn closed() -> Self {
        Self::with_permits(0)
    }

    fn with_permits(permits: usize) -> Self {
        Self {
            state: Arc::new(FakeHttpState::default()),
            gate: Arc::new(Semaphore::new(permits)),
        }
    }

    fn serve(&self, url: &str, body: Vec<u8>) {
        self.state
            .bodies
            .lock()
            .unwrap()
            .insert(url.to_string(), body);
    }

    fn requested(&self) -> Vec<String> {
        self.state.requested.lock().unwrap().clone()
    }

    fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }
}

impl AsyncHttpClient for FakeHttp {
    fn get<'a>(
        &'a self,
        url: &'a str,
        cancellation: CancellationToken,
    ) -> BoxFuture<'a, Result<Vec<u8>, ProviderError>> {
        Box::pin(async move {
            self.state.requested.lock().unwrap().push(url.to_string());

            tokio::select! {
                biased;
                _ = cancellation.cancelled() => return Err(ProviderError::Cancelled),
                permit = self.gate.acquire() => {
                    if let Ok(permit) = permit {
                        permit.forget();
                    }
                }
            }

            match self.state.bodies.lock().unwrap().get(url) {
                Some(body) => Ok(body.clone()),
                None => Err(ProviderError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        })
    }
}

/// Host whose projection maps `lon` to pixel x and `lat` to pixel y.
struct PixelHost {
    zoom: u8,
    cursors: Mutex<Vec<Cursor>>,
}

impl PixelHost {
    fn new(zoom: u8) -> Self {
        Self {
            zoom,
            cursors: Mutex::new(Vec::new()),
        }
    }

    fn cursors(&self) -> Vec<Cursor> {
        self.cursors.lock().unwrap().clone()
    }
}

impl CursorSurface for PixelHost {
    fn set_cursor(&self, cursor: Cursor) {
        self.cursors.lock().unwrap().push(cursor);
    }
}

impl MapHost for PixelHost {
    fn project(&self, geo: GeoPoint, _zoom: u8) -> PixelPoint {
        PixelPoint::new(geo.lon, geo.lat)
    }

    fn zoom(&self) -> u8 {
        self.zoom
    }

    fn crs_scale(&self, zoom: u8) -> f64 {
        world_size(zoom, 256)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

const TEMPLATE: &str = "https://{s}.grid.example.com/{z}/{x}/{y}.grid.json";

/// Geographic point at world pixel (x, y) under [`PixelHost`].
fn px(x: f64, y: f64) -> GeoPoint {
    GeoPoint::new(y, x)
}

fn url_for(coord: TileCoord) -> String {
    UrlTemplate::new(TEMPLATE).unwrap().url_for(coord)
}

/// Small grid with a reserved-skip code and a key without a record.
fn scenario_payload() -> Vec<u8> {
    json!({
        "grid": ["   ,", " !!+"],
        "keys": ["k0", "k1"],
        "data": { "k0": { "id": 1, "name": "park" } }
    })
    .to_string()
    .into_bytes()
}

/// 64×64 grid: left half `left`, right half `right`.
fn halves_payload(left: &str, right: &str) -> Vec<u8> {
    let row = format!("{}{}", " ".repeat(32), "!".repeat(32));
    json!({
        "grid": vec![row; 64],
        "keys": [left, right],
        "data": { left: { "id": left }, right: { "id": right } }
    })
    .to_string()
    .into_bytes()
}

fn make_layer(
    http: &FakeHttp,
    zoom: u8,
    config: LayerConfig,
) -> (UtfGridLayer<PixelHost>, EventReceiver) {
    let template = UrlTemplate::new(TEMPLATE).unwrap();
    let source: Arc<dyn TileSource> = Arc::new(UrlTileSource::new(template, http.clone()));
    let (mut layer, events) =
        UtfGridLayer::new(config, source, PixelHost::new(zoom), Handle::current()).unwrap();
    layer.attach();
    (layer, events)
}

async fn pump(layer: &mut UtfGridLayer<PixelHost>) -> Vec<CacheUpdate> {
    let mut updates = Vec::new();
    while let Some(update) = layer.next_update().await {
        updates.push(update);
    }
    updates
}

fn drain(events: &mut EventReceiver) -> Vec<LayerEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

fn names(events: &[LayerEvent]) -> Vec<&'static str> {
    events.iter().map(LayerEvent::name).collect()
}

fn ids(events: &[LayerEvent]) -> Vec<Option<String>> {
    events
        .iter()
        .map(|e| e.feature_event().and_then(|f| f.id()).map(|id| id.to_string()))
        .collect()
}

// ============================================================================
// Integration Tests
// ============================================================================

/// A tile loaded over the URL source resolves cells through keys and data.
#[tokio::test]
async fn test_scenario_grid_resolution() {
    let http = FakeHttp::open();
    let coord = TileCoord::new(0, 0, 0);
    http.serve(&url_for(coord), scenario_payload());

    // Four columns across a 256px tile.
    let config = LayerConfig::default().with_resolution(64);
    let (mut layer, mut events) = make_layer(&http, 0, config);

    let mut handle = layer.on_tile_created(coord);
    pump(&mut layer).await;
    handle.wait().await.unwrap();
    assert_eq!(http.requested(), vec![url_for(coord)]);

    let now = Instant::now();
    // (0, 0): ' ' -> index 0 -> "k0".
    layer.pointer_click(px(10.0, 10.0), now);
    // (1, 1): '!' -> index 1 -> "k1", which has no record.
    layer.pointer_click(px(70.0, 70.0), now);
    // (3, 0): ',' -> index 11, past the end of keys.
    layer.pointer_click(px(200.0, 10.0), now);

    let clicks = drain(&mut events);
    assert_eq!(names(&clicks), ["click", "click", "click"]);
    assert_eq!(ids(&clicks), [Some("1".to_string()), None, None]);

    let second = clicks[1].feature_event().unwrap();
    assert_eq!(second.tile_key.as_deref(), Some("0:0:0"));
    assert_eq!(second.cell_key.as_deref(), Some("0:0:0:33"));

    let first = clicks[0].feature_event().unwrap();
    assert_eq!(first.feature.as_ref().unwrap().value()["name"], "park");
}

/// Moving across two tiles produces deduplicated hover events and cursor
/// changes, and the feature index spans both tiles.
#[tokio::test]
async fn test_hover_across_tiles() {
    let http = FakeHttp::open();
    let left = TileCoord::new(0, 0, 1);
    let right = TileCoord::new(1, 0, 1);
    http.serve(&url_for(left), halves_payload("lake", "road"));
    http.serve(&url_for(right), halves_payload("road", "town"));

    let config = LayerConfig::default().with_mouse_interval(Duration::ZERO);
    let (mut layer, mut events) = make_layer(&http, 1, config);

    let mut handles = vec![layer.on_tile_created(left), layer.on_tile_created(right)];
    let (updates, results) = tokio::join!(
        pump(&mut layer),
        join_all(handles.iter_mut().map(|h| h.wait()))
    );
    assert_eq!(updates.len(), 2);
    assert!(results.iter().all(Result::is_ok));

    let now = Instant::now();
    for x in [10.0, 20.0, 30.0, 200.0, 210.0, 260.0, 400.0] {
        layer.pointer_move(px(x, 100.0), now);
    }

    let hover = drain(&mut events);
    assert_eq!(
        names(&hover),
        [
            "mouseover", // lake
            "mousemove",
            "mousemove",
            "mouseout", // lake
            "mouseover", // road (left tile)
            "mousemove",
            "mouseout", // road, other tile counts as a new cell
            "mouseover", // road (right tile)
            "mouseout",
            "mouseover", // town
        ]
    );
    assert_eq!(
        ids(&hover).last().cloned().flatten().as_deref(),
        Some("town")
    );

    assert_eq!(
        layer.host().cursors(),
        vec![
            Cursor::Pointer,
            Cursor::Default,
            Cursor::Pointer,
            Cursor::Default,
            Cursor::Pointer,
            Cursor::Default,
            Cursor::Pointer,
        ]
    );

    assert_eq!(
        layer.tiles_for_feature(&FeatureId::new("road")),
        vec!["0:0:1".to_string(), "1:0:1".to_string()]
    );
}

/// A tile evicted mid-flight and requested again is fetched fresh, and the
/// abandoned attempt's response never lands in the cache.
#[tokio::test]
async fn test_evict_and_refetch() {
    let http = FakeHttp::closed();
    let coord = TileCoord::new(0, 0, 0);
    http.serve(&url_for(coord), halves_payload("a", "b"));

    let (mut layer, mut events) = make_layer(&http, 0, LayerConfig::default());

    let first = layer.on_tile_created(coord);
    layer.on_tile_removed(coord);
    assert_eq!(first.status(), FetchStatus::Cancelled);

    let mut second = layer.on_tile_created(coord);
    assert_eq!(second.status(), FetchStatus::Pending);

    http.release(2);
    let updates = pump(&mut layer).await;
    second.wait().await.unwrap();

    let loaded = updates
        .iter()
        .filter(|u| matches!(u, CacheUpdate::Loaded { .. }))
        .count();
    let discarded = updates
        .iter()
        .filter(|u| matches!(u, CacheUpdate::Discarded { .. }))
        .count();
    assert_eq!((loaded, discarded), (1, 1));

    let stats = layer.cache().stats();
    assert_eq!(stats.fetches_started, 2);
    assert_eq!(stats.cancelled, 1);
    assert!(layer.cache().lookup(&coord).is_some());
    assert!(drain(&mut events).is_empty());
}

/// A failed fetch becomes an error event and is retried on next request.
#[tokio::test]
async fn test_fetch_error_then_retry() {
    let http = FakeHttp::open();
    let coord = TileCoord::new(2, 1, 2);
    let (mut layer, mut events) = make_layer(&http, 2, LayerConfig::default());

    let mut handle = layer.on_tile_created(coord);
    pump(&mut layer).await;
    assert!(matches!(
        handle.wait().await,
        Err(TileError::Fetch {
            source: ProviderError::Status { status: 404, .. },
            ..
        })
    ));

    let errors = drain(&mut events);
    assert_eq!(names(&errors), ["error"]);

    http.serve(&url_for(coord), halves_payload("a", "b"));
    let mut handle = layer.on_tile_created(coord);
    pump(&mut layer).await;
    handle.wait().await.unwrap();
    assert_eq!(http.requested().len(), 2);
    assert!(drain(&mut events).is_empty());
}

/// Changing the URL drops cached tiles and fetches from the new source.
#[tokio::test]
async fn test_set_url_switches_source() {
    let http = FakeHttp::open();
    let coord = TileCoord::new(0, 0, 0);
    http.serve(&url_for(coord), halves_payload("old", "old2"));
    http.serve(
        "https://other.example.com/0/0/0.json",
        halves_payload("new", "new2"),
    );

    let (mut layer, mut events) = make_layer(&http, 0, LayerConfig::default());
    layer.on_tile_created(coord);
    pump(&mut layer).await;
    layer.pointer_click(px(10.0, 10.0), Instant::now());

    layer
        .set_url("https://other.example.com/{z}/{x}/{y}.json")
        .unwrap();
    assert!(layer.cache().lookup(&coord).is_none());

    layer.on_tile_created(coord);
    pump(&mut layer).await;
    layer.pointer_click(px(10.0, 10.0), Instant::now());

    let clicks = drain(&mut events);
    assert_eq!(
        ids(&clicks),
        [Some("old".to_string()), Some("new".to_string())]
    );
    assert_eq!(
        http.requested().last().map(String::as_str),
        Some("https://other.example.com/0/0/0.json")
    );
}
