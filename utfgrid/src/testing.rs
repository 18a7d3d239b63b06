//! Shared fixtures for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::coord::TileCoord;
use crate::provider::{BoxFuture, ProviderError, TileSource, UrlTemplate};

/// 64×64 payload whose every cell points at one feature tagged with `call`.
pub(crate) fn payload(call: usize) -> Vec<u8> {
    let row = " ".repeat(64);
    json!({
        "grid": vec![row; 64],
        "keys": ["k"],
        "data": { "k": { "id": "f", "call": call } }
    })
    .to_string()
    .into_bytes()
}

/// Tile source whose fetches block until the test releases them.
pub(crate) struct GatedSource {
    gate: Semaphore,
    calls: Mutex<HashMap<TileCoord, usize>>,
    total: AtomicUsize,
    honour_cancellation: AtomicBool,
    fail_first: AtomicUsize,
    panic_first: AtomicUsize,
    body: Mutex<Option<Vec<u8>>>,
    bodies: Mutex<HashMap<TileCoord, Vec<u8>>>,
    template: Mutex<Option<UrlTemplate>>,
}

impl GatedSource {
    fn with_permits(permits: usize) -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(permits),
            calls: Mutex::new(HashMap::new()),
            total: AtomicUsize::new(0),
            honour_cancellation: AtomicBool::new(true),
            fail_first: AtomicUsize::new(0),
            panic_first: AtomicUsize::new(0),
            body: Mutex::new(None),
            bodies: Mutex::new(HashMap::new()),
            template: Mutex::new(None),
        })
    }

    /// Fetches complete as soon as they run.
    pub(crate) fn open() -> Arc<Self> {
        Self::with_permits(Semaphore::MAX_PERMITS)
    }

    /// Fetches wait for [`GatedSource::release`].
    pub(crate) fn closed() -> Arc<Self> {
        Self::with_permits(0)
    }

    /// Answers even after the token is cancelled, like a response already
    /// on the wire.
    pub(crate) fn ignoring_cancellation(self: Arc<Self>) -> Arc<Self> {
        self.honour_cancellation.store(false, Ordering::SeqCst);
        self
    }

    /// Fails the first `n` fetches with an HTTP error.
    pub(crate) fn failing_first(self: Arc<Self>, n: usize) -> Arc<Self> {
        self.fail_first.store(n, Ordering::SeqCst);
        self
    }

    /// Panics inside the first `n` fetches.
    pub(crate) fn panicking_first(self: Arc<Self>, n: usize) -> Arc<Self> {
        self.panic_first.store(n, Ordering::SeqCst);
        self
    }

    /// Serves this body for every tile.
    pub(crate) fn with_body(self: Arc<Self>, body: Vec<u8>) -> Arc<Self> {
        *self.body.lock() = Some(body);
        self
    }

    /// Serves this body for one tile.
    pub(crate) fn with_tile(self: Arc<Self>, coord: TileCoord, body: Vec<u8>) -> Arc<Self> {
        self.bodies.lock().insert(coord, body);
        self
    }

    pub(crate) fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub(crate) fn calls(&self, coord: TileCoord) -> usize {
        self.calls.lock().get(&coord).copied().unwrap_or(0)
    }

    pub(crate) fn template(&self) -> Option<UrlTemplate> {
        self.template.lock().clone()
    }

    async fn pass_gate(&self) {
        if let Ok(permit) = self.gate.acquire().await {
            permit.forget();
        }
    }
}

impl TileSource for GatedSource {
    fn tile_url(&self, coord: TileCoord) -> String {
        format!("mock://{}", coord)
    }

    fn set_template(&self, template: UrlTemplate) {
        *self.template.lock() = Some(template);
    }

    fn fetch(
        &self,
        coord: TileCoord,
        cancellation: CancellationToken,
    ) -> BoxFuture<'_, Result<Vec<u8>, ProviderError>> {
        Box::pin(async move {
            *self.calls.lock().entry(coord).or_insert(0) += 1;
            let call = self.total.fetch_add(1, Ordering::SeqCst) + 1;

            if self.honour_cancellation.load(Ordering::SeqCst) {
                tokio::select! {
                    _ = cancellation.cancelled() => return Err(ProviderError::Cancelled),
                    _ = self.pass_gate() => {}
                }
            } else {
                self.pass_gate().await;
            }

            if call <= self.panic_first.load(Ordering::SeqCst) {
                panic!("scripted panic in fetch {}", call);
            }
            if call <= self.fail_first.load(Ordering::SeqCst) {
                return Err(ProviderError::HttpError("scripted failure".to_string()));
            }
            if let Some(body) = self.bodies.lock().get(&coord) {
                return Ok(body.clone());
            }
            if let Some(body) = self.body.lock().as_ref() {
                return Ok(body.clone());
            }
            Ok(payload(call))
        })
    }
}
