//! Lazy, process-wide acquisition of the visualization engine.
//!
//! The charting engine is heavyweight, so nothing is loaded until the
//! first chart asks for it. Concurrent first callers share one in-flight
//! acquisition; the resolved handle is cached for the process lifetime. A
//! failed acquisition is cached as `EngineUnavailable` and only re-armed
//! by an explicit user-triggered reset, never automatically.

use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tracing::{info, warn};

use crate::viewmodel::ChartSeries;

use super::engine::{ChartEngine, EngineError, EngineLoader, RenderedChart, VisualizationHandle};

type LoadFuture = Shared<BoxFuture<'static, Result<VisualizationHandle, EngineError>>>;

enum EngineSlot {
    Idle,
    Loading(LoadFuture),
    Ready(VisualizationHandle),
    Failed(EngineError),
}

/// Single-assignment, lazily-initialized holder of the shared engine
/// handle.
pub struct LazyVisualization {
    loader: Arc<dyn EngineLoader>,
    slot: Mutex<EngineSlot>,
}

impl LazyVisualization {
    pub fn new(loader: Arc<dyn EngineLoader>) -> Self {
        Self {
            loader,
            slot: Mutex::new(EngineSlot::Idle),
        }
    }

    /// Resolve the engine handle, driving the one-time acquisition if this
    /// is the first request. Callers arriving while the acquisition is in
    /// flight await the same shared future.
    pub async fn get_renderer(&self) -> Result<VisualizationHandle, EngineError> {
        let load = {
            let mut slot = self.slot.lock().unwrap();
            match &*slot {
                EngineSlot::Ready(handle) => return Ok(handle.clone()),
                EngineSlot::Failed(err) => return Err(err.clone()),
                EngineSlot::Loading(load) => load.clone(),
                EngineSlot::Idle => {
                    let loader = Arc::clone(&self.loader);
                    let load: LoadFuture = async move { loader.load().await }.boxed().shared();
                    *slot = EngineSlot::Loading(load.clone());
                    load
                }
            }
        };

        let result = load.await;

        let mut slot = self.slot.lock().unwrap();
        if matches!(&*slot, EngineSlot::Loading(_)) {
            match &result {
                Ok(handle) => {
                    info!("visualization engine resolved and cached for the session");
                    *slot = EngineSlot::Ready(handle.clone());
                }
                Err(err) => {
                    warn!(error = %err, "visualization engine acquisition failed; manual retry required");
                    *slot = EngineSlot::Failed(err.clone());
                }
            }
        }
        result
    }

    /// Render one chart through the shared engine.
    ///
    /// An absent or structurally invalid series (label/value length
    /// mismatch, or no datasets at all) renders the empty placeholder and
    /// does not touch the engine.
    pub async fn render_chart(&self, series: &ChartSeries) -> Result<RenderedChart, EngineError> {
        if series.series.is_empty() || !series.is_valid() {
            return Ok(RenderedChart::Empty);
        }
        let handle = self.get_renderer().await?;
        Ok(handle.render(series))
    }

    /// True once the engine resolved successfully.
    pub fn is_ready(&self) -> bool {
        matches!(&*self.slot.lock().unwrap(), EngineSlot::Ready(_))
    }

    /// True while a failed acquisition is cached.
    pub fn has_failed(&self) -> bool {
        matches!(&*self.slot.lock().unwrap(), EngineSlot::Failed(_))
    }

    /// User-triggered re-arm after a failed acquisition. A resolved engine
    /// is never torn down, so this only clears the failure cache.
    pub fn reset(&self) {
        let mut slot = self.slot.lock().unwrap();
        if matches!(&*slot, EngineSlot::Failed(_)) {
            info!("re-arming visualization engine acquisition after manual retry");
            *slot = EngineSlot::Idle;
        }
    }
}
