use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use dash_aggregator::{
    ChartEngine, ChartSeries, EngineError, EngineLoader, RenderOptions, RenderedChart,
    VisualizationHandle,
};

/// Scenario A envelope: a healthy stats payload behind a data wrapper.
pub fn stats_envelope() -> Value {
    json!({"success": true, "data": {"totalStudents": 42}})
}

/// Scenario B envelope: an upstream that declared failure (PascalCase).
pub fn declared_failure_envelope() -> Value {
    json!({"Success": false, "Errors": ["DB timeout"]})
}

/// Scenario C envelope: a single chart payload.
pub fn chart_envelope() -> Value {
    json!({
        "type": "Bar",
        "labels": ["Jan", "Feb"],
        "datasets": [{"label": "Rev", "data": [10, 20]}]
    })
}

/// Chart engine stub that records which entry point ran.
pub struct RecordingEngine;

impl RecordingEngine {
    fn rendered(kind: &str, chart: &ChartSeries) -> RenderedChart {
        RenderedChart::Chart {
            kind: chart.kind,
            body: format!("{}:{} labels", kind, chart.labels.len()),
        }
    }
}

impl ChartEngine for RecordingEngine {
    fn render_bar(&self, chart: &ChartSeries, _: &RenderOptions) -> RenderedChart {
        Self::rendered("bar", chart)
    }
    fn render_line(&self, chart: &ChartSeries, _: &RenderOptions) -> RenderedChart {
        Self::rendered("line", chart)
    }
    fn render_pie(&self, chart: &ChartSeries, _: &RenderOptions) -> RenderedChart {
        Self::rendered("pie", chart)
    }
    fn render_doughnut(&self, chart: &ChartSeries, _: &RenderOptions) -> RenderedChart {
        Self::rendered("doughnut", chart)
    }
}

/// Engine loader stub counting underlying acquisitions.
pub struct CountingLoader {
    pub calls: Arc<AtomicUsize>,
    pub fail: bool,
}

impl CountingLoader {
    pub fn succeeding() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                calls: Arc::clone(&calls),
                fail: false,
            },
            calls,
        )
    }

    pub fn failing() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                calls: Arc::clone(&calls),
                fail: true,
            },
            calls,
        )
    }
}

#[async_trait]
impl EngineLoader for CountingLoader {
    async fn load(&self) -> Result<VisualizationHandle, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Model the one-time module resolution latency.
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
        if self.fail {
            Err(EngineError::EngineUnavailable("cdn offline".to_string()))
        } else {
            Ok(VisualizationHandle {
                engine: Arc::new(RecordingEngine),
                options: RenderOptions::default(),
            })
        }
    }
}
