//! Seams to the lazily-loaded charting engine.
//!
//! The engine itself is an external collaborator: this module only defines
//! the contract the loader resolves (one entry point per chart kind plus a
//! configuration object) and the handle shared by every section.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::viewmodel::{ChartKind, ChartSeries};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("visualization engine unavailable: {0}")]
    EngineUnavailable(String),
}

/// Render configuration resolved alongside the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub palette: Vec<String>,
    pub animate: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 640,
            height: 320,
            palette: vec![
                "#4e79a7".to_string(),
                "#f28e2b".to_string(),
                "#e15759".to_string(),
                "#76b7b2".to_string(),
            ],
            animate: false,
        }
    }
}

/// Output of one chart render pass.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedChart {
    /// Nothing to draw (absent or structurally invalid series).
    Empty,
    Chart { kind: ChartKind, body: String },
}

impl RenderedChart {
    pub fn is_empty(&self) -> bool {
        matches!(self, RenderedChart::Empty)
    }
}

/// One entry point per chart kind, accepting the canonical series and the
/// resolved configuration.
pub trait ChartEngine: Send + Sync {
    fn render_bar(&self, chart: &ChartSeries, options: &RenderOptions) -> RenderedChart;
    fn render_line(&self, chart: &ChartSeries, options: &RenderOptions) -> RenderedChart;
    fn render_pie(&self, chart: &ChartSeries, options: &RenderOptions) -> RenderedChart;
    fn render_doughnut(&self, chart: &ChartSeries, options: &RenderOptions) -> RenderedChart;
}

/// Process-wide handle to the resolved engine; acquire once, reuse forever.
#[derive(Clone)]
pub struct VisualizationHandle {
    pub engine: Arc<dyn ChartEngine>,
    pub options: RenderOptions,
}

impl VisualizationHandle {
    /// Dispatch to the entry point matching the series kind.
    pub fn render(&self, chart: &ChartSeries) -> RenderedChart {
        match chart.kind {
            ChartKind::Bar => self.engine.render_bar(chart, &self.options),
            ChartKind::Line => self.engine.render_line(chart, &self.options),
            ChartKind::Pie => self.engine.render_pie(chart, &self.options),
            ChartKind::Doughnut => self.engine.render_doughnut(chart, &self.options),
        }
    }
}

/// Asynchronous one-time acquisition of the charting engine and its
/// configuration module.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngineLoader: Send + Sync {
    async fn load(&self) -> Result<VisualizationHandle, EngineError>;
}
