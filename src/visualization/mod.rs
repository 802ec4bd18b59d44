//! Lazy visualization loading and chart rendering seams.

pub mod engine;
pub mod loader;

pub use engine::{
    ChartEngine, EngineError, EngineLoader, RenderOptions, RenderedChart, VisualizationHandle,
};
pub use loader::LazyVisualization;
