//! Dashboard aggregation and resilience core.
//!
//! Aggregates data from several independent, unreliable upstream services
//! and produces per-section view-models for a multi-section dashboard
//! that must never show a blank page:
//!
//! - [`envelope`] normalizes inconsistent response envelopes and
//!   key-casing conventions into one canonical record.
//! - [`viewmodel`] assembles typed per-section view-models (stat cards,
//!   tables, chart series).
//! - [`compartment`] contains a rendering failure to one section.
//! - [`scheduler`] governs fetching, retrying with bounded backoff, and
//!   steady re-polling per section.
//! - [`visualization`] defers loading of the charting engine until the
//!   first chart asks for it, then shares the handle process-wide.
//! - [`section`] ties it together behind `Dashboard::register_section`.

pub mod compartment;
pub mod config;
pub mod envelope;
pub mod errors;
pub mod logging;
pub mod scheduler;
pub mod section;
pub mod viewmodel;
pub mod visualization;

pub use compartment::{FailureState, FaultCompartment, SectionPhase};
pub use config::DashboardConfig;
pub use envelope::{normalize, NormalizedRecord};
pub use errors::{AggregationError, ErrorKind, UpstreamError};
pub use scheduler::{BackoffCurve, PollPolicy, PollScheduler};
pub use section::{fetcher_fn, Dashboard, SectionFetcher, SectionHandle, SectionStats};
pub use viewmodel::{assemble, ChartKind, ChartSeries, SectionKind, SectionViewModel};
pub use visualization::{
    ChartEngine, EngineError, EngineLoader, LazyVisualization, RenderOptions, RenderedChart,
    VisualizationHandle,
};
