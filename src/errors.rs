use serde::Serialize;
use thiserror::Error;

use crate::envelope::errors::EnvelopeError;
use crate::visualization::EngineError;

/// Error taxonomy for the aggregation core.
///
/// Every failure surfaced to a dashboard section maps to exactly one of
/// these kinds, which drives the section-level fallback UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Payload could not be normalized meaningfully; recovered locally.
    MalformedEnvelope,
    /// Transport-level failure or an envelope that declared failure.
    UpstreamFailure,
    /// Visualization engine failed to load; manual retry only.
    EngineUnavailable,
    /// Exception raised while assembling or rendering section content.
    RenderFault,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MalformedEnvelope => "malformed_envelope",
            ErrorKind::UpstreamFailure => "upstream_failure",
            ErrorKind::EngineUnavailable => "engine_unavailable",
            ErrorKind::RenderFault => "render_fault",
        }
    }
}

/// Failure reported by an upstream fetch.
#[derive(Error, Debug, Clone)]
pub enum UpstreamError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("upstream declared failure: {0}")]
    Declared(String),
}

/// Unified error type composing the per-module error enums.
#[derive(Error, Debug, Clone)]
pub enum AggregationError {
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("render fault in section '{section}': {message}")]
    Render { section: String, message: String },
}

impl AggregationError {
    /// Collapse the concrete error into its taxonomy kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AggregationError::Envelope(_) => ErrorKind::MalformedEnvelope,
            AggregationError::Upstream(_) => ErrorKind::UpstreamFailure,
            AggregationError::Engine(_) => ErrorKind::EngineUnavailable,
            AggregationError::Render { .. } => ErrorKind::RenderFault,
        }
    }
}
