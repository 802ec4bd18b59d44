use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("top-level array is not a valid envelope")]
    ArrayEnvelope,
    #[error("expected a JSON object envelope, got {0}")]
    NotAnObject(&'static str),
}
