//! Validation error types

/// Validation error type
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid projection: {0} (must be > 0)")]
    InvalidProjection(usize),

    #[error("Encodings list cannot be empty")]
    EmptyEncodings,

    #[error("Brain data field name cannot be empty")]
    EmptyBrainField,

    #[error("Comparison needs at least two models, got {0}")]
    TooFewModels(usize),

    #[error("Comparison pair names unknown model: {0}")]
    UnknownPairModel(String),

    #[error("Comparison pair compares a model with itself: {0}")]
    SelfComparison(String),

    #[error("Prediction file template has no '{{}}' placeholder: {0}")]
    TemplateMissingPlaceholder(String),

    #[error("Checkpoint step list cannot be empty")]
    EmptyCheckpointSteps,
}
