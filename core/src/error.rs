use thiserror::Error;

use crate::format::MediaCategory;

pub type Result<T> = std::result::Result<T, CompressError>;

/// Errors surfaced to the caller of `compress`.
#[derive(Debug, Error)]
pub enum CompressError {
    #[error("no eligible strategy for {category} input with the requested constraints")]
    NoEligibleStrategy { category: MediaCategory },

    #[error("unsupported result type: {0}")]
    UnsupportedRepresentation(String),

    #[error("invalid options: {0}")]
    InvalidOptions(#[from] serde_json::Error),
}

/// Failure of a single strategy. Always absorbed into a failed attempt.
#[derive(Debug, Clone, Error)]
pub enum StrategyError {
    #[error("unsupported input: {0}")]
    Unsupported(String),

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("quantization failed: {0}")]
    Quantize(String),

    #[error("encoding failed: {0}")]
    Encode(String),

    #[error("optimization failed: {0}")]
    Optimize(String),

    #[error("strategy panicked: {0}")]
    Panicked(String),
}
