//! Image compression by arbitration: every strategy able to handle the input
//! runs concurrently and the smallest acceptable result wins, or the input
//! itself when nothing improves on it.

pub mod arbiter;
pub mod capability;
pub mod config;
pub mod convert;
pub mod error;
pub mod executor;
pub mod format;
pub mod geometry;
pub mod metadata;
pub mod pipeline;
pub mod quantize;
pub mod report;
pub mod strategy;

use std::str::FromStr;
use std::sync::OnceLock;

pub use arbiter::Winner;
pub use capability::StrategyId;
pub use config::{ArbitrationPolicy, CompressOptions, Mode, ResultKind};
pub use convert::Representation;
pub use error::{CompressError, Result, StrategyError};
pub use format::{MediaBlob, MediaCategory, NamedFile};
pub use pipeline::Compressor;
pub use report::{AttemptSummary, ComparisonReport, Outcome};

fn default_compressor() -> &'static Compressor {
    static COMPRESSOR: OnceLock<Compressor> = OnceLock::new();
    COMPRESSOR.get_or_init(Compressor::new)
}

/// Compress `input` with the built-in strategies.
pub async fn compress(input: impl Into<NamedFile>, options: &CompressOptions) -> Result<Outcome> {
    default_compressor().compress(input, options).await
}

/// Shorthand for `compress` with `{ quality, mode: keepSize, type }`.
pub async fn compress_with_quality(
    input: impl Into<NamedFile>,
    quality: f32,
    result_kind: &str,
) -> Result<Outcome> {
    let kind = ResultKind::from_str(result_kind)?;
    compress(input, &CompressOptions::legacy(quality, kind)).await
}
