use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::arbiter::{Selection, Winner};
use crate::capability::StrategyId;
use crate::config::ResultKind;
use crate::convert::{convert, Representation};
use crate::executor::Attempt;
use crate::format::MediaBlob;

/// What `compress` hands back.
#[derive(Debug, Clone)]
pub enum Outcome {
    Single(Representation),
    Report(ComparisonReport),
}

impl Outcome {
    /// The winning result regardless of mode.
    pub fn best(&self) -> &Representation {
        match self {
            Outcome::Single(rep) => rep,
            Outcome::Report(report) => &report.best_result,
        }
    }

    pub fn into_best(self) -> Representation {
        match self {
            Outcome::Single(rep) => rep,
            Outcome::Report(report) => report.best_result,
        }
    }

    pub fn report(&self) -> Option<&ComparisonReport> {
        match self {
            Outcome::Single(_) => None,
            Outcome::Report(report) => Some(report),
        }
    }
}

/// Comparative telemetry across every attempt of one request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    #[serde(skip)]
    pub best_result: Representation,
    pub best_tool: Winner,
    pub all_results: Vec<AttemptSummary>,
    #[serde(serialize_with = "as_millis")]
    pub total_duration: Duration,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptSummary {
    pub tool: StrategyId,
    #[serde(skip)]
    pub result: Representation,
    pub original_size: usize,
    pub compressed_size: usize,
    /// Percent saved; negative when the output grew
    pub compression_ratio: f64,
    #[serde(serialize_with = "as_millis")]
    pub duration: Duration,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_nanos() as f64 / 1_000_000.0)
}

/// `(original - compressed) / original * 100`, zero for an empty original.
pub fn compression_ratio(original: usize, compressed: usize) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - compressed as f64) / original as f64 * 100.0
}

pub fn single(selection: &Selection, kind: ResultKind, file_name: &str) -> Outcome {
    Outcome::Single(convert(&selection.blob, kind, file_name))
}

pub fn comparison(
    original: &MediaBlob,
    attempts: &[Attempt],
    selection: &Selection,
    kind: ResultKind,
    file_name: &str,
    total_duration: Duration,
) -> Outcome {
    let all_results = attempts
        .iter()
        .map(|attempt| AttemptSummary {
            tool: attempt.strategy,
            result: convert(&attempt.blob, kind, file_name),
            original_size: original.len(),
            compressed_size: attempt.size(),
            compression_ratio: compression_ratio(original.len(), attempt.size()),
            duration: attempt.duration,
            success: attempt.success,
            error: attempt.error.as_ref().map(|e| e.to_string()),
        })
        .collect();

    Outcome::Report(ComparisonReport {
        best_result: convert(&selection.blob, kind, file_name),
        best_tool: selection.winner,
        all_results,
        total_duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StrategyError;

    #[test]
    fn ratio_formula() {
        assert!((compression_ratio(1000, 250) - 75.0).abs() < 0.01);
        assert!((compression_ratio(1000, 1100) + 10.0).abs() < 0.01);
        assert_eq!(compression_ratio(1000, 1000), 0.0);
        assert_eq!(compression_ratio(0, 10), 0.0);
    }

    #[test]
    fn report_covers_every_attempt() {
        let original = MediaBlob::new(vec![0u8; 200], "image/png");
        let attempts = vec![
            Attempt {
                strategy: StrategyId::RasterOptimizer,
                blob: MediaBlob::new(vec![0u8; 50], "image/png"),
                success: true,
                error: None,
                duration: Duration::from_millis(3),
            },
            Attempt {
                strategy: StrategyId::Rerasterize,
                blob: original.clone(),
                success: false,
                error: Some(StrategyError::Decode("bad".into())),
                duration: Duration::from_millis(1),
            },
        ];
        let selection = Selection {
            winner: Winner::Strategy(StrategyId::RasterOptimizer),
            blob: attempts[0].blob.clone(),
        };

        let outcome = comparison(
            &original,
            &attempts,
            &selection,
            ResultKind::ArrayBuffer,
            "in.png",
            Duration::from_millis(4),
        );
        let report = outcome.report().unwrap();
        assert_eq!(report.best_tool, Winner::Strategy(StrategyId::RasterOptimizer));
        assert_eq!(report.best_result.byte_len(), 50);
        assert_eq!(report.all_results.len(), 2);
        assert_eq!(report.all_results[0].compression_ratio, 75.0);
        assert_eq!(report.all_results[1].compression_ratio, 0.0);
        assert_eq!(report.all_results[1].result.byte_len(), 200);
        assert!(report.all_results[1].error.as_deref().unwrap().contains("bad"));

        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json["bestTool"], "raster-optimizer");
        assert_eq!(json["allResults"][1]["tool"], "rerasterize");
        assert_eq!(json["allResults"][1]["success"], false);
        assert!(json["allResults"][0].get("error").is_none());
        assert_eq!(json["totalDuration"], 4.0);
    }
}
