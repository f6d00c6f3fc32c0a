use std::fmt;

use serde::{Serialize, Serializer};

use crate::capability::StrategyId;
use crate::config::ArbitrationPolicy;
use crate::executor::Attempt;
use crate::format::MediaBlob;

/// Which result the arbitrator kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Strategy(StrategyId),
    Original,
}

impl Winner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Winner::Strategy(id) => id.as_str(),
            Winner::Original => "original",
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Winner {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Selection {
    pub winner: Winner,
    pub blob: MediaBlob,
}

/// Pick the smallest successful attempt, falling back to the original input
/// when nothing succeeded or the anti-regression guard rejects the winner.
///
/// `attempts` must be in candidate priority order: among equal sizes the
/// earliest wins. Durations are never consulted.
pub fn select(
    original: &MediaBlob,
    attempts: &[Attempt],
    quality: f32,
    policy: &ArbitrationPolicy,
) -> Selection {
    let keep_original = || Selection {
        winner: Winner::Original,
        blob: original.clone(),
    };

    // min_by_key keeps the first of equal minima
    let Some(best) = attempts
        .iter()
        .filter(|a| a.success)
        .min_by_key(|a| a.size())
    else {
        log::debug!("no strategy succeeded, keeping original");
        return keep_original();
    };

    let original_size = original.len() as f64;
    let size = best.size() as f64;

    if size >= original_size * policy.size_ratio_threshold && quality > policy.quality_threshold {
        log::debug!(
            "{} only reached {:.1}% of the original at quality {:.2}, keeping original",
            best.strategy,
            size / original_size * 100.0,
            quality
        );
        return keep_original();
    }

    if policy.reject_larger && best.size() > original.len() {
        log::debug!(
            "{} grew the input ({} -> {} bytes), keeping original",
            best.strategy,
            original.len(),
            best.size()
        );
        return keep_original();
    }

    Selection {
        winner: Winner::Strategy(best.strategy),
        blob: best.blob.clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::StrategyError;

    fn original(size: usize) -> MediaBlob {
        MediaBlob::new(vec![1u8; size], "image/jpeg")
    }

    fn ok(id: StrategyId, size: usize, millis: u64) -> Attempt {
        Attempt {
            strategy: id,
            blob: MediaBlob::new(vec![2u8; size], "image/jpeg"),
            success: true,
            error: None,
            duration: Duration::from_millis(millis),
        }
    }

    fn failed(id: StrategyId, original: &MediaBlob) -> Attempt {
        Attempt {
            strategy: id,
            blob: original.clone(),
            success: false,
            error: Some(StrategyError::Encode("boom".into())),
            duration: Duration::ZERO,
        }
    }

    #[test]
    fn picks_smallest_success() {
        let input = original(1000);
        let attempts = [
            ok(StrategyId::RasterOptimizer, 700, 1),
            ok(StrategyId::LossyReencode, 500, 900),
            failed(StrategyId::Rerasterize, &input),
        ];
        let s = select(&input, &attempts, 0.6, &ArbitrationPolicy::default());
        assert_eq!(s.winner, Winner::Strategy(StrategyId::LossyReencode));
        assert_eq!(s.blob.len(), 500);
    }

    #[test]
    fn ties_go_to_priority_order() {
        let input = original(1000);
        let attempts = [
            ok(StrategyId::RasterOptimizer, 600, 50),
            ok(StrategyId::LossyReencode, 600, 1),
        ];
        let s = select(&input, &attempts, 0.6, &ArbitrationPolicy::default());
        assert_eq!(s.winner, Winner::Strategy(StrategyId::RasterOptimizer));
    }

    #[test]
    fn total_failure_keeps_original() {
        let input = original(1000);
        let attempts = [
            failed(StrategyId::RasterOptimizer, &input),
            failed(StrategyId::Rerasterize, &input),
        ];
        let s = select(&input, &attempts, 0.6, &ArbitrationPolicy::default());
        assert_eq!(s.winner, Winner::Original);
        assert_eq!(s.winner.as_str(), "original");
        assert_eq!(s.blob, input);
    }

    #[test]
    fn guard_rejects_marginal_win_at_high_quality() {
        let input = original(1000);
        let attempts = [ok(StrategyId::RasterOptimizer, 990, 1)];
        let s = select(&input, &attempts, 0.99, &ArbitrationPolicy::default());
        assert_eq!(s.winner, Winner::Original);
        assert_eq!(s.blob, input);

        // same candidate is fine when fidelity was not requested
        let s = select(&input, &attempts, 0.85, &ArbitrationPolicy::default());
        assert_eq!(s.winner, Winner::Strategy(StrategyId::RasterOptimizer));
    }

    #[test]
    fn guard_boundary_is_inclusive() {
        let input = original(1000);
        let attempts = [ok(StrategyId::RasterOptimizer, 980, 1)];
        let s = select(&input, &attempts, 0.86, &ArbitrationPolicy::default());
        assert_eq!(s.winner, Winner::Original);

        let attempts = [ok(StrategyId::RasterOptimizer, 979, 1)];
        let s = select(&input, &attempts, 0.86, &ArbitrationPolicy::default());
        assert_eq!(s.winner, Winner::Strategy(StrategyId::RasterOptimizer));
    }

    #[test]
    fn guard_thresholds_are_configurable() {
        let input = original(1000);
        let attempts = [ok(StrategyId::RasterOptimizer, 950, 1)];
        let strict = ArbitrationPolicy {
            size_ratio_threshold: 0.9,
            quality_threshold: 0.5,
            ..ArbitrationPolicy::default()
        };
        assert_eq!(select(&input, &attempts, 0.6, &strict).winner, Winner::Original);
        assert_eq!(
            select(&input, &attempts, 0.6, &ArbitrationPolicy::default()).winner,
            Winner::Strategy(StrategyId::RasterOptimizer)
        );
    }

    #[test]
    fn larger_winner_is_kept_unless_rejected() {
        let input = original(1000);
        let attempts = [
            ok(StrategyId::RasterOptimizer, 1300, 1),
            ok(StrategyId::Rerasterize, 1200, 1),
        ];
        let s = select(&input, &attempts, 0.5, &ArbitrationPolicy::default());
        assert_eq!(s.winner, Winner::Strategy(StrategyId::Rerasterize));
        assert_eq!(s.blob.len(), 1200);

        let strict = ArbitrationPolicy {
            reject_larger: true,
            ..ArbitrationPolicy::default()
        };
        let s = select(&input, &attempts, 0.5, &strict);
        assert_eq!(s.winner, Winner::Original);
        assert_eq!(s.blob, input);
    }
}
