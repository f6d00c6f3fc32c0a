//! Fan-out/fan-in over the eligible strategies.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;

use crate::capability::StrategyId;
use crate::config::Constraints;
use crate::error::StrategyError;
use crate::format::MediaBlob;
use crate::strategy::Strategy;

/// Outcome of one strategy against one request.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub strategy: StrategyId,
    /// The strategy's output, or the original input when it failed.
    pub blob: MediaBlob,
    pub success: bool,
    pub error: Option<StrategyError>,
    pub duration: Duration,
}

impl Attempt {
    pub fn size(&self) -> usize {
        self.blob.len()
    }

    fn finished(
        strategy: StrategyId,
        input: &MediaBlob,
        result: Result<MediaBlob, StrategyError>,
        duration: Duration,
    ) -> Self {
        match result {
            Ok(blob) => Attempt {
                strategy,
                blob,
                success: true,
                error: None,
                duration,
            },
            Err(error) => Attempt {
                strategy,
                blob: input.clone(),
                success: false,
                error: Some(error),
                duration,
            },
        }
    }
}

/// Run every strategy concurrently and wait for all of them.
///
/// Returns exactly one attempt per entry of `strategies`, in the same order.
/// `None` entries (no adapter registered) become failed attempts.
pub async fn run_all(
    strategies: Vec<(StrategyId, Option<Arc<dyn Strategy>>)>,
    input: &MediaBlob,
    constraints: Constraints,
) -> Vec<Attempt> {
    let tasks = strategies.into_iter().map(|(id, strategy)| {
        let input = input.clone();
        async move {
            let started = Instant::now();
            let Some(strategy) = strategy else {
                let error = StrategyError::Unsupported(format!("no adapter registered for {id}"));
                return Attempt::finished(id, &input, Err(error), started.elapsed());
            };

            let task_input = input.clone();
            let handle = tokio::task::spawn_blocking(move || {
                let started = Instant::now();
                let result = strategy.attempt(&task_input, &constraints);
                (result, started.elapsed())
            });

            let attempt = match handle.await {
                Ok((result, duration)) => Attempt::finished(id, &input, result, duration),
                Err(join_error) => {
                    let error = StrategyError::Panicked(join_error.to_string());
                    Attempt::finished(id, &input, Err(error), started.elapsed())
                }
            };

            match &attempt.error {
                None => log::debug!(
                    "{} finished in {:?}: {} -> {} bytes",
                    id,
                    attempt.duration,
                    input.len(),
                    attempt.size()
                ),
                Some(error) => log::warn!("{} failed after {:?}: {}", id, attempt.duration, error),
            }
            attempt
        }
    });

    join_all(tasks).await
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(StrategyId, usize);

    impl Strategy for Fixed {
        fn id(&self) -> StrategyId {
            self.0
        }
        fn attempt(&self, _: &MediaBlob, _: &Constraints) -> Result<MediaBlob, StrategyError> {
            Ok(MediaBlob::new(vec![0u8; self.1], "image/png"))
        }
    }

    struct Exploding;

    impl Strategy for Exploding {
        fn id(&self) -> StrategyId {
            StrategyId::Rerasterize
        }
        fn attempt(&self, _: &MediaBlob, _: &Constraints) -> Result<MediaBlob, StrategyError> {
            panic!("encoder blew up")
        }
    }

    #[tokio::test]
    async fn one_attempt_per_strategy_in_order() {
        let input = MediaBlob::new(vec![7u8; 100], "image/png");
        let attempts = run_all(
            vec![
                (StrategyId::RasterOptimizer, Some(Arc::new(Fixed(StrategyId::RasterOptimizer, 40)) as Arc<dyn Strategy>)),
                (StrategyId::Rerasterize, Some(Arc::new(Exploding) as Arc<dyn Strategy>)),
                (StrategyId::LossyReencode, None),
            ],
            &input,
            Constraints::default(),
        )
        .await;

        assert_eq!(attempts.len(), 3);
        assert_eq!(attempts[0].strategy, StrategyId::RasterOptimizer);
        assert!(attempts[0].success);
        assert_eq!(attempts[0].size(), 40);

        assert_eq!(attempts[1].strategy, StrategyId::Rerasterize);
        assert!(!attempts[1].success);
        assert!(matches!(attempts[1].error, Some(StrategyError::Panicked(_))));
        assert_eq!(attempts[1].blob, input);

        assert!(!attempts[2].success);
        assert!(matches!(attempts[2].error, Some(StrategyError::Unsupported(_))));
    }
}
