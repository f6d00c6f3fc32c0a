use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::arbiter;
use crate::capability::{self, StrategyId};
use crate::config::{ArbitrationPolicy, CompressOptions, Constraints};
use crate::error::Result;
use crate::executor;
use crate::format::NamedFile;
use crate::report::{self, Outcome};
use crate::strategy::gif::GifOptimizer;
use crate::strategy::lossy::LossyReencode;
use crate::strategy::raster::RasterOptimizer;
use crate::strategy::reraster::Rerasterize;
use crate::strategy::Strategy;

/// Registry of strategy adapters plus the arbitration policy applied to
/// their results.
#[derive(Clone)]
pub struct Compressor {
    strategies: HashMap<StrategyId, Arc<dyn Strategy>>,
    policy: ArbitrationPolicy,
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compressor {
    /// A compressor with the four built-in strategies registered.
    pub fn new() -> Self {
        let mut compressor = Self::empty();
        compressor.register(Arc::new(RasterOptimizer));
        compressor.register(Arc::new(LossyReencode));
        compressor.register(Arc::new(GifOptimizer));
        compressor.register(Arc::new(Rerasterize));
        compressor
    }

    /// A compressor with no adapters; every candidate fails until registered.
    pub fn empty() -> Self {
        Self {
            strategies: HashMap::new(),
            policy: ArbitrationPolicy::default(),
        }
    }

    /// Register an adapter, replacing any previous one with the same id.
    pub fn register(&mut self, strategy: Arc<dyn Strategy>) {
        self.strategies.insert(strategy.id(), strategy);
    }

    pub fn with_policy(mut self, policy: ArbitrationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &ArbitrationPolicy {
        &self.policy
    }

    /// Compress one input by racing every eligible strategy against it.
    pub async fn compress(&self, input: impl Into<NamedFile>, options: &CompressOptions) -> Result<Outcome> {
        let started = Instant::now();
        let NamedFile { name, blob: input } = input.into();
        let constraints = Constraints::from_options(options);

        let category = input.category();
        let eligible = capability::eligible(category, constraints.preserve_exif)?;
        log::debug!(
            "{}: {} bytes of {} ({}), candidates: {:?}",
            name,
            input.len(),
            input.media_type,
            category,
            eligible
        );

        let dispatch = eligible
            .iter()
            .map(|id| (*id, self.strategies.get(id).cloned()))
            .collect();
        let attempts = executor::run_all(dispatch, &input, constraints).await;
        debug_assert_eq!(attempts.len(), eligible.len());

        let selection = arbiter::select(&input, &attempts, constraints.quality, &self.policy);
        log::debug!(
            "{}: selected {} ({} -> {} bytes)",
            name,
            selection.winner,
            input.len(),
            selection.blob.len()
        );

        let outcome = if options.return_all_results {
            report::comparison(
                &input,
                &attempts,
                &selection,
                options.result_kind,
                &name,
                started.elapsed(),
            )
        } else {
            report::single(&selection, options.result_kind, &name)
        };
        Ok(outcome)
    }
}
