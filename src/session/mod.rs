//! Randomizer session.
//!
//! Owns everything that lives across rolls: the shared catalog, resolved
//! configuration, cohesion mode, the seeded RNG, the chosen scorer, the IDF
//! cache, attempt metrics and the current roll. One `roll()` runs the whole
//! pipeline: roll, enforce, record metrics, recommend, format, publish.

pub mod display;

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::config::{CohesionMode, RandomizerConfig};
use crate::enforcer::{AttemptMetrics, Enforcer};
use crate::error::Result;
use crate::events::{EpochRegistry, Publisher, SignatureWatcher, SubscriptionId};
use crate::logging::TimingSpan;
use crate::recommend::{recommend_gems, recommend_uniques, Recommendations};
use crate::roller::{BuildRoller, RollContext};
use crate::rules::Violation;
use crate::synergy::{make_scorer, IdfCache, Scorer};

pub use display::{balance_text, RollDisplay};

/// Everything one roll produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollResult {
    /// 1-based roll number within the session
    pub sequence: u64,
    pub mode: CohesionMode,
    pub context: RollContext,
    pub success: bool,
    pub attempts: u32,
    pub violations: Vec<Violation>,
    pub recommendations: Recommendations,
    pub display: RollDisplay,
}

impl RollResult {
    pub fn signature(&self) -> String {
        self.context.signature()
    }
}

pub struct Session {
    catalog: Arc<Catalog>,
    config: RandomizerConfig,
    mode: CohesionMode,
    rng: Xoshiro256PlusPlus,
    scorer: Box<dyn Scorer>,
    idf_cache: IdfCache,
    metrics: AttemptMetrics,
    current: Option<RollResult>,
    publisher: Publisher<RollResult>,
    epochs: EpochRegistry,
    sequence: u64,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("mode", &self.mode)
            .field("scorer", &self.scorer.kind())
            .field("metrics", &self.metrics)
            .field("sequence", &self.sequence)
            .finish()
    }
}

impl Session {
    /// Session with configuration resolved from the catalog's `Config` section
    pub fn new(catalog: Arc<Catalog>, seed: u64) -> Self {
        let config = RandomizerConfig::resolve(catalog.core.config.as_ref());
        Self::with_config(catalog, config, seed)
    }

    pub fn with_config(catalog: Arc<Catalog>, config: RandomizerConfig, seed: u64) -> Self {
        let scorer = make_scorer(config.synergy.scorer_kind());
        info!(scorer = ?scorer.kind(), seed, "session scorer selected");
        Self {
            catalog,
            config,
            mode: CohesionMode::default(),
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            scorer,
            idf_cache: IdfCache::new(),
            metrics: AttemptMetrics::default(),
            current: None,
            publisher: Publisher::new(),
            epochs: EpochRegistry::new(),
            sequence: 0,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &RandomizerConfig {
        &self.config
    }

    pub fn mode(&self) -> CohesionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: CohesionMode) {
        self.mode = mode;
    }

    pub fn metrics(&self) -> &AttemptMetrics {
        &self.metrics
    }

    pub fn current(&self) -> Option<&RollResult> {
        self.current.as_ref()
    }

    pub fn idf_builds(&self) -> usize {
        self.idf_cache.builds()
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&RollResult) + 'static,
    {
        self.publisher.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.publisher.unsubscribe(id)
    }

    /// New signature watcher; any watcher handed out earlier goes stale
    pub fn watcher(&self) -> SignatureWatcher {
        SignatureWatcher::new(self.epochs.install())
    }

    /// Roll, enforce, recommend and publish a new build
    pub fn roll(&mut self) -> Result<&RollResult> {
        let _timing = TimingSpan::new("roll");
        let threshold = self.mode.threshold();
        let roller = BuildRoller::new(&self.catalog.core, &self.config);
        let initial = roller.roll(threshold, &mut self.rng)?;
        let outcome =
            Enforcer::from_config(&self.config.rules).enforce(&roller, initial, threshold, &mut self.rng)?;
        self.metrics.record(outcome.attempts);

        let recommendations = self.recommend(&outcome.context);
        self.sequence += 1;
        debug!(
            sequence = self.sequence,
            class = %outcome.context.class,
            weapon = %outcome.context.weapon_line(),
            success = outcome.success,
            attempts = outcome.attempts,
            "roll complete"
        );
        let result = RollResult {
            sequence: self.sequence,
            mode: self.mode,
            display: RollDisplay::from_context(&outcome.context),
            context: outcome.context,
            success: outcome.success,
            attempts: outcome.attempts,
            violations: outcome.violations,
            recommendations,
        };
        self.publisher.publish(&result);
        Ok(self.current.insert(result))
    }

    /// Re-score the current roll, e.g. after a mode change, without
    /// re-rolling. Returns `None` before the first roll.
    pub fn refresh_recommendations(&mut self) -> Option<&Recommendations> {
        let context = self.current.as_ref()?.context.clone();
        let recommendations = self.recommend(&context);
        let current = self.current.as_mut()?;
        current.mode = self.mode;
        current.recommendations = recommendations;
        Some(&current.recommendations)
    }

    fn recommend(&mut self, context: &RollContext) -> Recommendations {
        let gems = recommend_gems(
            &self.catalog.gems,
            context,
            &self.config.synergy,
            self.mode,
            self.scorer.as_ref(),
            &mut self.idf_cache,
            &mut self.rng,
        );
        let uniques = recommend_uniques(&self.catalog.uniques, context);
        Recommendations { gems, uniques }
    }
}
