//! Seed sweeps for tuning rules and scorers.
//!
//! Each run is an independent session seeded from `Sha3_256(base_seed ‖ i)`,
//! so a sweep is reproducible and runs in parallel with rayon.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::catalog::Catalog;
use crate::config::{CohesionMode, RandomizerConfig};
use crate::error::Result;
use crate::session::Session;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    pub run_count: u64,
    pub base_seed: u64,
    /// Rolls per session
    pub rolls_per_run: u32,
    pub mode: CohesionMode,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            run_count: 100,
            base_seed: 42,
            rolls_per_run: 1,
            mode: CohesionMode::Cohesive,
        }
    }
}

/// Seed for run `index` of a sweep
pub fn derive_seed(base_seed: u64, index: u64) -> u64 {
    let mut hasher = Sha3_256::new();
    hasher.update(base_seed.to_le_bytes());
    hasher.update(index.to_le_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepReport {
    pub runs: u64,
    pub rolls: u64,
    pub success_rate: f64,
    pub mean_attempts: f64,
    pub max_attempts: u32,
    /// Violation message → rolls that ended with it
    pub violation_counts: BTreeMap<String, u64>,
    pub class_counts: BTreeMap<String, u64>,
    pub weapon_counts: BTreeMap<String, u64>,
}

#[derive(Debug, Clone)]
struct RollSample {
    success: bool,
    attempts: u32,
    violations: Vec<String>,
    class: String,
    weapon: String,
}

fn run_session(
    catalog: &Arc<Catalog>,
    config: &RandomizerConfig,
    sweep: &SweepConfig,
    seed: u64,
) -> Result<Vec<RollSample>> {
    let mut session = Session::with_config(Arc::clone(catalog), config.clone(), seed);
    session.set_mode(sweep.mode);
    let mut samples = Vec::with_capacity(sweep.rolls_per_run as usize);
    for _ in 0..sweep.rolls_per_run {
        let result = session.roll()?;
        samples.push(RollSample {
            success: result.success,
            attempts: result.attempts,
            violations: result.violations.iter().map(|v| v.message().to_string()).collect(),
            class: result.context.class.clone(),
            weapon: result.context.weapon.name.clone(),
        });
    }
    Ok(samples)
}

/// Run `sweep.run_count` seeded sessions in parallel and summarize them
pub fn seed_sweep(
    catalog: &Arc<Catalog>,
    config: &RandomizerConfig,
    sweep: &SweepConfig,
) -> Result<SweepReport> {
    let seeds: Vec<u64> = (0..sweep.run_count)
        .map(|i| derive_seed(sweep.base_seed, i))
        .collect();

    let runs: Vec<Vec<RollSample>> = seeds
        .par_iter()
        .map(|seed| run_session(catalog, config, sweep, *seed))
        .collect::<Result<_>>()?;

    let report = analyze(&runs);
    info!(
        runs = report.runs,
        success_rate = report.success_rate,
        mean_attempts = report.mean_attempts,
        "seed sweep complete"
    );
    Ok(report)
}

fn analyze(runs: &[Vec<RollSample>]) -> SweepReport {
    let samples: Vec<&RollSample> = runs.iter().flatten().collect();
    if samples.is_empty() {
        return SweepReport {
            runs: runs.len() as u64,
            ..SweepReport::default()
        };
    }
    let mut report = SweepReport {
        runs: runs.len() as u64,
        rolls: samples.len() as u64,
        ..SweepReport::default()
    };
    let successes = samples.iter().filter(|s| s.success).count();
    report.success_rate = successes as f64 / samples.len() as f64;
    report.mean_attempts =
        samples.iter().map(|s| s.attempts as f64).sum::<f64>() / samples.len() as f64;
    report.max_attempts = samples.iter().map(|s| s.attempts).max().unwrap_or(0);
    for sample in &samples {
        for message in &sample.violations {
            *report.violation_counts.entry(message.clone()).or_insert(0) += 1;
        }
        *report.class_counts.entry(sample.class.clone()).or_insert(0) += 1;
        *report.weapon_counts.entry(sample.weapon.clone()).or_insert(0) += 1;
    }
    report
}

/// First gem pick of both scorers for one seed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScorerAgreement {
    pub seed: u64,
    pub baseline: Option<String>,
    pub enhanced: Option<String>,
    pub agree: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScorerComparison {
    pub seeds: Vec<ScorerAgreement>,
    pub agreement_rate: f64,
}

fn first_gem(
    catalog: &Arc<Catalog>,
    config: &RandomizerConfig,
    mode: CohesionMode,
    seed: u64,
) -> Result<Option<String>> {
    let mut session = Session::with_config(Arc::clone(catalog), config.clone(), seed);
    session.set_mode(mode);
    let result = session.roll()?;
    Ok(result.recommendations.gems.first().map(|g| g.name.clone()))
}

/// Roll the same seeds under the baseline and the enhanced scorer and
/// compare their top gem. Rolls are identical per seed since scoring draws
/// from the RNG only after enforcement.
pub fn compare_scorers(
    catalog: &Arc<Catalog>,
    config: &RandomizerConfig,
    sweep: &SweepConfig,
) -> Result<ScorerComparison> {
    let mut baseline = config.clone();
    baseline.synergy.use_new_scorer = false;
    let mut enhanced = config.clone();
    enhanced.synergy.use_new_scorer = true;

    let seeds: Vec<ScorerAgreement> = (0..sweep.run_count)
        .into_par_iter()
        .map(|i| {
            let seed = derive_seed(sweep.base_seed, i);
            let b = first_gem(catalog, &baseline, sweep.mode, seed)?;
            let e = first_gem(catalog, &enhanced, sweep.mode, seed)?;
            Ok(ScorerAgreement {
                seed,
                agree: b == e,
                baseline: b,
                enhanced: e,
            })
        })
        .collect::<Result<_>>()?;

    let agreement_rate = if seeds.is_empty() {
        0.0
    } else {
        seeds.iter().filter(|s| s.agree).count() as f64 / seeds.len() as f64
    };
    Ok(ScorerComparison {
        seeds,
        agreement_rate,
    })
}
