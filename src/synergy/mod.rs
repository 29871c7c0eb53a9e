//! Synergy scoring.
//!
//! A roll is turned into a weighted `TagProfile`; each candidate gem is
//! scored against it by a `Scorer`. Raw overlap scores are then mapped to a
//! 0..=100 percentage relative to the whole candidate set with a log
//! transform, so that the top of the list does not all clip to 100.

pub mod idf;
pub mod profile;
pub mod scorer;

pub use idf::{corpus_fingerprint, IdfCache, IdfTable};
pub use profile::TagProfile;
pub use scorer::{make_scorer, BaselineScorer, EnhancedScorer, Scorer, ScoringContext, SynergyScore};

use crate::constants::{SYNERGY_EPSILON, SYNERGY_MAX_SHARE, SYNERGY_QUANTILE};

/// Value at `floor((n - 1) * q)` of the sorted finite values; 0 when empty
pub fn quantile(values: &[f64], q: f64) -> f64 {
    let mut xs: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if xs.is_empty() {
        return 0.0;
    }
    xs.sort_by(f64::total_cmp);
    let idx = ((xs.len() - 1) as f64 * q.clamp(0.0, 1.0)).floor() as usize;
    xs[idx.min(xs.len() - 1)]
}

/// Percentage of `raw` against the raw scores of the whole candidate set:
/// `round(100 * min(1, ln(1 + raw) / ln(1 + denom)))` with
/// `denom = max(p95, 0.9 * max, ε)`. Zero for an empty set or `raw <= 0`.
pub fn normalize_synergy(raw: f64, population: &[f64]) -> u32 {
    if population.is_empty() {
        return 0;
    }
    let max = population
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    let p95 = quantile(population, SYNERGY_QUANTILE);
    let denom = p95.max(max * SYNERGY_MAX_SHARE).max(SYNERGY_EPSILON);
    let numerator = raw.max(0.0).ln_1p();
    let ratio = (numerator / denom.ln_1p()).min(1.0);
    (100.0 * ratio).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile() {
        assert_eq!(quantile(&[], 0.95), 0.0);
        assert_eq!(quantile(&[3.0, 1.0, 2.0], 0.5), 2.0);
        // floor((20 - 1) * 0.95) = 18
        let values: Vec<f64> = (0..20).map(f64::from).collect();
        assert_eq!(quantile(&values, 0.95), 18.0);
        assert_eq!(quantile(&[f64::NAN, 4.0], 1.0), 4.0);
    }

    #[test]
    fn test_normalize_zero_and_empty() {
        assert_eq!(normalize_synergy(0.0, &[0.5, 1.0, 2.0]), 0);
        assert_eq!(normalize_synergy(1.0, &[]), 0);
        assert_eq!(normalize_synergy(-3.0, &[1.0]), 0);
    }

    #[test]
    fn test_normalize_top_clips_to_hundred() {
        let population = [0.2, 0.5, 1.0, 2.0];
        assert_eq!(normalize_synergy(2.0, &population), 100);
        let mid = normalize_synergy(0.5, &population);
        assert!(mid > 0 && mid < 100);
    }

    #[test]
    fn test_normalize_all_zero_population() {
        // denominator floors at epsilon, any positive raw saturates
        assert_eq!(normalize_synergy(0.0, &[0.0, 0.0]), 0);
        assert_eq!(normalize_synergy(1.0, &[0.0, 0.0]), 100);
    }
}
