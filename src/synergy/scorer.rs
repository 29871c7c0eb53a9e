//! Gem scoring strategies.
//!
//! Two implementations behind one trait, chosen once from configuration:
//! `BaselineScorer` is plain weighted overlap plus attribute similarity,
//! `EnhancedScorer` adds IDF weighting, the weapon-hint and combo bonuses and
//! mode-scaled jitter.

use rand::{Rng, RngCore};
use serde::Serialize;
use std::collections::BTreeSet;

use super::idf::IdfTable;
use super::profile::TagProfile;
use crate::attributes::Attributes;
use crate::catalog::Gem;
use crate::config::{ScorerKind, Tunables};
use crate::constants::COMBO_MATCH_CAP;
use crate::tags::normalize;

/// Everything a scorer needs besides the gem itself
#[derive(Debug, Clone)]
pub struct ScoringContext<'a> {
    pub profile: &'a TagProfile,
    pub idf: &'a IdfTable,
    pub tunables: Tunables,
    /// Aggregated attributes of the roll
    pub roll_attributes: Attributes,
    pub weapon_hints: BTreeSet<String>,
    pub weapon_hint_bonus: f64,
    pub combo_delta: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SynergyScore {
    pub score: f64,
    pub raw: f64,
    pub attr_sim: f64,
    pub combo_bonus: f64,
    pub weapon_hint_bonus: f64,
}

pub trait Scorer: Send + Sync {
    fn kind(&self) -> ScorerKind;

    fn score(&self, gem: &Gem, ctx: &ScoringContext<'_>, rng: &mut dyn RngCore) -> SynergyScore;
}

pub fn make_scorer(kind: ScorerKind) -> Box<dyn Scorer> {
    match kind {
        ScorerKind::Baseline => Box::new(BaselineScorer),
        ScorerKind::Enhanced => Box::new(EnhancedScorer),
    }
}

fn gem_tags(gem: &Gem) -> BTreeSet<String> {
    gem.tags
        .iter()
        .map(|t| normalize(t))
        .filter(|t| !t.is_empty())
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BaselineScorer;

impl Scorer for BaselineScorer {
    fn kind(&self) -> ScorerKind {
        ScorerKind::Baseline
    }

    fn score(&self, gem: &Gem, ctx: &ScoringContext<'_>, _rng: &mut dyn RngCore) -> SynergyScore {
        let tags = gem_tags(gem);
        let raw: f64 = ctx
            .profile
            .iter()
            .filter(|(tag, _)| tags.contains(*tag))
            .map(|(_, weight)| weight)
            .sum();
        let attr_sim = gem.requirement_weights.cosine(&ctx.roll_attributes);
        let t = ctx.tunables.clamped();
        SynergyScore {
            score: t.alpha * raw + t.beta * attr_sim,
            raw,
            attr_sim,
            combo_bonus: 0.0,
            weapon_hint_bonus: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnhancedScorer;

impl EnhancedScorer {
    /// Nonzero only when the gem matches both a tactic tag and an ailment tag
    pub fn combo_bonus(tags: &BTreeSet<String>, ctx: &ScoringContext<'_>) -> f64 {
        let tactic_matches = tags.iter().filter(|t| ctx.profile.is_tactic_tag(t)).count();
        let ailment_matches = tags.iter().filter(|t| ctx.profile.is_ailment_tag(t)).count();
        if tactic_matches == 0 || ailment_matches == 0 {
            return 0.0;
        }
        let matched_idf: Vec<f64> = tags
            .iter()
            .filter(|t| ctx.profile.is_tactic_tag(t) || ctx.profile.is_ailment_tag(t))
            .filter_map(|t| ctx.idf.get(t))
            .collect();
        let avg_idf = if matched_idf.is_empty() {
            0.0
        } else {
            matched_idf.iter().sum::<f64>() / matched_idf.len() as f64
        };
        ctx.combo_delta
            * tactic_matches.min(COMBO_MATCH_CAP) as f64
            * ailment_matches.min(COMBO_MATCH_CAP) as f64
            * avg_idf
    }
}

impl Scorer for EnhancedScorer {
    fn kind(&self) -> ScorerKind {
        ScorerKind::Enhanced
    }

    fn score(&self, gem: &Gem, ctx: &ScoringContext<'_>, rng: &mut dyn RngCore) -> SynergyScore {
        let tags = gem_tags(gem);
        let raw: f64 = ctx
            .profile
            .iter()
            .filter(|(tag, _)| tags.contains(*tag))
            .map(|(tag, weight)| weight * ctx.idf.get(tag).unwrap_or(0.0))
            .sum();
        let attr_sim = gem.requirement_weights.cosine(&ctx.roll_attributes);
        let weapon_hint_bonus = if tags.iter().any(|t| ctx.weapon_hints.contains(t)) {
            ctx.weapon_hint_bonus
        } else {
            0.0
        };
        let combo_bonus = Self::combo_bonus(&tags, ctx);
        let t = ctx.tunables.clamped();
        let jitter = if t.noise > 0.0 {
            (rng.gen::<f64>() - 0.5) * t.noise
        } else {
            0.0
        };
        SynergyScore {
            score: t.alpha * raw + t.beta * attr_sim + weapon_hint_bonus + combo_bonus + jitter,
            raw,
            attr_sim,
            combo_bonus,
            weapon_hint_bonus,
        }
    }
}
