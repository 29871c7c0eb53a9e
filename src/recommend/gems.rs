//! Skill gem recommendations for a roll.

use rand::RngCore;
use serde::Serialize;

use crate::attributes::AttributeKind;
use crate::catalog::{Gem, GemCatalog};
use crate::config::{CohesionMode, SynergyConfig};
use crate::constants::{GEM_DISPLAY_TAGS, GEM_PICKS};
use crate::diversity::{select_two, Ranked, Tagged};
use crate::roller::RollContext;
use crate::synergy::{normalize_synergy, IdfCache, Scorer, ScoringContext, SynergyScore, TagProfile};
use crate::tags::weapon_hints;

use super::TagMarker;

/// First granted skill of a gem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrantLine {
    pub title: String,
    pub description: String,
}

/// A recommended support. `resolved` is false when the reference did not
/// match any gem and `name` is the raw reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupportLine {
    pub name: String,
    pub description: String,
    pub dominant: Option<AttributeKind>,
    pub resolved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GemRecommendation {
    pub id: String,
    pub name: String,
    /// 0..=100 relative to every scored candidate
    pub synergy_pct: u32,
    pub synergy: SynergyScore,
    pub tags: Vec<TagMarker>,
    pub requirement_text: String,
    pub grant: Option<GrantLine>,
    pub supports: Vec<SupportLine>,
    pub dominant: AttributeKind,
}

#[derive(Debug, Clone, Copy)]
struct ScoredGem<'g> {
    gem: &'g Gem,
    synergy: SynergyScore,
}

impl Tagged for ScoredGem<'_> {
    fn tag_list(&self) -> &[String] {
        &self.gem.tags
    }
}

/// Bracket tags first, then the remaining tags, capped
fn display_tags(gem: &Gem, profile: &TagProfile) -> Vec<TagMarker> {
    let mut ordered: Vec<&String> = gem.bracket_tags.iter().collect();
    for tag in &gem.tags {
        if !ordered.contains(&tag) {
            ordered.push(tag);
        }
    }
    ordered
        .into_iter()
        .take(GEM_DISPLAY_TAGS)
        .map(|tag| TagMarker {
            tag: tag.clone(),
            matched: profile.contains(tag),
        })
        .collect()
}

fn support_line(catalog: &GemCatalog, reference: &str) -> SupportLine {
    match catalog.lookup(reference) {
        Some(gem) => {
            let description = if gem.support_text.is_empty() {
                gem.description.clone()
            } else {
                gem.support_text.clone()
            };
            SupportLine {
                name: gem.name.clone(),
                description,
                dominant: Some(gem.requirement_weights.dominant()),
                resolved: true,
            }
        }
        None => SupportLine {
            name: reference.to_string(),
            description: String::new(),
            dominant: None,
            resolved: false,
        },
    }
}

/// Score every weapon-compatible recommendable gem against the roll and
/// pick up to two with MMR.
///
/// IDF is computed over all recommendable gems, not just the compatible
/// ones, so rarity reflects the whole catalog.
pub fn recommend_gems(
    catalog: &GemCatalog,
    ctx: &RollContext,
    config: &SynergyConfig,
    mode: CohesionMode,
    scorer: &dyn Scorer,
    idf_cache: &mut IdfCache,
    rng: &mut dyn RngCore,
) -> Vec<GemRecommendation> {
    let pool: Vec<&Gem> = catalog.recommendable().collect();
    let idf = idf_cache.get_or_build(&pool);
    let rolled_types = ctx.rolled_weapon_types();

    let profile = TagProfile::from_roll(ctx, &config.profile_weights);
    let offhand = ctx.offhand.as_ref().map(|o| o.name.as_str());
    let scoring = ScoringContext {
        profile: &profile,
        idf: &idf,
        tunables: config.tunables_for(mode),
        roll_attributes: ctx.attributes,
        weapon_hints: weapon_hints(&ctx.weapon.name, offhand),
        weapon_hint_bonus: config.weapon_hint_bonus,
        combo_delta: config.combo_delta,
    };

    let mut ranked: Vec<Ranked<ScoredGem<'_>>> = pool
        .iter()
        .copied()
        .filter(|gem| gem.is_weapon_compatible(&rolled_types))
        .map(|gem| {
            let synergy = scorer.score(gem, &scoring, rng);
            Ranked {
                item: ScoredGem { gem, synergy },
                score: synergy.score,
            }
        })
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

    let population: Vec<f64> = ranked.iter().map(|r| r.item.synergy.raw).collect();

    select_two(&ranked, config.mmr_lambda)
        .into_iter()
        .take(GEM_PICKS)
        .map(|scored| {
            let gem = scored.gem;
            GemRecommendation {
                id: gem.id.clone(),
                name: gem.name.clone(),
                synergy_pct: normalize_synergy(scored.synergy.raw, &population),
                synergy: scored.synergy,
                tags: display_tags(gem, &profile),
                requirement_text: gem.requirement_text.clone(),
                grant: gem.primary_grant().map(|g| GrantLine {
                    title: g.display_name.clone(),
                    description: g.description.clone(),
                }),
                supports: gem
                    .recommended_supports
                    .iter()
                    .map(|s| support_line(catalog, s))
                    .collect(),
                dominant: gem.requirement_weights.dominant(),
            }
        })
        .collect()
}
