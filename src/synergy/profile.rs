//! Weighted tag profile of a roll.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::ProfileWeights;
use crate::roller::RollContext;
use crate::tags::{defense_pseudo_tags, normalize, weapon_hints};

/// Normalized tag → accumulated weight, plus the tactic and ailment tag sets
/// the combo bonus looks at. Built per roll, discarded after scoring.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagProfile {
    weights: BTreeMap<String, f64>,
    tactic_tags: BTreeSet<String>,
    ailment_tags: BTreeSet<String>,
}

impl TagProfile {
    pub fn from_roll(ctx: &RollContext, weights: &ProfileWeights) -> Self {
        let mut profile = Self::default();
        for tactic in &ctx.tactics {
            for tag in &tactic.tags {
                if let Some(t) = profile.add(tag, weights.tactics) {
                    profile.tactic_tags.insert(t);
                }
            }
        }
        for ailment in &ctx.ailments {
            for tag in &ailment.tags {
                if let Some(t) = profile.add(tag, weights.ailments) {
                    profile.ailment_tags.insert(t);
                }
            }
        }
        for tag in &ctx.defense_strategy.tags {
            profile.add(tag, weights.defense_strategy);
        }
        for tag in defense_pseudo_tags(&ctx.defense.name) {
            profile.add(&tag, weights.defense);
        }
        let offhand = ctx.offhand.as_ref().map(|o| o.name.as_str());
        for tag in weapon_hints(&ctx.weapon.name, offhand) {
            profile.add(&tag, weights.weapon);
        }
        profile
    }

    /// Add weight under the normalized tag; returns the key when non-empty
    pub fn add(&mut self, raw: &str, weight: f64) -> Option<String> {
        let key = normalize(raw);
        if key.is_empty() {
            return None;
        }
        *self.weights.entry(key.clone()).or_insert(0.0) += weight;
        Some(key)
    }

    pub fn weight(&self, tag: &str) -> Option<f64> {
        self.weights.get(tag).copied()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.weights.contains_key(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn is_tactic_tag(&self, tag: &str) -> bool {
        self.tactic_tags.contains(tag)
    }

    pub fn is_ailment_tag(&self, tag: &str) -> bool {
        self.ailment_tags.contains(tag)
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Attributes;
    use crate::catalog::SlottedItem;

    fn ctx() -> RollContext {
        RollContext {
            class: "Huntress".into(),
            ascendancy: "Amazon".into(),
            class_attributes: Attributes::new(0.2, 0.6, 0.2),
            weapon: SlottedItem::new("Spear", Attributes::ZERO, &[]),
            offhand: Some(SlottedItem::new("Buckler", Attributes::ZERO, &[])),
            defense: SlottedItem::new("Armour & Evasion", Attributes::ZERO, &[]),
            defense_strategy: SlottedItem::new("Block", Attributes::ZERO, &["block", "Bleed"]),
            tactics: vec![SlottedItem::new("Marks", Attributes::ZERO, &["Marks", "Critical"])],
            ailments: vec![SlottedItem::new("Bleed", Attributes::ZERO, &["bleed"])],
            attributes: Attributes::balanced(),
            build_name: String::new(),
            flavor: String::new(),
        }
    }

    #[test]
    fn test_category_weights_accumulate() {
        let profile = TagProfile::from_roll(&ctx(), &ProfileWeights::default());
        assert!((profile.weight("mark").unwrap() - 1.2).abs() < 1e-12);
        assert!((profile.weight("crit").unwrap() - 1.2).abs() < 1e-12);
        // ailment 1.1 + defense strategy 0.7
        assert!((profile.weight("bleed").unwrap() - 1.8).abs() < 1e-12);
        assert!((profile.weight("armour").unwrap() - 0.6).abs() < 1e-12);
        assert!((profile.weight("evasion").unwrap() - 0.6).abs() < 1e-12);
        assert!((profile.weight("spear").unwrap() - 0.5).abs() < 1e-12);
        assert!((profile.weight("buckler").unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_category_sets() {
        let profile = TagProfile::from_roll(&ctx(), &ProfileWeights::default());
        assert!(profile.is_tactic_tag("mark"));
        assert!(profile.is_ailment_tag("bleed"));
        assert!(!profile.is_tactic_tag("bleed"));
        assert!(!profile.is_ailment_tag("block"));
    }
}
