//! Build roller.
//!
//! One roll walks a fixed sequence of stages:
//! class → weapon → offhand (optional) → defense → defense strategy →
//! tactics/ailments → attribute aggregation. Weapon, offhand, defense and
//! strategy picks go through the cohesion picker biased by the class base
//! attributes. Pools are pre-gated by single-rule predicates where the rule
//! can already be decided; whatever slips through is left for the enforcer.
//!
//! A filtered pool that comes up empty falls back to the unfiltered pool. Only
//! an empty unfiltered pool for a mandatory slot is an error.

pub mod naming;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::attributes::Attributes;
use crate::catalog::{CoreCatalog, SlottedItem};
use crate::cohesion;
use crate::config::RandomizerConfig;
use crate::error::{RandomancerError, Result};
use crate::rules::{filter_tactics, RollSnapshot, RuleSet};

/// Stages of a single roll, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RollStage {
    Idle,
    ClassChosen,
    WeaponChosen,
    OffhandChosen,
    DefenseChosen,
    DefenseStrategyChosen,
    TacticsAndAilmentsChosen,
    AttributesAggregated,
    Done,
}

/// A finished roll. Owns copies of everything it picked so it outlives
/// any borrow of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollContext {
    pub class: String,
    pub ascendancy: String,
    pub class_attributes: Attributes,
    pub weapon: SlottedItem,
    pub offhand: Option<SlottedItem>,
    pub defense: SlottedItem,
    pub defense_strategy: SlottedItem,
    pub tactics: Vec<SlottedItem>,
    pub ailments: Vec<SlottedItem>,
    /// Normalize-then-sum-then-renormalize aggregate of every pick
    pub attributes: Attributes,
    pub build_name: String,
    pub flavor: String,
}

impl RollContext {
    pub fn offhand_name(&self) -> &str {
        self.offhand.as_ref().map(|o| o.name.as_str()).unwrap_or("")
    }

    /// "Weapon & Offhand", or just the weapon
    pub fn weapon_line(&self) -> String {
        match &self.offhand {
            Some(off) => format!("{} & {}", self.weapon.name, off.name),
            None => self.weapon.name.clone(),
        }
    }

    pub fn tactic_names(&self) -> Vec<String> {
        self.tactics.iter().map(|t| t.name.clone()).collect()
    }

    pub fn ailment_names(&self) -> Vec<String> {
        self.ailments.iter().map(|a| a.name.clone()).collect()
    }

    /// Lowercased weapon and offhand names, as gem compatibility expects
    pub fn rolled_weapon_types(&self) -> Vec<String> {
        let mut types = vec![self.weapon.name.to_lowercase()];
        if let Some(off) = &self.offhand {
            types.push(off.name.to_lowercase());
        }
        types
    }

    pub fn snapshot(&self) -> RollSnapshot {
        RollSnapshot {
            weapon: self.weapon.name.clone(),
            offhand: self.offhand_name().to_string(),
            defense: self.defense.name.clone(),
            defense_strategy: self.defense_strategy.name.clone(),
            tactics: self.tactic_names(),
            ailments: self.ailment_names(),
        }
    }

    /// Identity of the parts that drive recommendations:
    /// tactics|ailments|defense strategy|weapons
    pub fn signature(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.tactic_names().join(" & "),
            self.ailment_names().join(" & "),
            self.defense_strategy.name,
            self.weapon_line()
        )
    }
}

#[derive(Debug)]
struct RollDraft<'c> {
    stage: RollStage,
    class: Option<(&'c String, &'c Attributes)>,
    ascendancy: String,
    weapon: Option<&'c SlottedItem>,
    offhand: Option<&'c SlottedItem>,
    defense: Option<&'c SlottedItem>,
    defense_strategy: Option<&'c SlottedItem>,
    tactics: Vec<&'c SlottedItem>,
    ailments: Vec<&'c SlottedItem>,
    attributes: Attributes,
}

impl RollDraft<'_> {
    fn new() -> Self {
        Self {
            stage: RollStage::Idle,
            class: None,
            ascendancy: String::new(),
            weapon: None,
            offhand: None,
            defense: None,
            defense_strategy: None,
            tactics: Vec::new(),
            ailments: Vec::new(),
            attributes: Attributes::ZERO,
        }
    }
}

fn empty(slot: &'static str) -> RandomancerError {
    RandomancerError::EmptyPool { slot }
}

/// Up to `count` entries with distinct names, uniformly
fn draw_distinct<'c, R: Rng + ?Sized>(
    pool: &[&'c SlottedItem],
    count: usize,
    rng: &mut R,
) -> Vec<&'c SlottedItem> {
    let mut picked: Vec<&SlottedItem> = Vec::with_capacity(count);
    for _ in 0..count {
        let remaining: Vec<&SlottedItem> = pool
            .iter()
            .copied()
            .filter(|c| picked.iter().all(|p| p.name != c.name))
            .collect();
        match remaining.choose(rng) {
            Some(item) => picked.push(item),
            None => break,
        }
    }
    picked
}

/// Draws builds from a core catalog under a fixed configuration
pub struct BuildRoller<'a> {
    core: &'a CoreCatalog,
    config: &'a RandomizerConfig,
    rules: RuleSet,
}

impl<'a> BuildRoller<'a> {
    pub fn new(core: &'a CoreCatalog, config: &'a RandomizerConfig) -> Self {
        Self {
            core,
            config,
            rules: RuleSet::compile(&config.rules),
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// One full roll at the given cohesion threshold
    pub fn roll<R: Rng + ?Sized>(&self, threshold: f64, rng: &mut R) -> Result<RollContext> {
        let mut draft = RollDraft::new();
        while draft.stage != RollStage::Done {
            self.advance(&mut draft, threshold, rng)?;
        }
        self.finish(draft, rng)
    }

    fn advance<R: Rng + ?Sized>(
        &self,
        draft: &mut RollDraft<'a>,
        threshold: f64,
        rng: &mut R,
    ) -> Result<()> {
        let base = draft
            .class
            .map(|(_, attrs)| *attrs)
            .unwrap_or_else(Attributes::balanced);

        draft.stage = match draft.stage {
            RollStage::Idle => {
                let classes: Vec<(&String, &crate::catalog::ClassDef)> =
                    self.core.classes.iter().collect();
                let (name, def) = classes.choose(rng).copied().ok_or_else(|| empty("class"))?;
                draft.class = Some((name, &def.attributes));
                draft.ascendancy = def.ascendancies.choose(rng).cloned().unwrap_or_default();
                RollStage::ClassChosen
            }
            RollStage::ClassChosen => {
                let pool: Vec<&SlottedItem> = self.core.weapons.main_hand().collect();
                draft.weapon =
                    Some(cohesion::pick(&pool, &base, threshold, rng).ok_or_else(|| empty("weapon"))?);
                RollStage::WeaponChosen
            }
            RollStage::WeaponChosen => {
                draft.offhand = self.pick_offhand(draft, &base, threshold, rng);
                RollStage::OffhandChosen
            }
            RollStage::OffhandChosen => {
                let pool: Vec<&SlottedItem> = self.core.defense.iter().collect();
                draft.defense =
                    Some(cohesion::pick(&pool, &base, threshold, rng).ok_or_else(|| empty("defense"))?);
                RollStage::DefenseChosen
            }
            RollStage::DefenseChosen => {
                draft.defense_strategy = Some(self.pick_defense_strategy(draft, &base, threshold, rng)?);
                RollStage::DefenseStrategyChosen
            }
            RollStage::DefenseStrategyChosen => {
                self.pick_tactics_and_ailments(draft, rng);
                RollStage::TacticsAndAilmentsChosen
            }
            RollStage::TacticsAndAilmentsChosen => {
                draft.attributes = aggregate(draft, &base);
                RollStage::AttributesAggregated
            }
            RollStage::AttributesAggregated | RollStage::Done => RollStage::Done,
        };
        Ok(())
    }

    fn pick_offhand<R: Rng + ?Sized>(
        &self,
        draft: &RollDraft<'a>,
        base: &Attributes,
        threshold: f64,
        rng: &mut R,
    ) -> Option<&'a SlottedItem> {
        let weapon = draft.weapon?;
        let allowed = self.config.roller.offhands_for(&weapon.name)?;
        let all: Vec<&SlottedItem> = self.core.weapons.off_hand.iter().collect();
        let filtered: Vec<&SlottedItem> = all
            .iter()
            .copied()
            .filter(|o| allowed.iter().any(|a| o.is_named(a)))
            .collect();
        let pool = if filtered.is_empty() { &all } else { &filtered };
        cohesion::pick(pool, base, threshold, rng)
    }

    fn pick_defense_strategy<R: Rng + ?Sized>(
        &self,
        draft: &RollDraft<'a>,
        base: &Attributes,
        threshold: f64,
        rng: &mut R,
    ) -> Result<&'a SlottedItem> {
        let defense = draft.defense.map(|d| d.name.as_str()).unwrap_or("");
        let offhand = draft.offhand.map(|o| o.name.as_str()).unwrap_or("");
        let all: Vec<&SlottedItem> = self.core.defensive_strategies.iter().collect();
        let gated: Vec<&SlottedItem> = all
            .iter()
            .copied()
            .filter(|s| self.rules.permits_defense_strategy(&s.name, defense, offhand))
            .collect();
        let pool = if gated.is_empty() {
            debug!(defense, offhand, "no defense strategy passes the pre-gate, using full pool");
            &all
        } else {
            &gated
        };
        cohesion::pick(pool, base, threshold, rng).ok_or_else(|| empty("defense strategy"))
    }

    fn pick_tactics_and_ailments<R: Rng + ?Sized>(&self, draft: &mut RollDraft<'a>, rng: &mut R) {
        let weapon = draft.weapon.map(|w| w.name.as_str()).unwrap_or("");
        let offhand = draft.offhand.map(|o| o.name.as_str());
        let mut tactic_pool = filter_tactics(&self.core.tactics, weapon, offhand);
        if tactic_pool.is_empty() {
            tactic_pool = self.core.tactics.iter().collect();
        }
        let ailment_pool: Vec<&SlottedItem> = self.core.ailments.iter().collect();

        let roller = &self.config.roller;
        let r: f64 = rng.gen();
        if r < roller.branch_single_pair {
            draft.ailments = draw_distinct(&ailment_pool, 1, rng);
            draft.tactics = draw_distinct(&tactic_pool, 1, rng);
        } else if r < roller.branch_double_ailment {
            draft.ailments = draw_distinct(&ailment_pool, 2, rng);
        } else {
            draft.tactics = draw_distinct(&tactic_pool, 2, rng);
        }
    }

    fn finish<R: Rng + ?Sized>(&self, draft: RollDraft<'a>, rng: &mut R) -> Result<RollContext> {
        let (class, class_attributes) = draft.class.ok_or_else(|| empty("class"))?;
        let weapon = draft.weapon.ok_or_else(|| empty("weapon"))?;
        let defense = draft.defense.ok_or_else(|| empty("defense"))?;
        let defense_strategy = draft.defense_strategy.ok_or_else(|| empty("defense strategy"))?;

        let context = RollContext {
            class: class.clone(),
            build_name: naming::build_name(class, &draft.ascendancy, rng),
            flavor: naming::flavor_line(class, rng),
            ascendancy: draft.ascendancy,
            class_attributes: *class_attributes,
            weapon: weapon.clone(),
            offhand: draft.offhand.cloned(),
            defense: defense.clone(),
            defense_strategy: defense_strategy.clone(),
            tactics: draft.tactics.into_iter().cloned().collect(),
            ailments: draft.ailments.into_iter().cloned().collect(),
            attributes: draft.attributes,
        };
        debug!(
            class = %context.class,
            weapon = %context.weapon_line(),
            defense = %context.defense.name,
            "rolled build"
        );
        Ok(context)
    }
}

fn aggregate(draft: &RollDraft<'_>, base: &Attributes) -> Attributes {
    let singles = [draft.weapon, draft.offhand, draft.defense, draft.defense_strategy];
    let total: Attributes = std::iter::once(base.normalized())
        .chain(singles.iter().flatten().map(|item| item.attributes.normalized()))
        .chain(draft.ailments.iter().map(|a| a.attributes.normalized()))
        .chain(draft.tactics.iter().map(|t| t.attributes.normalized()))
        .sum();
    total.normalized()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ClassDef;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn item(name: &str, s: f64, d: f64, i: f64) -> SlottedItem {
        SlottedItem::new(name, Attributes::new(s, d, i), &[])
    }

    fn core() -> CoreCatalog {
        let mut core = CoreCatalog::default();
        core.classes.insert(
            "Witch".into(),
            ClassDef {
                attributes: Attributes::new(0.1, 0.1, 0.8),
                ascendancies: vec!["Blood Mage".into()],
            },
        );
        core.weapons.two_handed = vec![item("Bow", 0.0, 1.0, 0.0)];
        core.weapons.one_handed = vec![item("Wand", 0.0, 0.0, 1.0), item("Sceptre", 0.2, 0.0, 0.8)];
        core.weapons.off_hand = vec![
            item("Shield", 1.0, 0.0, 0.0),
            item("Focus", 0.0, 0.0, 1.0),
            item("Wand", 0.0, 0.0, 1.0),
        ];
        core.defense = vec![item("Energy Shield", 0.0, 0.0, 1.0), item("Evasion", 0.0, 1.0, 0.0)];
        core.defensive_strategies = vec![
            item("Block", 1.0, 0.0, 0.0),
            item("Deflection", 0.0, 1.0, 0.0),
            item("Regeneration", 0.3, 0.3, 0.3),
        ];
        core.tactics = vec![
            item("Minions", 0.0, 0.0, 1.0),
            item("Totems", 1.0, 0.0, 0.0),
            item("Traps", 0.0, 1.0, 0.0),
        ];
        core.ailments = vec![
            item("Ignite", 0.3, 0.0, 0.7),
            item("Bleed", 0.7, 0.3, 0.0),
            item("Shock", 0.0, 0.0, 1.0),
        ];
        core
    }

    #[test]
    fn test_roll_is_deterministic_per_seed() {
        let core = core();
        let config = RandomizerConfig::default();
        let roller = BuildRoller::new(&core, &config);
        let a = roller.roll(0.5, &mut Xoshiro256PlusPlus::seed_from_u64(99)).unwrap();
        let b = roller.roll(0.5, &mut Xoshiro256PlusPlus::seed_from_u64(99)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_roll_shape() {
        let core = core();
        let config = RandomizerConfig::default();
        let roller = BuildRoller::new(&core, &config);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        for _ in 0..200 {
            let ctx = roller.roll(0.0, &mut rng).unwrap();
            let counts = (ctx.ailments.len(), ctx.tactics.len());
            assert!(matches!(counts, (1, 1) | (2, 0) | (0, 2)), "bad branch {counts:?}");
            if ctx.tactics.len() == 2 {
                assert_ne!(ctx.tactics[0].name, ctx.tactics[1].name);
            }
            if ctx.ailments.len() == 2 {
                assert_ne!(ctx.ailments[0].name, ctx.ailments[1].name);
            }
            assert!((ctx.attributes.sum() - 1.0).abs() < 1e-9);
            assert_eq!(ctx.ascendancy, "Blood Mage");
            assert!(ctx.build_name.starts_with("The "));
        }
    }

    #[test]
    fn test_offhand_only_for_listed_weapons() {
        let core = core();
        let config = RandomizerConfig::default();
        let roller = BuildRoller::new(&core, &config);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(2);
        for _ in 0..200 {
            let ctx = roller.roll(0.0, &mut rng).unwrap();
            match ctx.weapon.name.as_str() {
                "Bow" => assert!(ctx.offhand.is_none()),
                "Wand" => {
                    let off = ctx.offhand.as_ref().unwrap();
                    assert!(["Shield", "Focus"].contains(&off.name.as_str()));
                }
                "Sceptre" => assert!(ctx.offhand.is_some()),
                other => panic!("unexpected weapon {other}"),
            }
        }
    }

    #[test]
    fn test_minions_needs_sceptre_in_hand() {
        let core = core();
        let config = RandomizerConfig::default();
        let roller = BuildRoller::new(&core, &config);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        for _ in 0..300 {
            let ctx = roller.roll(0.0, &mut rng).unwrap();
            if ctx.tactics.iter().any(|t| t.name == "Minions") {
                let sceptre = ctx
                    .rolled_weapon_types()
                    .iter()
                    .any(|t| t.contains("sceptre"));
                assert!(sceptre, "minions without sceptre: {}", ctx.weapon_line());
            }
        }
    }

    #[test]
    fn test_defense_strategy_pre_gate() {
        let core = core();
        let config = RandomizerConfig::default();
        let roller = BuildRoller::new(&core, &config);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(4);
        for _ in 0..300 {
            let ctx = roller.roll(0.0, &mut rng).unwrap();
            let snap = ctx.snapshot();
            if snap.defense_strategy == "Block" {
                assert_eq!(snap.offhand, "Shield");
            }
            if snap.defense_strategy == "Deflection" {
                assert_eq!(snap.defense, "Evasion");
            }
        }
    }

    #[test]
    fn test_empty_weapon_pool_is_an_error() {
        let mut core = core();
        core.weapons = Default::default();
        let config = RandomizerConfig::default();
        let roller = BuildRoller::new(&core, &config);
        let err = roller
            .roll(0.5, &mut Xoshiro256PlusPlus::seed_from_u64(1))
            .unwrap_err();
        assert!(matches!(err, RandomancerError::EmptyPool { slot: "weapon" }));
    }

    #[test]
    fn test_signature_and_weapon_line() {
        let core = core();
        let config = RandomizerConfig::default();
        let roller = BuildRoller::new(&core, &config);
        let ctx = roller.roll(0.0, &mut Xoshiro256PlusPlus::seed_from_u64(8)).unwrap();
        let sig = ctx.signature();
        assert_eq!(sig.matches('|').count(), 3);
        assert!(sig.ends_with(&ctx.weapon_line()));
    }

    #[test]
    fn test_aggregate_normalizes_each_part() {
        let core = core();
        let mut draft = RollDraft::new();
        draft.weapon = Some(&core.weapons.two_handed[0]);
        let heavy = SlottedItem::new("Heavy", Attributes::new(100.0, 0.0, 0.0), &[]);
        draft.defense = Some(&heavy);
        let total = aggregate(&draft, &Attributes::new(0.0, 0.0, 1.0));
        // three parts, one unit each
        assert!((total.strength - 1.0 / 3.0).abs() < 1e-9);
        assert!((total.dexterity - 1.0 / 3.0).abs() < 1e-9);
        assert!((total.intelligence - 1.0 / 3.0).abs() < 1e-9);
    }
}
