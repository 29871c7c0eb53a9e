//! Hard equipment rules.
//!
//! Four rule families, each toggled by `RuleConfig`:
//! - Deflection needs an evasion-based defense
//! - the Minions tactic needs an allowed weapon (Sceptre)
//! - Block needs an allowed offhand (Shield/Buckler)
//! - one-handed/two-handed offhand combinations
//!
//! `RuleSet` is the compiled (lowercased) form. The roller uses its single-rule
//! predicates to pre-gate pools; the enforcer uses the full `evaluate`. All
//! comparisons are case-insensitive and nothing here touches an RNG.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::SlottedItem;
use crate::config::RuleConfig;
use crate::constants::{MINIONS_TACTIC, SCEPTRE_MARKER, TWO_HANDED_MARKER};

/// Names of the rolled entities, the only thing rules look at
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollSnapshot {
    pub weapon: String,
    /// Empty when no offhand was rolled
    pub offhand: String,
    pub defense: String,
    pub defense_strategy: String,
    pub tactics: Vec<String>,
    pub ailments: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Violation {
    DeflectionDefense,
    MinionsWeapon,
    BlockOffhand,
    TwoHandedOffhand,
    OneHandedOffhand,
}

impl Violation {
    pub fn message(&self) -> &'static str {
        match self {
            Violation::DeflectionDefense => "Deflection requires evasion-based defense",
            Violation::MinionsWeapon => "Minions requires Sceptre",
            Violation::BlockOffhand => "Block requires Shield/Buckler",
            Violation::TwoHandedOffhand => "Two-handed cannot equip this off-hand",
            Violation::OneHandedOffhand => "One-handed requires allowed off-hand",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

fn lowered(list: &[String]) -> Vec<String> {
    list.iter().map(|s| s.to_lowercase()).collect()
}

fn contains_lc(list: &[String], value: &str) -> bool {
    let value = value.to_lowercase();
    list.iter().any(|v| *v == value)
}

/// Rule configuration compiled for case-insensitive matching
#[derive(Debug, Clone)]
pub struct RuleSet {
    deflection_enabled: bool,
    deflection_defenses: Vec<String>,
    minions_enabled: bool,
    minions_weapons: Vec<String>,
    block_enabled: bool,
    block_offhands: Vec<String>,
    combos_enabled: bool,
    two_handed: Vec<String>,
    allowed_one_handed: Vec<String>,
    blocked_two_handed: Vec<String>,
}

impl RuleSet {
    pub fn compile(config: &RuleConfig) -> Self {
        Self {
            deflection_enabled: config.enable_deflection_defense_rule,
            deflection_defenses: lowered(&config.deflection_requires_evasion),
            minions_enabled: config.enable_minions_weapon_rule,
            minions_weapons: lowered(&config.minions_requires_weapon),
            block_enabled: config.enable_block_offhand_rule,
            block_offhands: lowered(&config.block_requires_offhand),
            combos_enabled: config.enable_one_handed_offhand_combos,
            two_handed: lowered(&config.two_handed_weapons),
            allowed_one_handed: lowered(&config.allowed_offhands_for_one_handed),
            blocked_two_handed: lowered(&config.blocked_offhands_for_two_handed),
        }
    }

    pub fn is_two_handed(&self, weapon: &str) -> bool {
        contains_lc(&self.two_handed, weapon) || weapon.to_lowercase().contains(TWO_HANDED_MARKER)
    }

    pub fn deflection_ok(&self, defense_strategy: &str, defense: &str) -> bool {
        !self.deflection_enabled
            || !defense_strategy.eq_ignore_ascii_case("deflection")
            || contains_lc(&self.deflection_defenses, defense)
    }

    pub fn minions_ok<S: AsRef<str>>(&self, tactics: &[S], weapon: &str) -> bool {
        let wants_minions = tactics
            .iter()
            .any(|t| t.as_ref().to_lowercase().contains(MINIONS_TACTIC));
        !self.minions_enabled || !wants_minions || contains_lc(&self.minions_weapons, weapon)
    }

    pub fn block_ok(&self, defense_strategy: &str, offhand: &str) -> bool {
        !self.block_enabled
            || !defense_strategy.eq_ignore_ascii_case("block")
            || contains_lc(&self.block_offhands, offhand)
    }

    /// Offhand legality for the weapon's handedness. An empty allow-list
    /// means one-handed weapons take anything, including no offhand.
    pub fn offhand_violation(&self, weapon: &str, offhand: &str) -> Option<Violation> {
        if !self.combos_enabled {
            return None;
        }
        if self.is_two_handed(weapon) {
            contains_lc(&self.blocked_two_handed, offhand).then_some(Violation::TwoHandedOffhand)
        } else if !self.allowed_one_handed.is_empty()
            && !contains_lc(&self.allowed_one_handed, offhand)
        {
            Some(Violation::OneHandedOffhand)
        } else {
            None
        }
    }

    /// Inline pre-gate for the defense-strategy pool: only the rules that can
    /// be decided from defense, weapon and offhand alone.
    pub fn permits_defense_strategy(&self, strategy: &str, defense: &str, offhand: &str) -> bool {
        self.deflection_ok(strategy, defense) && self.block_ok(strategy, offhand)
    }

    /// Every violated rule, in rule-family order. Empty iff the snapshot is legal.
    pub fn evaluate(&self, snapshot: &RollSnapshot) -> Vec<Violation> {
        let mut out = Vec::new();
        if !self.deflection_ok(&snapshot.defense_strategy, &snapshot.defense) {
            out.push(Violation::DeflectionDefense);
        }
        if !self.minions_ok(&snapshot.tactics, &snapshot.weapon) {
            out.push(Violation::MinionsWeapon);
        }
        if !self.block_ok(&snapshot.defense_strategy, &snapshot.offhand) {
            out.push(Violation::BlockOffhand);
        }
        if let Some(v) = self.offhand_violation(&snapshot.weapon, &snapshot.offhand) {
            out.push(v);
        }
        out
    }
}

/// Violations of `snapshot` under `config`
pub fn violations(config: &RuleConfig, snapshot: &RollSnapshot) -> Vec<Violation> {
    RuleSet::compile(config).evaluate(snapshot)
}

pub fn is_legal(config: &RuleConfig, snapshot: &RollSnapshot) -> bool {
    violations(config, snapshot).is_empty()
}

/// Tactic pool with Minions removed unless a sceptre is in either hand
pub fn filter_tactics<'a>(
    tactics: &'a [SlottedItem],
    weapon: &str,
    offhand: Option<&str>,
) -> Vec<&'a SlottedItem> {
    let has_sceptre = weapon.to_lowercase().contains(SCEPTRE_MARKER)
        || offhand.is_some_and(|o| o.to_lowercase().contains(SCEPTRE_MARKER));
    tactics
        .iter()
        .filter(|t| has_sceptre || !t.name.eq_ignore_ascii_case(MINIONS_TACTIC))
        .collect()
}
