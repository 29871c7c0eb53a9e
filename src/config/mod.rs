//! Randomizer configuration.
//!
//! Everything tunable lives here with defaults matching the shipped data.
//! A core catalog document may carry a `Config` object with `synergy` and
//! `rules` parts; those are merged field by field over the defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

use crate::constants::*;
use crate::error::{RandomancerError, Result};

/// Cohesion slider position
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CohesionMode {
    Strict,
    #[default]
    Cohesive,
    Chaotic,
    Madness,
}

impl CohesionMode {
    pub const ALL: [CohesionMode; 4] = [
        CohesionMode::Strict,
        CohesionMode::Cohesive,
        CohesionMode::Chaotic,
        CohesionMode::Madness,
    ];

    /// Minimum cosine similarity a candidate needs to pass the filter
    pub fn threshold(&self) -> f64 {
        match self {
            CohesionMode::Strict => THRESHOLD_STRICT,
            CohesionMode::Cohesive => THRESHOLD_COHESIVE,
            CohesionMode::Chaotic => THRESHOLD_CHAOTIC,
            CohesionMode::Madness => THRESHOLD_MADNESS,
        }
    }

    /// Default scorer tunables for this mode
    pub fn tunables(&self) -> Tunables {
        match self {
            CohesionMode::Strict => Tunables::new(1.15, 0.45, 0.0),
            CohesionMode::Cohesive => Tunables::new(1.0, 0.35, 0.02),
            CohesionMode::Chaotic => Tunables::new(0.8, 0.25, 0.05),
            CohesionMode::Madness => Tunables::new(0.6, 0.15, 0.08),
        }
    }

    /// Slider index 0..=3
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CohesionMode::Strict => "strict",
            CohesionMode::Cohesive => "cohesive",
            CohesionMode::Chaotic => "chaotic",
            CohesionMode::Madness => "madness",
        }
    }
}

impl fmt::Display for CohesionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CohesionMode {
    type Err = RandomancerError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == lower)
            .ok_or_else(|| RandomancerError::Config(format!("unknown cohesion mode: {s}")))
    }
}

/// Scorer knobs: weight on tag overlap, weight on attribute similarity, jitter amplitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tunables {
    pub alpha: f64,
    pub beta: f64,
    pub noise: f64,
}

impl Tunables {
    pub const fn new(alpha: f64, beta: f64, noise: f64) -> Self {
        Self { alpha, beta, noise }
    }

    /// α and β clamped to the supported range, noise non-negative
    pub fn clamped(&self) -> Self {
        Self {
            alpha: self.alpha.clamp(TUNABLE_MIN, TUNABLE_MAX),
            beta: self.beta.clamp(TUNABLE_MIN, TUNABLE_MAX),
            noise: self.noise.max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScorerKind {
    /// Raw weighted overlap plus attribute similarity
    Baseline,
    /// IDF-weighted overlap, combo bonus, weapon hints and jitter
    #[default]
    Enhanced,
}

/// Category weights used to build a roll's tag profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileWeights {
    pub tactics: f64,
    pub ailments: f64,
    pub defense_strategy: f64,
    pub defense: f64,
    pub weapon: f64,
}

impl Default for ProfileWeights {
    fn default() -> Self {
        Self {
            tactics: PROFILE_WEIGHT_TACTICS,
            ailments: PROFILE_WEIGHT_AILMENTS,
            defense_strategy: PROFILE_WEIGHT_DEFENSE_STRATEGY,
            defense: PROFILE_WEIGHT_DEFENSE,
            weapon: PROFILE_WEIGHT_WEAPON,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SynergyConfig {
    pub profile_weights: ProfileWeights,
    pub weapon_hint_bonus: f64,
    pub combo_delta: f64,
    pub mmr_lambda: f64,
    /// `false` selects the baseline scorer
    pub use_new_scorer: bool,
    /// Per-mode tunable overrides; modes not listed use their defaults
    pub tunables: BTreeMap<CohesionMode, Tunables>,
}

impl Default for SynergyConfig {
    fn default() -> Self {
        Self {
            profile_weights: ProfileWeights::default(),
            weapon_hint_bonus: WEAPON_HINT_BONUS,
            combo_delta: COMBO_DELTA,
            mmr_lambda: MMR_LAMBDA,
            use_new_scorer: true,
            tunables: BTreeMap::new(),
        }
    }
}

impl SynergyConfig {
    pub fn scorer_kind(&self) -> ScorerKind {
        if self.use_new_scorer {
            ScorerKind::Enhanced
        } else {
            ScorerKind::Baseline
        }
    }

    pub fn tunables_for(&self, mode: CohesionMode) -> Tunables {
        self.tunables
            .get(&mode)
            .copied()
            .unwrap_or_else(|| mode.tunables())
            .clamped()
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Hard equipment rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleConfig {
    /// Re-roll illegal builds; when false the first roll is kept as is
    pub strict_enforcement: bool,
    pub max_attempts: u32,
    pub enable_deflection_defense_rule: bool,
    pub deflection_requires_evasion: Vec<String>,
    pub enable_minions_weapon_rule: bool,
    pub minions_requires_weapon: Vec<String>,
    pub enable_block_offhand_rule: bool,
    pub block_requires_offhand: Vec<String>,
    pub enable_one_handed_offhand_combos: bool,
    pub two_handed_weapons: Vec<String>,
    pub allowed_offhands_for_one_handed: Vec<String>,
    pub blocked_offhands_for_two_handed: Vec<String>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            strict_enforcement: true,
            max_attempts: MAX_ENFORCE_ATTEMPTS,
            enable_deflection_defense_rule: true,
            deflection_requires_evasion: names(&[
                "Evasion",
                "Armour & Evasion",
                "Evasion & Energy Shield",
            ]),
            enable_minions_weapon_rule: true,
            minions_requires_weapon: names(&["Sceptre"]),
            enable_block_offhand_rule: true,
            block_requires_offhand: names(&["Shield", "Buckler"]),
            enable_one_handed_offhand_combos: true,
            two_handed_weapons: names(&[
                "Bow",
                "Staff",
                "Spear",
                "Two-Handed Axe",
                "Two-Handed Sword",
                "Two-Handed Mace",
            ]),
            allowed_offhands_for_one_handed: names(&["Shield", "Buckler"]),
            blocked_offhands_for_two_handed: names(&["Shield", "Buckler"]),
        }
    }
}

/// Roll-time tables: which weapons take an offhand and the branch odds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RollerConfig {
    /// Weapon name → offhands it may be paired with. Weapons not listed
    /// never roll an offhand.
    pub valid_offhands: BTreeMap<String, Vec<String>>,
    /// Below this draw: one ailment and one tactic
    pub branch_single_pair: f64,
    /// Below this draw (and above the first): two ailments; else two tactics
    pub branch_double_ailment: f64,
}

impl Default for RollerConfig {
    fn default() -> Self {
        let mut valid_offhands = BTreeMap::new();
        valid_offhands.insert(
            "One-handed Mace".to_string(),
            names(&["One-handed Mace", "Shield", "Buckler", "Focus", "Sceptre"]),
        );
        valid_offhands.insert(
            "Spear".to_string(),
            names(&["Shield", "Buckler", "Focus", "Sceptre"]),
        );
        valid_offhands.insert(
            "Wand".to_string(),
            names(&["Shield", "Buckler", "Focus", "Sceptre"]),
        );
        valid_offhands.insert(
            "Sceptre".to_string(),
            names(&["Shield", "Buckler", "Focus", "Wand"]),
        );
        Self {
            valid_offhands,
            branch_single_pair: BRANCH_SINGLE_PAIR,
            branch_double_ailment: BRANCH_DOUBLE_AILMENT,
        }
    }
}

impl RollerConfig {
    /// Allowed offhands for a weapon, `None` when it takes no offhand
    pub fn offhands_for(&self, weapon: &str) -> Option<&[String]> {
        self.valid_offhands
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(weapon))
            .map(|(_, offhands)| offhands.as_slice())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomizerConfig {
    pub synergy: SynergyConfig,
    pub rules: RuleConfig,
    pub roller: RollerConfig,
}

impl RandomizerConfig {
    /// Merge a catalog's optional `Config` object over the defaults.
    /// Malformed input logs a warning and yields the defaults.
    pub fn resolve(config_section: Option<&Value>) -> Self {
        let Some(section) = config_section else {
            return Self::default();
        };
        match serde_json::from_value::<Self>(section.clone()) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "using default config, catalog Config section is malformed");
                Self::default()
            }
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(RandomancerError::NotFound(path.to_path_buf()));
        }
        let body = std::fs::read_to_string(path)?;
        Self::from_json(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mode_thresholds_and_index() {
        assert_eq!(CohesionMode::Strict.threshold(), 0.75);
        assert_eq!(CohesionMode::Madness.threshold(), 0.0);
        assert_eq!(CohesionMode::from_index(2), Some(CohesionMode::Chaotic));
        assert_eq!(CohesionMode::from_index(4), None);
        assert_eq!(CohesionMode::default(), CohesionMode::Cohesive);
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("STRICT".parse::<CohesionMode>().unwrap(), CohesionMode::Strict);
        assert_eq!(" madness ".parse::<CohesionMode>().unwrap(), CohesionMode::Madness);
        assert!("calm".parse::<CohesionMode>().is_err());
    }

    #[test]
    fn test_tunables_clamped() {
        let t = Tunables::new(3.0, -1.0, -0.5).clamped();
        assert_eq!(t, Tunables::new(2.0, 0.0, 0.0));
        assert_eq!(
            CohesionMode::Cohesive.tunables(),
            Tunables::new(1.0, 0.35, 0.02)
        );
    }

    #[test]
    fn test_resolve_merges_partial_sections() {
        let section = json!({
            "rules": {"enableMinionsWeaponRule": false, "maxAttempts": 5},
            "synergy": {"useNewScorer": false, "tunables": {"strict": {"alpha": 9.0, "beta": 0.1, "noise": 0.0}}}
        });
        let config = RandomizerConfig::resolve(Some(&section));
        assert!(!config.rules.enable_minions_weapon_rule);
        assert!(config.rules.enable_block_offhand_rule);
        assert_eq!(config.rules.max_attempts, 5);
        assert_eq!(config.rules.block_requires_offhand, vec!["Shield", "Buckler"]);
        assert_eq!(config.synergy.scorer_kind(), ScorerKind::Baseline);
        assert_eq!(config.synergy.tunables_for(CohesionMode::Strict).alpha, 2.0);
        assert_eq!(
            config.synergy.tunables_for(CohesionMode::Madness),
            CohesionMode::Madness.tunables()
        );
    }

    #[test]
    fn test_resolve_malformed_uses_defaults() {
        let config = RandomizerConfig::resolve(Some(&json!({"rules": {"maxAttempts": "many"}})));
        assert_eq!(config, RandomizerConfig::default());
        assert_eq!(RandomizerConfig::resolve(None), RandomizerConfig::default());
    }

    #[test]
    fn test_default_offhand_table() {
        let roller = RollerConfig::default();
        assert_eq!(roller.valid_offhands.len(), 4);
        assert!(roller.offhands_for("Bow").is_none());
        assert!(roller
            .offhands_for("Sceptre")
            .unwrap()
            .contains(&"Wand".to_string()));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"rules": {"strictEnforcement": false}}"#).unwrap();
        let config = RandomizerConfig::from_file(&path).unwrap();
        assert!(!config.rules.strict_enforcement);

        let missing = RandomizerConfig::from_file(dir.path().join("nope.json"));
        assert!(matches!(missing, Err(RandomancerError::NotFound(_))));
    }
}
